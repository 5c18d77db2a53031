use std::collections::BTreeMap;
use vnode_patch::{batch_patches, diff, diff_with_options, DiffOptions, Handler, Key, NodePath, Patch, PropDelta, PropValue, VNode};

type V = VNode<()>;

fn li(key: &str, text: &str) -> V {
	VNode::element("li").with_key(key).with_child(VNode::text(text))
}

fn list(items: &[(&str, &str)]) -> V {
	VNode::element("ul").with_children(items.iter().map(|(key, text)| li(key, text)))
}

fn sample() -> V {
	let handler = Handler::new(|_| ());
	VNode::element("main")
		.with_prop("class", PropValue::list(vec![Some("app"), None]))
		.with_prop("style", PropValue::style(vec![("color", "red")]))
		.with_prop("onClick", handler)
		.with_child(VNode::fragment(vec![VNode::text("a"), VNode::element("br")]))
		.with_child(list(&[("1", "one"), ("2", "two")]))
}

#[test]
fn identical_trees_produce_no_patches() {
	let tree = sample();
	assert_eq!(diff(Some(&tree), Some(&tree)), vec![]);

	let text = V::text("same");
	assert_eq!(diff(Some(&text), Some(&V::text("same"))), vec![]);
	assert_eq!(diff(Some(&list(&[("a", "A")])), Some(&list(&[("a", "A")]))), vec![]);
	assert_eq!(diff::<()>(None, None), vec![]);

	let nan = V::element("meter").with_prop("value", f64::NAN);
	assert_eq!(diff(Some(&nan), Some(&nan)), vec![]);
}

#[test]
fn mount_and_unmount() {
	let tree = sample();
	assert_eq!(diff(None, Some(&tree)), vec![Patch::Create { path: NodePath::root(), index: None }]);
	assert_eq!(diff(Some(&tree), None), vec![Patch::Remove { path: NodePath::root() }]);
}

#[test]
fn prop_delta_is_minimal() {
	let old = V::element("div").with_prop("class", "a").with_prop("id", "x").with_prop("title", "t");
	let new = V::element("div").with_prop("class", "b").with_prop("title", "t");

	let mut set = BTreeMap::new();
	set.insert("class".to_owned(), PropValue::from("b"));
	assert_eq!(
		diff(Some(&old), Some(&new)),
		vec![Patch::Update {
			path: NodePath::root(),
			delta: PropDelta {
				set,
				remove: vec!["id".to_owned()],
			},
		}]
	);
}

#[test]
fn recreated_handlers_are_changes() {
	let old = V::element("button").with_prop("onClick", PropValue::handler(|_| ()));
	let new = V::element("button").with_prop("onClick", PropValue::handler(|_| ()));
	match diff(Some(&old), Some(&new)).as_slice() {
		[Patch::Update { delta, .. }] => {
			assert!(delta.set.contains_key("onClick"));
			assert!(delta.remove.is_empty());
		}
		patches => panic!("unexpected patches: {:?}", patches),
	}
}

#[test]
fn reserved_props_never_reach_the_delta() {
	let old = V::element("div").with_prop("ref", "a").with_prop("children", "x");
	let new = V::element("div").with_prop("ref", "b");
	assert_eq!(diff(Some(&old), Some(&new)), vec![]);
}

#[test]
fn text_change() {
	let old = V::element("p").with_child(VNode::text("before"));
	let new = V::element("p").with_child(VNode::text("after"));
	assert_eq!(
		diff(Some(&old), Some(&new)),
		vec![
			Patch::Update {
				path: NodePath::root(),
				delta: PropDelta::default(),
			},
			Patch::Text {
				path: NodePath::from(vec![0]),
				text: "after".to_owned(),
			},
		]
	);
}

#[test]
fn mismatching_tags_are_replaced_not_updated() {
	let old = V::element("div").with_prop("class", "old");
	let new = V::element("span").with_prop("class", "new");
	assert_eq!(diff(Some(&old), Some(&new)), vec![Patch::Replace { path: NodePath::root() }]);

	let old = V::element("section").with_child(old);
	let new = V::element("section").with_child(new);
	let at_child: Vec<_> = diff(Some(&old), Some(&new))
		.into_iter()
		.filter(|patch| match patch {
			Patch::Update { path, .. } | Patch::Replace { path } | Patch::Create { path, .. } | Patch::Remove { path } | Patch::Text { path, .. } => path.indices() == [0],
			Patch::Reorder { .. } => false,
		})
		.collect();
	assert_eq!(at_child, vec![Patch::Replace { path: NodePath::from(vec![0]) }]);
}

#[test]
fn mismatching_kinds_are_replaced() {
	assert_eq!(diff(Some(&V::text("a")), Some(&V::element("a"))), vec![Patch::Replace { path: NodePath::root() }]);
	assert_eq!(diff(Some(&V::fragment(vec![])), Some(&V::text(""))), vec![Patch::Replace { path: NodePath::root() }]);
}

#[test]
fn keyed_list_scenario() {
	let old = list(&[("a", "A"), ("b", "B")]);
	let new = list(&[("a", "A"), ("c", "C"), ("d", "D")]);
	assert_eq!(
		diff(Some(&old), Some(&new)),
		vec![
			Patch::Update {
				path: NodePath::root(),
				delta: PropDelta::default(),
			},
			Patch::Remove { path: NodePath::from(vec![1]) },
			Patch::Create {
				path: NodePath::from(vec![1]),
				index: Some(1),
			},
			Patch::Create {
				path: NodePath::from(vec![2]),
				index: Some(2),
			},
		]
	);
}

#[test]
fn keyed_reordering_keeps_identity() {
	let old = list(&[("1", "a"), ("2", "b"), ("3", "c")]);
	let new = list(&[("3", "c"), ("1", "a"), ("2", "b")]);
	let patches = diff(Some(&old), Some(&new));
	assert!(patches.iter().all(|patch| !matches!(patch, Patch::Create { .. } | Patch::Remove { .. } | Patch::Replace { .. })));
	assert_eq!(
		patches.iter().filter(|patch| matches!(patch, Patch::Reorder { .. })).cloned().collect::<Vec<_>>(),
		vec![Patch::Reorder {
			parent: NodePath::root(),
			index: 2,
			new_index: 0,
		}]
	);
}

#[test]
fn numeric_key_props_match_integer_keys() {
	assert_eq!(V::element("li").with_prop("key", 3).key, Some(Key::Int(3)));
	assert_eq!(V::element("li").with_prop("key", 1.5).key, Some(Key::from("1.5")));

	let old = V::element("ul").with_children(vec![V::element("li").with_key(1), V::element("li").with_key(2)]);
	let new = V::element("ul").with_children(vec![V::element("li").with_prop("key", 2), V::element("li").with_prop("key", 1)]);
	let patches = diff(Some(&old), Some(&new));
	assert!(patches.iter().all(|patch| !matches!(patch, Patch::Create { .. } | Patch::Remove { .. } | Patch::Replace { .. })));
	assert!(patches.iter().any(|patch| matches!(patch, Patch::Reorder { .. })));
}

#[test]
fn keyed_children_are_diffed_with_their_counterpart() {
	let old = list(&[("1", "one"), ("2", "two")]);
	let new = list(&[("2", "TWO"), ("1", "one")]);
	assert_eq!(
		diff(Some(&old), Some(&new)),
		vec![
			Patch::Update {
				path: NodePath::root(),
				delta: PropDelta::default(),
			},
			Patch::Reorder {
				parent: NodePath::root(),
				index: 1,
				new_index: 0,
			},
			Patch::Update {
				path: NodePath::from(vec![0]),
				delta: PropDelta::default(),
			},
			Patch::Text {
				path: NodePath::from(vec![0, 0]),
				text: "TWO".to_owned(),
			},
		]
	);
}

#[test]
fn unkeyed_children_pair_positionally() {
	let old = V::fragment(vec![VNode::text("a"), VNode::element("b")]);
	let new = V::fragment(vec![VNode::element("b"), VNode::text("a"), VNode::text("c")]);
	assert_eq!(
		diff(Some(&old), Some(&new)),
		vec![
			Patch::Replace { path: NodePath::from(vec![0]) },
			Patch::Replace { path: NodePath::from(vec![1]) },
			Patch::Create {
				path: NodePath::from(vec![2]),
				index: Some(2),
			},
		]
	);
}

#[test]
fn removals_come_first_from_the_back() {
	let old = list(&[("1", "1"), ("2", "2"), ("3", "3"), ("4", "4")]);
	let new = list(&[("3", "3")]);
	let patches = diff(Some(&old), Some(&new));
	assert_eq!(
		&patches[1..],
		&[
			Patch::Remove { path: NodePath::from(vec![3]) },
			Patch::Remove { path: NodePath::from(vec![1]) },
			Patch::Remove { path: NodePath::from(vec![0]) },
		]
	);
}

#[test]
fn duplicate_keys_do_not_panic() {
	let old = list(&[("x", "1"), ("x", "2"), ("y", "3")]);
	let new = list(&[("x", "2"), ("y", "3"), ("x", "1"), ("x", "4")]);
	let patches = diff(Some(&old), Some(&new));
	assert!(!patches.is_empty());
	assert_eq!(patches.iter().filter(|patch| matches!(patch, Patch::Create { .. })).count(), 1);
}

#[test]
fn depth_limit_replaces_deep_subtrees() {
	let old = V::element("a").with_child(VNode::element("b").with_child(VNode::text("old")));
	let new = V::element("a").with_child(VNode::element("b").with_child(VNode::text("new")));

	let patches = diff_with_options(Some(&old), Some(&new), DiffOptions::default().with_depth_limit(2));
	assert_eq!(
		patches.last(),
		Some(&Patch::Replace {
			path: NodePath::from(vec![0, 0])
		})
	);

	let patches = diff_with_options(Some(&old), Some(&new), DiffOptions::default());
	assert!(matches!(patches.last(), Some(Patch::Text { .. })));
}

#[test]
fn batching_is_transparent() {
	let old = list(&[("a", "A"), ("b", "B")]);
	let new = list(&[("b", "B"), ("c", "C")]);
	let patches = diff(Some(&old), Some(&new));
	assert_eq!(batch_patches(patches.clone()), patches);
}

#[test]
fn paths_display() {
	assert_eq!(NodePath::root().to_string(), "/");
	assert_eq!(NodePath::from(vec![0, 12]).to_string(), "/0/12");
}

use std::{cell::Cell, rc::Rc};
use vnode_patch::{
	batch_patches, diff,
	memory::{MemoryNode, MemoryTarget},
	Builder, Error, Key, Materializer, NodePath, Patch, Patcher, PropDelta, PropValue, VNode,
};

mod memory_harness_;
use memory_harness_::{fresh_html, inner_html, mount, Node};

fn li(key: &str, text: &str) -> Node {
	VNode::element("li").with_key(key).with_child(VNode::text(text))
}

fn list(items: &[(&str, &str)]) -> Node {
	VNode::element("ul").with_children(items.iter().map(|(key, text)| li(key, text)))
}

fn patcher() -> (Patcher<MemoryTarget>, MemoryNode) {
	let target = MemoryTarget::new();
	let body = target.container("body");
	(Patcher::new_for_container(target, body.clone()), body)
}

#[test]
fn materialized_tree_mirrors_description() {
	let tree: Node = VNode::element("div")
		.with_prop("id", "app")
		.with_prop("class", PropValue::list(vec![Some("a"), None, Some("b")]))
		.with_prop("disabled", true)
		.with_prop("data-n", 3)
		.with_child(VNode::text("hi"))
		.with_child(VNode::fragment(vec![VNode::element("span").with_child(VNode::text("x")), VNode::text("y")]))
		.with_child(VNode::element("input").with_prop("checked", false));

	let (mut patcher, body) = patcher();
	let patches = diff(None, Some(&tree));
	let live = patcher.patch(None, Some(tree), patches).unwrap().unwrap();

	assert_eq!(inner_html(&body), r#"<div class="a b" data-n="3" disabled id="app">hi<span>x</span>y<input></input></div>"#);
	assert!(live.target().unwrap().ptr_eq(&body.children()[0]));
	let children = live.children().unwrap();
	assert!(children.iter().all(VNode::is_attached));
	assert!(children[1].target().unwrap().ptr_eq(&body.children()[0]), "fragments target their container");
	assert_eq!(patcher.target().created(), 6);
}

#[test]
fn empty_patch_list_returns_root() {
	let (mut patcher, body) = patcher();
	let tree: Node = VNode::element("p");
	let patches = diff(None, Some(&tree));
	let live = patcher.patch(None, Some(tree), patches).unwrap();
	let live = patcher.patch(live, None, vec![]).unwrap();
	assert_eq!(live.as_ref().and_then(VNode::tag), Some("p"));
	assert_eq!(body.child_count(), 1);
}

#[test]
fn keyed_list_scenario() {
	let (mut reconciler, body) = mount(Some(list(&[("a", "A"), ("b", "B")])));
	let ul = body.children()[0].clone();
	let a = ul.children()[0].clone();

	let count = reconciler.render(Some(list(&[("a", "A"), ("c", "C"), ("d", "D")]))).unwrap();
	assert_eq!(count, 4);

	let items = ul.children();
	assert_eq!(items.len(), 3);
	assert_eq!(items.iter().map(MemoryNode::text_content).collect::<Vec<_>>(), ["A", "C", "D"]);
	assert!(items[0].ptr_eq(&a));
	assert!(body.children()[0].ptr_eq(&ul));
}

#[test]
fn tag_change_replaces_in_place() {
	let old = || VNode::element("section").with_child(VNode::text("before")).with_child(VNode::element("div").with_prop("class", "old")).with_child(VNode::text("after"));
	let (mut reconciler, body) = mount(Some(old()));
	let section = body.children()[0].clone();
	let before = section.children()[0].clone();

	reconciler
		.render(Some(
			VNode::element("section").with_child(VNode::text("before")).with_child(VNode::element("span").with_prop("class", "new")).with_child(VNode::text("after")),
		))
		.unwrap();

	let children = section.children();
	assert_eq!(children.len(), 3);
	assert!(children[0].ptr_eq(&before));
	assert_eq!(children[1].tag().as_deref(), Some("span"));
	assert_eq!(children[1].attribute("class").as_deref(), Some("new"));
	assert_eq!(inner_html(&body), r#"<section>before<span class="new"></span>after</section>"#);
}

#[test]
fn keyed_reordering_moves_existing_nodes() {
	let (mut reconciler, body) = mount(Some(list(&[("1", "a"), ("2", "b"), ("3", "c")])));
	let ul = body.children()[0].clone();
	let before = ul.children();
	let created = reconciler.target().created();

	reconciler.render(Some(list(&[("3", "c"), ("1", "a"), ("2", "b")]))).unwrap();

	let after = ul.children();
	assert!(after[0].ptr_eq(&before[2]));
	assert!(after[1].ptr_eq(&before[0]));
	assert!(after[2].ptr_eq(&before[1]));
	assert_eq!(reconciler.target().created(), created);

	let current = reconciler.current().unwrap().children().unwrap();
	assert!(current[0].target().unwrap().ptr_eq(&before[2]));
}

#[test]
fn empty_delta_update_changes_nothing() {
	let (mut patcher, body) = patcher();
	let tree: Node = VNode::element("div").with_prop("title", "t").with_child(VNode::text("x"));
	let patches = diff(None, Some(&tree));
	let live = patcher.patch(None, Some(tree), patches).unwrap();
	let html = inner_html(&body);

	let live = patcher
		.patch(
			live,
			None,
			vec![Patch::Update {
				path: NodePath::root(),
				delta: PropDelta::default(),
			}],
		)
		.unwrap();
	assert_eq!(inner_html(&body), html);
	assert!(live.is_some());
}

#[test]
fn out_of_range_reorder_moves_to_end() {
	let (mut patcher, body) = patcher();
	let tree = list(&[("a", "A"), ("b", "B"), ("c", "C")]);
	let patches = diff(None, Some(&tree));
	let live = patcher.patch(None, Some(tree), patches).unwrap();

	let live = patcher
		.patch(
			live,
			None,
			vec![Patch::Reorder {
				parent: NodePath::root(),
				index: 0,
				new_index: 99,
			}],
		)
		.unwrap()
		.unwrap();
	assert_eq!(body.text_content(), "BCA");
	let keys: Vec<_> = live.children().unwrap().iter().map(|child| child.key.clone()).collect();
	assert_eq!(keys, [Some(Key::from("b")), Some(Key::from("c")), Some(Key::from("a"))]);
}

#[test]
fn malformed_patches_are_skipped() {
	let (mut patcher, body) = patcher();
	let tree: Node = VNode::element("p").with_child(VNode::text("x"));
	let patches = diff(None, Some(&tree));
	let live = patcher.patch(None, Some(tree), patches).unwrap();

	let live = patcher
		.patch(
			live,
			None,
			vec![
				Patch::Remove { path: NodePath::from(vec![5]) },
				Patch::Create { path: NodePath::from(vec![1]), index: None },
				Patch::Text {
					path: NodePath::root(),
					text: "nope".to_owned(),
				},
				Patch::Reorder {
					parent: NodePath::from(vec![0]),
					index: 3,
					new_index: 0,
				},
				Patch::Update {
					path: NodePath::from(vec![0, 0, 0]),
					delta: PropDelta::default(),
				},
				Patch::Update {
					path: NodePath::from(vec![0]),
					delta: PropDelta {
						set: vec![("title".to_owned(), PropValue::from("t"))].into_iter().collect(),
						remove: vec![],
					},
				},
			],
		)
		.unwrap();
	assert_eq!(inner_html(&body), "<p>x</p>");
	assert!(live.is_some());
}

#[test]
fn batched_patches_apply_identically() {
	let old = || list(&[("a", "A"), ("b", "B"), ("c", "C")]);
	let new = || list(&[("c", "C!"), ("x", "X"), ("a", "A")]);

	let (mut patcher, body) = patcher();
	let tree = old();
	let patches = diff(None, Some(&tree));
	let live = patcher.patch(None, Some(tree), patches).unwrap();
	let next = new();
	let patches = batch_patches(diff(live.as_ref(), Some(&next)));
	patcher.patch(live, Some(next), patches).unwrap();

	assert_eq!(inner_html(&body), fresh_html(new()));
}

#[test]
fn render_rejection_propagates() {
	let (mut reconciler, body) = mount(Some(VNode::element("div")));
	let result = reconciler.render(Some(VNode::element("div").with_child(VNode::element("not valid"))));
	assert!(result.is_err());
	assert_eq!(inner_html(&body), "<div></div>");

	reconciler.render(Some(VNode::element("div").with_child(VNode::text("recovered")))).unwrap();
	assert_eq!(inner_html(&body), "<div>recovered</div>");
}

#[test]
fn unmount_clears_container() {
	let (mut reconciler, body) = mount(Some(VNode::fragment(vec![VNode::text("a"), VNode::element("b")])));
	assert_eq!(body.child_count(), 2);
	reconciler.unmount().unwrap();
	assert_eq!(body.child_count(), 0);
	assert!(reconciler.current().is_none());
}

#[test]
fn custom_materializer_builds_created_nodes() {
	struct Counting(Rc<Cell<usize>>);
	impl Materializer<MemoryTarget> for Counting {
		fn materialize(&mut self, target: &mut MemoryTarget, vnode: &mut Node, parent: &MemoryNode, namespace: Option<&'static str>) -> Result<Vec<MemoryNode>, Error> {
			self.0.set(self.0.get() + 1);
			Builder.materialize(target, vnode, parent, namespace)
		}
	}

	let (patcher, body) = patcher();
	let count = Rc::new(Cell::new(0));
	let mut patcher = patcher.with_materializer(Counting(Rc::clone(&count)));
	let tree: Node = VNode::element("div").with_child(VNode::text("x"));
	let patches = diff(None, Some(&tree));
	let live = patcher.patch(None, Some(tree), patches).unwrap();

	let next: Node = VNode::element("div").with_child(VNode::text("x")).with_child(VNode::element("p"));
	let patches = diff(live.as_ref(), Some(&next));
	patcher.patch(live, Some(next), patches).unwrap();

	assert_eq!(inner_html(&body), "<div>x<p></p></div>");
	assert_eq!(count.get(), 2);
}

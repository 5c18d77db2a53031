//! Reading existing target content back into attached [`VNode`]s, to adopt server-rendered or otherwise pre-existing markup.

use crate::{
	props::PropValue,
	target::RenderTarget,
	vnode::{Kind, VNode},
};
use tracing::{trace_span, warn};

/// What a [`RenderTarget`] node looks like from the outside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inspected {
	Element { tag: String, attributes: Vec<(String, String)> },
	Text(String),
}

/// A [`RenderTarget`] whose nodes can be read back.
pub trait Inspect: RenderTarget {
	/// `None` for node types that have no [`VNode`] counterpart (comments, processing instructions…).
	fn inspect(&self, node: &Self::Handle) -> Option<Inspected>;

	fn child_handles(&self, node: &Self::Handle) -> Vec<Self::Handle>;
}

/// Loads `node` and its descendants.
///
/// Attributes become [`PropValue::Text`] props. Event listeners can't be observed and aren't loaded.
/// The result is attached: Each node carries the handle it was loaded from.
pub fn load_node<T: Inspect + ?Sized>(target: &T, node: &T::Handle) -> Option<VNode<T::Handle>> {
	let mut vnode = match target.inspect(node) {
		Some(Inspected::Text(text)) => VNode::text(text),
		Some(Inspected::Element { tag, attributes }) => {
			let span = trace_span!("Loading element", tag = tag.as_str());
			let _enter = span.enter();
			let mut vnode = VNode::element(tag);
			if let Kind::Element(element) = &mut vnode.kind {
				element.props = attributes.into_iter().map(|(name, value)| (name, PropValue::Text(value))).collect();
				element.children = load_child_nodes(target, node);
			}
			vnode
		}
		None => {
			warn!("Skipping unrecognised node {:?}.", node);
			return None;
		}
	};
	vnode.set_target(node.clone());
	Some(vnode)
}

/// Loads the children of `parent`, skipping unrecognised nodes.
pub fn load_child_nodes<T: Inspect + ?Sized>(target: &T, parent: &T::Handle) -> Vec<VNode<T::Handle>> {
	target.child_handles(parent).iter().filter_map(|child| load_node(target, child)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryTarget;

	#[test]
	fn loads_attached_tree() {
		let mut target = MemoryTarget::new();
		let body = target.container("body");
		let p = target.create_element("p", None).unwrap();
		target.set_attribute(&p, None, "id", "greeting").unwrap();
		let text = target.create_text("Hello").unwrap();
		target.insert_before(&p, &text, None).unwrap();
		target.insert_before(&body, &p, None).unwrap();

		let loaded = load_child_nodes(&target, &body);
		assert_eq!(loaded.len(), 1);
		assert_eq!(loaded[0].tag(), Some("p"));
		assert_eq!(loaded[0].props().and_then(|props| props.get("id")), Some(&PropValue::from("greeting")));
		assert!(loaded[0].target().map_or(false, |handle| handle.ptr_eq(&p)));
		let children = loaded[0].children().unwrap();
		assert_eq!(children[0].text_data(), Some("Hello"));
		assert!(children[0].is_attached());
	}
}

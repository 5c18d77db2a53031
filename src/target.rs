//! The render target mutation surface and materialization of fresh subtrees.

use crate::{
	event::Handler,
	namespace,
	props,
	vnode::{Kind, VNode},
	Error,
};
use core::fmt::Debug;
use tracing::{instrument, trace_span};

/// A DOM-like tree of elements and text nodes that can be mutated in place.
///
/// Every method that changes the target reports rejection through [`Error::Target`].
/// The patcher propagates these errors to its caller unchanged.
pub trait RenderTarget {
	/// A reference to one live node. Cloning must not clone the node itself.
	type Handle: Clone + Debug;

	/// Creates a detached element, in `namespace` if given.
	///
	/// # Errors
	///
	/// Iff the target rejects the element.
	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Result<Self::Handle, Error>;

	/// # Errors
	///
	/// Iff the target rejects the text node.
	fn create_text(&mut self, text: &str) -> Result<Self::Handle, Error>;

	/// Replaces the character data of a text node.
	///
	/// # Errors
	///
	/// Iff `node` is not a text node.
	fn set_text(&mut self, node: &Self::Handle, text: &str) -> Result<(), Error>;

	/// Inserts `child` into `parent` before `reference`, or at the end if `reference` is `None`.
	///
	/// An already attached `child` is moved.
	///
	/// # Errors
	///
	/// Iff `reference` is not a child of `parent` or the insertion would create a cycle.
	fn insert_before(&mut self, parent: &Self::Handle, child: &Self::Handle, reference: Option<&Self::Handle>) -> Result<(), Error>;

	/// Detaches `node` from its parent.
	///
	/// Returns `false` if it had no parent, which is not an error.
	///
	/// # Errors
	///
	/// Iff the target rejects the removal.
	fn detach(&mut self, node: &Self::Handle) -> Result<bool, Error>;

	/// # Errors
	///
	/// Iff `node` is not an element or the attribute name is invalid.
	fn set_attribute(&mut self, node: &Self::Handle, namespace: Option<&str>, name: &str, value: &str) -> Result<(), Error>;

	/// Removing an absent attribute is not an error.
	///
	/// # Errors
	///
	/// Iff `node` is not an element.
	fn remove_attribute(&mut self, node: &Self::Handle, namespace: Option<&str>, name: &str) -> Result<(), Error>;

	/// Sets a single inline style property, leaving all others untouched.
	///
	/// # Errors
	///
	/// Iff `node` has no inline style.
	fn set_style(&mut self, node: &Self::Handle, property: &str, value: &str) -> Result<(), Error>;

	/// # Errors
	///
	/// Iff `node` has no inline style.
	fn remove_style(&mut self, node: &Self::Handle, property: &str) -> Result<(), Error>;

	/// Attaches `handler` for `event`, replacing any listener this target attached for `event` before.
	///
	/// # Errors
	///
	/// Iff the target rejects the listener.
	fn set_listener(&mut self, node: &Self::Handle, event: &str, handler: Handler) -> Result<(), Error>;

	/// Detaching an absent listener is not an error.
	///
	/// # Errors
	///
	/// Iff the target rejects the removal.
	fn remove_listener(&mut self, node: &Self::Handle, event: &str) -> Result<(), Error>;
}

/// Builds a live subtree for a node that was never attached.
pub trait Materializer<T: RenderTarget + ?Sized> {
	/// Materializes `vnode` and its descendants, recording each target handle on its node.
	///
	/// Returns the target nodes `vnode` contributes to its container in document order, without inserting them.
	/// That's exactly one node for elements and text, and the flattened children for fragments,
	/// which record `parent` (the container they are flattened into) as their target.
	///
	/// `namespace` is the namespace the container's children are created in.
	///
	/// # Errors
	///
	/// Iff the render target rejects a mutation.
	fn materialize(&mut self, target: &mut T, vnode: &mut VNode<T::Handle>, parent: &T::Handle, namespace: Option<&'static str>) -> Result<Vec<T::Handle>, Error>;
}

/// The default [`Materializer`], which creates each node through the [`RenderTarget`] and applies props with the same rules as updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct Builder;

impl<T: RenderTarget + ?Sized> Materializer<T> for Builder {
	#[instrument(skip(self, target, vnode, parent))]
	fn materialize(&mut self, target: &mut T, vnode: &mut VNode<T::Handle>, parent: &T::Handle, namespace: Option<&'static str>) -> Result<Vec<T::Handle>, Error> {
		let (handle, handles) = match &mut vnode.kind {
			Kind::Text(text) => {
				let span = trace_span!("Creating text node", text = crate::redact(text));
				let _enter = span.enter();
				let handle = target.create_text(text)?;
				(handle.clone(), vec![handle])
			}

			Kind::Element(element) => {
				let span = trace_span!("Creating element", tag = element.tag.as_str());
				let _enter = span.enter();
				let namespace = namespace::of_element(&element.tag, namespace);
				let handle = target.create_element(&element.tag, namespace)?;
				for (name, value) in &element.props {
					props::apply(target, &handle, name, None, Some(value))?;
				}

				let child_namespace = namespace::of_children(&element.tag, namespace);
				for child in &mut element.children {
					for child_handle in self.materialize(target, child, &handle, child_namespace)? {
						target.insert_before(&handle, &child_handle, None)?;
					}
				}
				(handle.clone(), vec![handle])
			}

			Kind::Fragment(children) => {
				let span = trace_span!("Creating fragment", "children.len()" = children.len());
				let _enter = span.enter();
				let mut handles = Vec::new();
				for child in children {
					handles.extend(self.materialize(target, child, parent, namespace)?);
				}
				(parent.clone(), handles)
			}
		};
		vnode.set_target(handle);
		Ok(handles)
	}
}

//! The virtual node model.

use crate::{
	effect::{self, Effect},
	props::{self, PropValue},
};
use core::fmt;
use std::collections::BTreeMap;

/// An element's props by name.
pub type Props = BTreeMap<String, PropValue>;

/// Stable sibling identity for list reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
	Int(i64),
	Str(String),
}
impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Key::Int(int) => write!(f, "{}", int),
			Key::Str(str) => write!(f, "{:?}", str),
		}
	}
}
impl From<&str> for Key {
	fn from(key: &str) -> Self {
		Key::Str(key.to_owned())
	}
}
impl From<String> for Key {
	fn from(key: String) -> Self {
		Key::Str(key)
	}
}
impl From<i64> for Key {
	fn from(key: i64) -> Self {
		Key::Int(key)
	}
}
impl From<i32> for Key {
	fn from(key: i32) -> Self {
		Key::Int(key.into())
	}
}
impl From<u32> for Key {
	fn from(key: u32) -> Self {
		Key::Int(key.into())
	}
}

/// An element description.
#[derive(Debug)]
pub struct Element<H> {
	pub tag: String,
	pub props: Props,
	pub children: Vec<VNode<H>>,
}

#[derive(Debug)]
pub enum Kind<H> {
	Element(Element<H>),
	Text(String),
	/// A sequence of siblings without a target node of its own.
	///
	/// Its children are flattened into the nearest element (or mount container) above it.
	Fragment(Vec<VNode<H>>),
}

/// One position in a render tree, generic over the render target's handle type `H`.
///
/// Descriptions are built with [`VNode::element`], [`VNode::text`] and [`VNode::fragment`] and treated as immutable afterwards.
/// Only the [`Patcher`](`crate::Patcher`) (and [`Materializer`](`crate::Materializer`) implementations) touch a node's target handle,
/// and only the patcher runs its effects' cleanups.
///
/// An attached node always has a target. A detached node has neither target nor effects.
pub struct VNode<H> {
	pub kind: Kind<H>,
	pub key: Option<Key>,
	target: Option<H>,
	effects: Vec<Box<dyn Effect>>,
	/// Left behind in the next tree where the patcher moved a description into the live tree.
	vacated: bool,
}

impl<H> VNode<H> {
	fn new(kind: Kind<H>) -> Self {
		Self {
			kind,
			key: None,
			target: None,
			effects: Vec::new(),
			vacated: false,
		}
	}

	#[must_use]
	pub fn element(tag: impl Into<String>) -> Self {
		Self::new(Kind::Element(Element {
			tag: tag.into(),
			props: Props::new(),
			children: Vec::new(),
		}))
	}

	#[must_use]
	pub fn text(text: impl Into<String>) -> Self {
		Self::new(Kind::Text(text.into()))
	}

	#[must_use]
	pub fn fragment(children: impl IntoIterator<Item = VNode<H>>) -> Self {
		Self::new(Kind::Fragment(children.into_iter().collect()))
	}

	pub(crate) fn vacated() -> Self {
		Self {
			vacated: true,
			..Self::fragment(None)
		}
	}

	#[must_use]
	pub fn with_key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Sets a prop on an element. Ignored (with a warning) for text and fragments.
	///
	/// `"key"` sets the node's [`Key`] instead. Whole numbers become [`Key::Int`], as with [`VNode::with_key`].
	#[must_use]
	pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
		let name = name.into();
		let value = value.into();
		if name == "key" {
			let key = match value {
				#[allow(clippy::cast_possible_truncation)]
				PropValue::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => Some(Key::Int(number as i64)),
				value => props::stringify(&value).map(Key::Str),
			};
			match key {
				Some(key) => self.key = Some(key),
				None => tracing::warn!("Ignoring `key` prop without a string representation."),
			}
			return self;
		}
		match &mut self.kind {
			Kind::Element(element) => {
				element.props.insert(name, value);
			}
			_ => tracing::warn!("Ignoring prop {:?} on a {} node.", name, self.kind_name()),
		}
		self
	}

	/// Appends a child to an element or fragment. Ignored (with a warning) for text.
	#[must_use]
	pub fn with_child(mut self, child: VNode<H>) -> Self {
		match self.children_mut() {
			Some(children) => children.push(child),
			None => tracing::warn!("Ignoring child of a text node."),
		}
		self
	}

	#[must_use]
	pub fn with_children(mut self, children: impl IntoIterator<Item = VNode<H>>) -> Self {
		match self.children_mut() {
			Some(existing) => existing.extend(children),
			None => tracing::warn!("Ignoring children of a text node."),
		}
		self
	}

	#[must_use]
	pub fn with_effect(mut self, effect: impl Effect + 'static) -> Self {
		self.attach_effect(effect);
		self
	}

	/// Attaches an effect, to be cleaned up when this node leaves the live tree.
	pub fn attach_effect(&mut self, effect: impl Effect + 'static) {
		self.effects.push(Box::new(effect));
	}

	#[must_use]
	pub fn target(&self) -> Option<&H> {
		self.target.as_ref()
	}

	/// Records the materialized target handle. Meant for [`Materializer`](`crate::Materializer`) implementations.
	pub fn set_target(&mut self, target: H) {
		self.target = Some(target);
	}

	#[must_use]
	pub fn is_attached(&self) -> bool {
		self.target.is_some()
	}

	#[must_use]
	pub fn effect_count(&self) -> usize {
		self.effects.len()
	}

	#[must_use]
	pub fn kind_name(&self) -> &'static str {
		match self.kind {
			Kind::Element(_) => "element",
			Kind::Text(_) => "text",
			Kind::Fragment(_) => "fragment",
		}
	}

	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		match &self.kind {
			Kind::Element(element) => Some(&element.tag),
			_ => None,
		}
	}

	#[must_use]
	pub fn props(&self) -> Option<&Props> {
		match &self.kind {
			Kind::Element(element) => Some(&element.props),
			_ => None,
		}
	}

	#[must_use]
	pub fn text_data(&self) -> Option<&str> {
		match &self.kind {
			Kind::Text(text) => Some(text),
			_ => None,
		}
	}

	#[must_use]
	pub fn children(&self) -> Option<&[VNode<H>]> {
		match &self.kind {
			Kind::Element(element) => Some(&element.children),
			Kind::Fragment(children) => Some(children),
			Kind::Text(_) => None,
		}
	}

	pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<VNode<H>>> {
		match &mut self.kind {
			Kind::Element(element) => Some(&mut element.children),
			Kind::Fragment(children) => Some(children),
			Kind::Text(_) => None,
		}
	}

	/// Number of target nodes this node contributes to its container.
	#[must_use]
	pub fn dom_len(&self) -> usize {
		match &self.kind {
			Kind::Element(_) | Kind::Text(_) => 1,
			Kind::Fragment(children) => children.iter().map(VNode::dom_len).sum(),
		}
	}

	/// Runs the cleanups of this node's effects and those of its descendants, in document order.
	pub(crate) fn cleanup_effects(&mut self) {
		effect::run_cleanups(std::mem::take(&mut self.effects));
		if let Some(children) = self.children_mut() {
			for child in children {
				child.cleanup_effects()
			}
		}
	}

	/// Detaches this subtree from its bookkeeping: effects are cleaned up and targets cleared.
	pub(crate) fn teardown(&mut self) {
		effect::run_cleanups(std::mem::take(&mut self.effects));
		self.target = None;
		if let Some(children) = self.children_mut() {
			for child in children {
				child.teardown()
			}
		}
	}

	/// Moves effects and key of the reused description `next` onto this live node, recursively.
	///
	/// Effects of description nodes without live counterpart are cleaned up right away.
	pub(crate) fn adopt(&mut self, next: &mut VNode<H>) {
		if next.vacated {
			return;
		}
		self.effects.append(&mut next.effects);
		if self.key != next.key {
			self.key = next.key.take();
		}
		match (self.children_mut(), next.children_mut()) {
			(Some(live), Some(next)) => {
				let adopted = live.len().min(next.len());
				for (live, next) in live.iter_mut().zip(next.iter_mut()) {
					live.adopt(next)
				}
				for orphan in &mut next[adopted..] {
					tracing::warn!("Description node without live counterpart. Cleaning up its effects.");
					orphan.cleanup_effects()
				}
			}
			(None, Some(next)) => {
				for orphan in next {
					orphan.cleanup_effects()
				}
			}
			_ => (),
		}
	}
}

impl<H: Clone> VNode<H> {
	/// The first target node this node contributes to its container, if any.
	#[must_use]
	pub fn first_target(&self) -> Option<H> {
		match &self.kind {
			Kind::Element(_) | Kind::Text(_) => self.target.clone(),
			Kind::Fragment(children) => children.iter().find_map(VNode::first_target),
		}
	}

	/// All target nodes this node contributes to its container, in document order.
	#[must_use]
	pub fn targets(&self) -> Vec<H> {
		let mut targets = Vec::with_capacity(self.dom_len());
		self.collect_targets(&mut targets);
		targets
	}

	fn collect_targets(&self, targets: &mut Vec<H>) {
		match &self.kind {
			Kind::Element(_) | Kind::Text(_) => targets.extend(self.target.clone()),
			Kind::Fragment(children) => {
				for child in children {
					child.collect_targets(targets)
				}
			}
		}
	}
}

impl<H: fmt::Debug> fmt::Debug for VNode<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("VNode")
			.field("kind", &self.kind)
			.field("key", &self.key)
			.field("target", &self.target)
			.field("effects", &self.effects.len())
			.finish()
	}
}

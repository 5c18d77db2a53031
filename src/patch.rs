//! Patches, the instructions produced by [`diff`](`crate::diff()`) and consumed by the [`Patcher`](`crate::Patcher`).

use crate::{
	props::{self, PropValue},
	vnode::Props,
};
use core::fmt;
use std::collections::BTreeMap;
use tracing::trace;

/// Child indices from the root of a tree to one of its nodes.
///
/// A path in a patch list names the same position in the live tree (at the time the patch is applied) and in the next tree,
/// as [`diff`](`crate::diff()`) emits patches in the order in which the live tree converges on the next one.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);
impl NodePath {
	#[must_use]
	pub fn root() -> Self {
		Self(Vec::new())
	}

	#[must_use]
	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn indices(&self) -> &[usize] {
		&self.0
	}

	#[must_use]
	pub fn child(&self, index: usize) -> Self {
		let mut indices = Vec::with_capacity(self.0.len() + 1);
		indices.extend_from_slice(&self.0);
		indices.push(index);
		Self(indices)
	}
}
impl From<Vec<usize>> for NodePath {
	fn from(indices: Vec<usize>) -> Self {
		Self(indices)
	}
}
impl From<&[usize]> for NodePath {
	fn from(indices: &[usize]) -> Self {
		Self(indices.to_vec())
	}
}
impl fmt::Display for NodePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			return f.write_str("/");
		}
		for index in &self.0 {
			write!(f, "/{}", index)?;
		}
		Ok(())
	}
}
impl fmt::Debug for NodePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

/// The prop changes between two versions of an element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropDelta {
	pub set: BTreeMap<String, PropValue>,
	pub remove: Vec<String>,
}
impl PropDelta {
	/// Props added or changed in `new` go into [`set`](`PropDelta::set`), props missing from `new` into [`remove`](`PropDelta::remove`).
	///
	/// Reserved props never appear.
	#[must_use]
	pub fn between(old: &Props, new: &Props) -> Self {
		let set = new
			.iter()
			.filter(|(name, value)| !props::is_reserved(name) && old.get(*name) != Some(*value))
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect();
		let remove = old.keys().filter(|name| !props::is_reserved(name) && !new.contains_key(*name)).cloned().collect();
		Self { set, remove }
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.set.is_empty() && self.remove.is_empty()
	}
}

/// A single instruction for the [`Patcher`](`crate::Patcher`).
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
	/// Materializes the next tree's node at `path` and inserts it as child `index` of the live parent (appends if `None`).
	///
	/// At the root path, it's mounted into the patcher's container.
	Create { path: NodePath, index: Option<usize> },
	/// Detaches and destroys the live node at `path`.
	Remove { path: NodePath },
	/// Destroys the live node at `path` and materializes the next tree's node at `path` in its place.
	Replace { path: NodePath },
	/// Applies `delta` to the live element at `path`, keeping its target.
	Update { path: NodePath, delta: PropDelta },
	/// Sets the data of the live text node at `path`, keeping its target.
	Text { path: NodePath, text: String },
	/// Moves live child `index` of `parent` to `new_index` (or the end, if beyond it) without recreating it.
	Reorder { parent: NodePath, index: usize, new_index: usize },
}

/// Prepares a patch list for application.
///
/// This currently returns `patches` unchanged. Any future coalescing keeps the observable result of [`Patcher::patch`](`crate::Patcher::patch`) the same,
/// so `batch_patches(patches)` and `patches` are always interchangeable.
#[must_use]
pub fn batch_patches(patches: Vec<Patch>) -> Vec<Patch> {
	trace!("Batching {} patch(es) (pass-through).", patches.len());
	patches
}

//! The pure diff engine.

use crate::{
	patch::{NodePath, Patch, PropDelta},
	vnode::{Key, Kind, VNode},
};
use core::mem;
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use tracing::{error, instrument, trace, trace_span, warn};

/// Diff configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiffOptions {
	/// Maximum nesting depth that is diffed. Deeper subtrees are replaced wholesale (and an error is logged).
	pub depth_limit: usize,
}
impl Default for DiffOptions {
	fn default() -> Self {
		Self { depth_limit: 512 }
	}
}
impl DiffOptions {
	#[must_use]
	pub fn with_depth_limit(self, depth_limit: usize) -> Self {
		Self { depth_limit, ..self }
	}
}

/// Computes the patches that turn `old` into `new`, with default [`DiffOptions`].
///
/// This neither reads target handles nor mutates anything.
/// `None` on either side means nothing is (or should be) mounted.
#[must_use]
pub fn diff<H>(old: Option<&VNode<H>>, new: Option<&VNode<H>>) -> Vec<Patch> {
	diff_with_options(old, new, DiffOptions::default())
}

#[must_use]
#[instrument(skip(old, new))]
pub fn diff_with_options<H>(old: Option<&VNode<H>>, new: Option<&VNode<H>>, options: DiffOptions) -> Vec<Patch> {
	let mut differ = Differ {
		patches: Vec::new(),
		path: Vec::new(),
	};
	match (old, new) {
		(None, None) => (),
		(None, Some(_)) => differ.patches.push(Patch::Create { path: NodePath::root(), index: None }),
		(Some(_), None) => differ.patches.push(Patch::Remove { path: NodePath::root() }),
		(Some(old), Some(new)) => differ.diff_node(old, new, options.depth_limit),
	}
	trace!("Diff produced {} patch(es).", differ.patches.len());
	differ.patches
}

struct Differ {
	patches: Vec<Patch>,
	/// Path of the node (or children list) currently being diffed.
	path: Vec<usize>,
}

impl Differ {
	fn here(&self) -> NodePath {
		NodePath::from(self.path.as_slice())
	}

	fn at(&self, index: usize) -> NodePath {
		self.here().child(index)
	}

	fn diff_node<H>(&mut self, old: &VNode<H>, new: &VNode<H>, depth_limit: usize) {
		if depth_limit == 0 {
			error!("Depth limit reached at {}. Replacing the subtree instead of diffing it.", self.here());
			return self.patches.push(Patch::Replace { path: self.here() });
		}

		match (&old.kind, &new.kind) {
			(Kind::Text(t_1), Kind::Text(t_2)) => {
				if t_1 != t_2 {
					trace!(path = %self.here(), t_1 = crate::redact(t_1), t_2 = crate::redact(t_2), "Text changed");
					self.patches.push(Patch::Text {
						path: self.here(),
						text: t_2.clone(),
					})
				}
			}

			(Kind::Element(e_1), Kind::Element(e_2)) if e_1.tag == e_2.tag => {
				let span = trace_span!("Diffing element", tag = e_1.tag.as_str());
				let _enter = span.enter();

				let delta = PropDelta::between(&e_1.props, &e_2.props);
				let outer = mem::take(&mut self.patches);
				self.diff_children(&e_1.children, &e_2.children, depth_limit);
				let children = mem::replace(&mut self.patches, outer);
				if !delta.is_empty() || !children.is_empty() {
					self.patches.push(Patch::Update { path: self.here(), delta })
				}
				self.patches.extend(children)
			}

			(Kind::Fragment(c_1), Kind::Fragment(c_2)) => {
				let span = trace_span!("Diffing fragment");
				let _enter = span.enter();
				self.diff_children(c_1, c_2, depth_limit)
			}

			// Mismatching nodes: Destroy and rebuild.
			(n_1, n_2) => {
				if let (Kind::Element(e_1), Kind::Element(e_2)) = (n_1, n_2) {
					if e_1.tag.eq_ignore_ascii_case(&e_2.tag) {
						warn!("Recreating element due to different tag name casing: {:?} -> {:?}", e_1.tag, e_2.tag)
					}
				}
				trace!(path = %self.here(), old = old.kind_name(), new = new.kind_name(), "Replacing mismatching node");
				self.patches.push(Patch::Replace { path: self.here() })
			}
		}
	}

	/// Reconciles the children of the node at `self.path`.
	///
	/// Emits all removals first (highest index first), then walks `new` in order, so that each emitted path is valid when applied:
	/// Once position `j` is handled, live children `0..=j` are final.
	#[allow(clippy::similar_names)]
	fn diff_children<H>(&mut self, old: &[VNode<H>], new: &[VNode<H>], depth_limit: usize) {
		if old.is_empty() && new.is_empty() {
			return;
		}
		let span = trace_span!("Reconciling children", "old.len()" = old.len(), "new.len()" = new.len());
		let _enter = span.enter();

		// Duplicate old keys: the first occurrence wins, later ones are matched as if unkeyed.
		let mut keyed = HashMap::<&Key, usize>::new();
		let mut unkeyed = Vec::new();
		for (i, child) in old.iter().enumerate() {
			match &child.key {
				Some(key) => match keyed.entry(key) {
					Entry::Vacant(vacant) => {
						vacant.insert(i);
					}
					Entry::Occupied(_) => {
						warn!("Duplicate sibling key {} in the previous tree. Matching it positionally.", key);
						unkeyed.push(i)
					}
				},
				None => unkeyed.push(i),
			}
		}

		let mut claimed = vec![false; old.len()];
		let mut matches = Vec::with_capacity(new.len());
		let mut seen = HashSet::<&Key>::new();
		let mut unkeyed = unkeyed.into_iter();
		for child in new {
			let matched = match &child.key {
				Some(key) if seen.insert(key) => keyed.get(key).copied(),
				duplicate_or_none => {
					if let Some(key) = duplicate_or_none {
						warn!("Duplicate sibling key {} in the next tree. Matching it positionally.", key);
					}
					unkeyed.next()
				}
			};
			if let Some(i) = matched {
				claimed[i] = true;
			}
			matches.push(matched);
		}

		for i in (0..old.len()).rev().filter(|&i| !claimed[i]) {
			trace!(path = %self.at(i), "Removing unmatched child");
			self.patches.push(Patch::Remove { path: self.at(i) })
		}

		// Live children from the current position on are exactly the pending (claimed, not yet placed) old children in old order.
		let mut pending = Pending::new(old.len());
		for i in (0..old.len()).filter(|&i| claimed[i]) {
			pending.insert(i);
		}

		for (j, (new_child, matched)) in new.iter().zip(matches).enumerate() {
			match matched {
				Some(i) => {
					let ahead = pending.count_before(i);
					pending.remove(i);
					if ahead != 0 {
						trace!(parent = %self.here(), index = j + ahead, new_index = j, "Reordering child");
						self.patches.push(Patch::Reorder {
							parent: self.here(),
							index: j + ahead,
							new_index: j,
						})
					}
					self.path.push(j);
					self.diff_node(&old[i], new_child, depth_limit - 1);
					self.path.pop();
				}
				None => {
					trace!(path = %self.at(j), "Creating unmatched child");
					self.patches.push(Patch::Create { path: self.at(j), index: Some(j) })
				}
			}
		}
	}
}

/// Fenwick tree over old child indices, counting those that are still waiting to be placed.
//TODO: Use a longest increasing subsequence to keep the most children in place instead of moving each one that has pending predecessors.
struct Pending {
	tree: Vec<usize>,
}
impl Pending {
	fn new(len: usize) -> Self {
		Self { tree: vec![0; len + 1] }
	}

	fn insert(&mut self, index: usize) {
		let mut i = index + 1;
		while i < self.tree.len() {
			self.tree[i] += 1;
			i += i & i.wrapping_neg();
		}
	}

	fn remove(&mut self, index: usize) {
		let mut i = index + 1;
		while i < self.tree.len() {
			self.tree[i] -= 1;
			i += i & i.wrapping_neg();
		}
	}

	/// Number of pending indices below `index`.
	fn count_before(&self, index: usize) -> usize {
		let mut i = index;
		let mut count = 0;
		while i > 0 {
			count += self.tree[i];
			i -= i & i.wrapping_neg();
		}
		count
	}
}

#[cfg(test)]
mod tests {
	use super::Pending;

	#[test]
	fn pending_counts() {
		let mut pending = Pending::new(6);
		for i in &[0, 2, 3, 5] {
			pending.insert(*i);
		}
		assert_eq!(pending.count_before(0), 0);
		assert_eq!(pending.count_before(3), 2);
		assert_eq!(pending.count_before(5), 3);
		pending.remove(2);
		assert_eq!(pending.count_before(5), 2);
		assert_eq!(pending.count_before(6), 3);
	}
}

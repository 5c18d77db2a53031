//! The patching engine.

use crate::{
	patch::{NodePath, Patch, PropDelta},
	props,
	target::{Builder, Materializer, RenderTarget},
	vnode::{Kind, VNode},
	Error,
};
use core::mem;
use tracing::{debug, instrument, trace, trace_span, warn};

/// Attached to a container node of a [`RenderTarget`], this `struct` applies [`Patch`]es to the tree mounted inside it.
///
/// The container's child nodes are owned by the patcher from the first patch on.
/// Mutating them from elsewhere between patches leads to unspecified (but memory-safe) results.
///
/// # Correct Use
///
/// Patches must be applied to the live tree they were [diffed](`crate::diff()`) against, together with the tree they were diffed towards,
/// in the order they were produced. [`Reconciler`](`crate::Reconciler`) takes care of this.
#[derive(Debug)]
pub struct Patcher<T: RenderTarget, M = Builder> {
	target: T,
	container: T::Handle,
	materializer: M,
}

impl<T: RenderTarget> Patcher<T> {
	#[must_use]
	#[instrument(skip(target))]
	pub fn new_for_container(target: T, container: T::Handle) -> Self {
		Self {
			target,
			container,
			materializer: Builder,
		}
	}
}

/// Where the children of a node are materialized.
struct Slot<H> {
	container: H,
	namespace: Option<&'static str>,
}

impl<T: RenderTarget, M: Materializer<T>> Patcher<T, M> {
	#[must_use]
	pub fn with_materializer<M2: Materializer<T>>(self, materializer: M2) -> Patcher<T, M2> {
		Patcher {
			target: self.target,
			container: self.container,
			materializer,
		}
	}

	#[must_use]
	pub fn target(&self) -> &T {
		&self.target
	}

	pub fn target_mut(&mut self) -> &mut T {
		&mut self.target
	}

	#[must_use]
	pub fn container(&self) -> &T::Handle {
		&self.container
	}

	/// Applies `patches` in order to the live tree `root`, towards `next`, and returns the resulting live tree.
	///
	/// With an empty patch list, that's `root` itself.
	///
	/// # Errors
	///
	/// Iff the render target rejects a mutation. The tree is then lost; use [`Patcher::patch_in_place`] to keep it.
	pub fn patch(&mut self, root: Option<VNode<T::Handle>>, next: Option<VNode<T::Handle>>, patches: Vec<Patch>) -> Result<Option<VNode<T::Handle>>, Error> {
		let mut root = root;
		self.patch_in_place(&mut root, next, patches)?;
		Ok(root)
	}

	/// Like [`Patcher::patch`], but updates `live` in place.
	///
	/// After the patches, effects attached to the descriptions in `next` are moved onto the live nodes they were reconciled with.
	///
	/// # Errors
	///
	/// Iff the render target rejects a mutation. `live` then reflects all patches applied before the failing one,
	/// and effects from `next` that weren't adopted yet are cleaned up.
	#[instrument(skip(self, live, next, patches), fields(count = patches.len()))]
	pub fn patch_in_place(&mut self, live: &mut Option<VNode<T::Handle>>, next: Option<VNode<T::Handle>>, patches: Vec<Patch>) -> Result<(), Error> {
		let mut next = next;
		let count = patches.len();
		let result = patches.into_iter().try_for_each(|patch| self.apply_patch(live, &mut next, patch));

		match (result.is_ok(), live.as_mut(), next.as_mut()) {
			(true, Some(live), Some(next)) => live.adopt(next),
			(_, _, Some(next)) => next.cleanup_effects(),
			(_, _, None) => (),
		}
		debug!("Applied {} patch(es).", count);
		result
	}

	/// Applies a single patch.
	///
	/// Patches that don't fit the live tree are logged and skipped.
	///
	/// # Errors
	///
	/// Iff the render target rejects a mutation.
	#[instrument(skip(self, live, next))]
	pub fn apply_patch(&mut self, live: &mut Option<VNode<T::Handle>>, next: &mut Option<VNode<T::Handle>>, patch: Patch) -> Result<(), Error> {
		match patch {
			Patch::Create { path, index } => self.create(live, next, &path, index),
			Patch::Remove { path } => self.remove(live, &path),
			Patch::Replace { path } => self.replace(live, next, &path),
			Patch::Update { path, delta } => self.update(live, &path, delta),
			Patch::Text { path, text } => self.set_text(live, &path, text),
			Patch::Reorder { parent, index, new_index } => self.reorder(live, &parent, index, new_index),
		}
	}

	fn create(&mut self, live: &mut Option<VNode<T::Handle>>, next: &mut Option<VNode<T::Handle>>, path: &NodePath, index: Option<usize>) -> Result<(), Error> {
		let span = trace_span!("Creating", %path, ?index);
		let _enter = span.enter();

		let mut node = match take_description(next, path.indices()) {
			Some(node) => node,
			None => {
				warn!("Malformed CREATE: The next tree has no node at {}. Skipping.", path);
				return Ok(());
			}
		};

		let parent = match path.indices().split_last() {
			Some((_, parent)) => parent,
			None => {
				if live.is_some() {
					warn!("Malformed CREATE: A root is mounted already. Skipping.");
					node.teardown();
					return Ok(());
				}
				let container = self.container.clone();
				let handles = self.materialize(&mut node, &Slot { container: container.clone(), namespace: None })?;
				self.insert(&mut node, &handles, &container, None)?;
				*live = Some(node);
				return Ok(());
			}
		};

		let root = match live.as_ref() {
			Some(root) => root,
			None => {
				warn!("Malformed CREATE: Nothing is mounted to create {} in. Skipping.", path);
				node.teardown();
				return Ok(());
			}
		};
		let (slot, len) = match (child_slot(&self.container, root, parent), node_at(Some(root), parent).and_then(VNode::children)) {
			(Some(slot), Some(children)) => (slot, children.len()),
			_ => {
				warn!("Malformed CREATE: No live parent with children at {}. Skipping.", path);
				node.teardown();
				return Ok(());
			}
		};
		let index = index.map_or(len, |index| index.min(len));
		let reference = reference_at(root, parent, index);

		let handles = self.materialize(&mut node, &slot)?;
		self.insert(&mut node, &handles, &slot.container, reference.as_ref())?;
		if let Some(children) = node_at_mut(live.as_mut(), parent).and_then(VNode::children_mut) {
			children.insert(index, node)
		}
		Ok(())
	}

	fn remove(&mut self, live: &mut Option<VNode<T::Handle>>, path: &NodePath) -> Result<(), Error> {
		let span = trace_span!("Removing", %path);
		let _enter = span.enter();

		match node_at(live.as_ref(), path.indices()) {
			Some(node) => self.detach(node)?,
			None => {
				warn!("Malformed REMOVE: No live node at {}. Skipping.", path);
				return Ok(());
			}
		}

		let removed = match path.indices().split_last() {
			None => live.take(),
			Some((&i, parent)) => node_at_mut(live.as_mut(), parent).and_then(VNode::children_mut).map(|children| children.remove(i)),
		};
		if let Some(mut removed) = removed {
			removed.teardown()
		}
		Ok(())
	}

	fn replace(&mut self, live: &mut Option<VNode<T::Handle>>, next: &mut Option<VNode<T::Handle>>, path: &NodePath) -> Result<(), Error> {
		let span = trace_span!("Replacing", %path);
		let _enter = span.enter();

		let root = match live.as_ref() {
			Some(root) if node_at(Some(root), path.indices()).is_some() => root,
			_ => {
				warn!("Malformed REPLACE: No live node at {}. Skipping.", path);
				return Ok(());
			}
		};
		let mut replacement = match take_description(next, path.indices()) {
			Some(replacement) => replacement,
			None => {
				warn!("Malformed REPLACE: The next tree has no node at {}. Skipping.", path);
				return Ok(());
			}
		};

		let (slot, old_handles, reference) = {
			let (slot, following) = match path.indices().split_last() {
				None => (Some(Slot { container: self.container.clone(), namespace: None }), None),
				Some((&i, parent)) => (child_slot(&self.container, root, parent), reference_at(root, parent, i + 1)),
			};
			let old_handles = node_at(Some(root), path.indices()).map(VNode::targets).unwrap_or_default();
			let reference = old_handles.first().cloned().or(following);
			(slot, old_handles, reference)
		};
		let slot = match slot {
			Some(slot) => slot,
			None => {
				warn!("Malformed REPLACE: The live parent of {} is not attached. Skipping.", path);
				replacement.teardown();
				return Ok(());
			}
		};

		if let Some(existing) = node_at_mut(live.as_mut(), path.indices()) {
			existing.cleanup_effects()
		}

		let handles = self.materialize(&mut replacement, &slot)?;
		self.insert(&mut replacement, &handles, &slot.container, reference.as_ref())?;
		for handle in &old_handles {
			if !self.target.detach(handle)? {
				trace!("Replaced target node was already detached.");
			}
		}

		let replaced = if path.is_root() {
			live.replace(replacement)
		} else {
			node_at_mut(live.as_mut(), path.indices()).map(|existing| mem::replace(existing, replacement))
		};
		if let Some(mut replaced) = replaced {
			replaced.teardown()
		}
		Ok(())
	}

	fn update(&mut self, live: &mut Option<VNode<T::Handle>>, path: &NodePath, delta: PropDelta) -> Result<(), Error> {
		let span = trace_span!("Updating", %path, "delta.set.len()" = delta.set.len(), "delta.remove.len()" = delta.remove.len());
		let _enter = span.enter();

		let node = match node_at_mut(live.as_mut(), path.indices()) {
			Some(node) => node,
			None => {
				warn!("Malformed UPDATE: No live node at {}. Skipping.", path);
				return Ok(());
			}
		};
		let kind = node.kind_name();
		let (handle, element) = match (node.target().cloned(), &mut node.kind) {
			(Some(handle), Kind::Element(element)) => (handle, element),
			_ => {
				warn!("Malformed UPDATE: Expected an attached element at {} but found a {} node. Skipping.", path, kind);
				return Ok(());
			}
		};

		// Removals go first, so that aliases (`class` and `className`) can't undo a set.
		for name in delta.remove {
			if props::is_reserved(&name) {
				continue;
			}
			let previous = element.props.remove(&name);
			props::apply(&mut self.target, &handle, &name, previous.as_ref(), None)?;
		}
		for (name, value) in delta.set {
			if props::is_reserved(&name) {
				continue;
			}
			props::apply(&mut self.target, &handle, &name, element.props.get(&name), Some(&value))?;
			element.props.insert(name, value);
		}
		Ok(())
	}

	fn set_text(&mut self, live: &mut Option<VNode<T::Handle>>, path: &NodePath, text: String) -> Result<(), Error> {
		let span = trace_span!("Setting text", %path, text = crate::redact(&text));
		let _enter = span.enter();

		let node = match node_at_mut(live.as_mut(), path.indices()) {
			Some(node) => node,
			None => {
				warn!("Malformed TEXT: No live node at {}. Skipping.", path);
				return Ok(());
			}
		};
		let handle = match node.target().cloned() {
			Some(handle) => handle,
			None => {
				warn!("Malformed TEXT: The live node at {} is not attached. Skipping.", path);
				return Ok(());
			}
		};
		let kind = node.kind_name();
		match &mut node.kind {
			Kind::Text(data) => {
				self.target.set_text(&handle, &text)?;
				*data = text;
			}
			_ => warn!("Malformed TEXT: Expected a text node at {} but found a {} node. Skipping.", path, kind),
		}
		Ok(())
	}

	fn reorder(&mut self, live: &mut Option<VNode<T::Handle>>, parent: &NodePath, index: usize, new_index: usize) -> Result<(), Error> {
		let span = trace_span!("Reordering", %parent, index, new_index);
		let _enter = span.enter();

		let root = match live.as_ref() {
			Some(root) => root,
			None => {
				warn!("Malformed REORDER: Nothing is mounted. Skipping.");
				return Ok(());
			}
		};
		let (slot, len) = match (child_slot(&self.container, root, parent.indices()), node_at(Some(root), parent.indices()).and_then(VNode::children)) {
			(Some(slot), Some(children)) if index < children.len() => (slot, children.len()),
			_ => {
				warn!("Malformed REORDER: No live child {} of {}. Skipping.", index, parent);
				return Ok(());
			}
		};
		let new_index = if new_index >= len {
			trace!("Moving to the end instead of out-of-range index {}.", new_index);
			len - 1
		} else {
			new_index
		};
		if new_index == index {
			return Ok(());
		}

		let handles = {
			let children = match node_at_mut(live.as_mut(), parent.indices()).and_then(VNode::children_mut) {
				Some(children) => children,
				None => return Ok(()),
			};
			let moved = children.remove(index);
			let handles = moved.targets();
			children.insert(new_index, moved);
			handles
		};
		let reference = live.as_ref().and_then(|root| reference_at(root, parent.indices(), new_index + 1));
		for handle in &handles {
			self.target.insert_before(&slot.container, handle, reference.as_ref())?;
		}
		Ok(())
	}

	/// Materializes a description, cleaning up its effects if that fails.
	fn materialize(&mut self, node: &mut VNode<T::Handle>, slot: &Slot<T::Handle>) -> Result<Vec<T::Handle>, Error> {
		match self.materializer.materialize(&mut self.target, node, &slot.container, slot.namespace) {
			Ok(handles) => Ok(handles),
			Err(error) => {
				node.teardown();
				Err(error)
			}
		}
	}

	/// Inserts the freshly materialized `handles` of `node`.
	///
	/// If the target rejects one, those inserted before it are detached again and `node` is torn down.
	fn insert(&mut self, node: &mut VNode<T::Handle>, handles: &[T::Handle], container: &T::Handle, reference: Option<&T::Handle>) -> Result<(), Error> {
		for (i, handle) in handles.iter().enumerate() {
			if let Err(error) = self.target.insert_before(container, handle, reference) {
				for inserted in &handles[..i] {
					if let Err(error) = self.target.detach(inserted) {
						warn!("Failed to detach a partially inserted node: {}", error);
					}
				}
				node.teardown();
				return Err(error);
			}
		}
		Ok(())
	}

	/// Detaches all target nodes `node` contributes to its container.
	fn detach(&mut self, node: &VNode<T::Handle>) -> Result<(), Error> {
		for handle in node.targets() {
			if !self.target.detach(&handle)? {
				trace!("Target node was already detached.");
			}
		}
		Ok(())
	}
}

fn node_at<'a, H>(root: Option<&'a VNode<H>>, path: &[usize]) -> Option<&'a VNode<H>> {
	let mut node = root?;
	for &i in path {
		node = node.children()?.get(i)?;
	}
	Some(node)
}

fn node_at_mut<'a, H>(root: Option<&'a mut VNode<H>>, path: &[usize]) -> Option<&'a mut VNode<H>> {
	let mut node = root?;
	for &i in path {
		node = node.children_mut()?.get_mut(i)?;
	}
	Some(node)
}

/// Moves the description at `path` out of the next tree, leaving a vacated placeholder.
fn take_description<H>(next: &mut Option<VNode<H>>, path: &[usize]) -> Option<VNode<H>> {
	if path.is_empty() {
		return next.take();
	}
	node_at_mut(next.as_mut(), path).map(|node| mem::replace(node, VNode::vacated()))
}

/// Where the children of the live node at `parent` go: The nearest element at or above it, else the mount container.
fn child_slot<H: Clone>(container: &H, root: &VNode<H>, parent: &[usize]) -> Option<Slot<H>> {
	let mut slot = Slot {
		container: container.clone(),
		namespace: None,
	};
	let mut node = root;
	let mut rest = parent;
	loop {
		if let Kind::Element(element) = &node.kind {
			let namespace = crate::namespace::of_element(&element.tag, slot.namespace);
			slot = Slot {
				container: node.target()?.clone(),
				namespace: crate::namespace::of_children(&element.tag, namespace),
			};
		}
		match rest.split_first() {
			None => return Some(slot),
			Some((&i, tail)) => {
				node = node.children()?.get(i)?;
				rest = tail;
			}
		}
	}
}

/// The first target node at or after child `index` of the live node at `parent`, in document order.
///
/// Looks past the end of fragments into their following siblings. `None` means "append".
fn reference_at<H: Clone>(root: &VNode<H>, parent: &[usize], index: usize) -> Option<H> {
	let node = node_at(Some(root), parent)?;
	if let Some(handle) = node.children()?.iter().skip(index).find_map(VNode::first_target) {
		return Some(handle);
	}
	match (&node.kind, parent.split_last()) {
		(Kind::Fragment(_), Some((&i, grandparent))) => reference_at(root, grandparent, i + 1),
		_ => None,
	}
}

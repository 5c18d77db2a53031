//! Keeps the current tree between render cycles.

use crate::{
	apply::Patcher,
	diff::{diff_with_options, DiffOptions},
	patch::batch_patches,
	target::{Builder, Materializer, RenderTarget},
	vnode::VNode,
	Error,
};
use tracing::{debug, instrument, warn};

/// Owns a [`Patcher`] and the tree it last rendered, and runs the whole [diff](`crate::diff()`) → [`batch_patches`] → patch cycle per render.
#[derive(Debug)]
pub struct Reconciler<T: RenderTarget, M = Builder> {
	patcher: Patcher<T, M>,
	current: Option<VNode<T::Handle>>,
	options: DiffOptions,
}

impl<T: RenderTarget> Reconciler<T> {
	/// Creates a reconciler for an empty `container`.
	#[must_use]
	pub fn new(target: T, container: T::Handle) -> Self {
		Self::with_patcher(Patcher::new_for_container(target, container))
	}
}

impl<T: RenderTarget, M: Materializer<T>> Reconciler<T, M> {
	#[must_use]
	pub fn with_patcher(patcher: Patcher<T, M>) -> Self {
		Self {
			patcher,
			current: None,
			options: DiffOptions::default(),
		}
	}

	#[must_use]
	pub fn with_options(self, options: DiffOptions) -> Self {
		Self { options, ..self }
	}

	/// Adopts an attached tree that is already mounted in the container (see [`load`](`crate::load`)), replacing the current one.
	///
	/// The previous tree is left in the target as-is, but its effects are cleaned up.
	pub fn hydrate(&mut self, tree: Option<VNode<T::Handle>>) {
		if let Some(tree) = &tree {
			if !tree.is_attached() {
				warn!("Hydrating with a detached tree. The next render will treat its nodes as missing.");
			}
		}
		if let Some(mut previous) = std::mem::replace(&mut self.current, tree) {
			previous.cleanup_effects()
		}
	}

	/// Renders `next` (or unmounts for `None`) and returns the number of patches applied.
	///
	/// # Errors
	///
	/// Iff the render target rejects a mutation.
	/// The current tree then reflects the patches applied before the failing one, so later renders converge from there.
	#[instrument(skip(self, next))]
	pub fn render(&mut self, next: Option<VNode<T::Handle>>) -> Result<usize, Error> {
		let patches = batch_patches(diff_with_options(self.current.as_ref(), next.as_ref(), self.options));
		let count = patches.len();
		self.patcher.patch_in_place(&mut self.current, next, patches)?;
		debug!("Rendered with {} patch(es).", count);
		Ok(count)
	}

	/// Removes the current tree from the container and cleans up all its effects.
	///
	/// # Errors
	///
	/// Iff the render target rejects the removal.
	pub fn unmount(&mut self) -> Result<(), Error> {
		self.render(None).map(drop)
	}

	#[must_use]
	pub fn current(&self) -> Option<&VNode<T::Handle>> {
		self.current.as_ref()
	}

	#[must_use]
	pub fn patcher(&self) -> &Patcher<T, M> {
		&self.patcher
	}

	#[must_use]
	pub fn target(&self) -> &T {
		self.patcher.target()
	}

	pub fn target_mut(&mut self) -> &mut T {
		self.patcher.target_mut()
	}

	/// Splits this reconciler into its patcher and current tree without touching the target.
	#[must_use]
	pub fn into_parts(self) -> (Patcher<T, M>, Option<VNode<T::Handle>>) {
		(self.patcher, self.current)
	}
}

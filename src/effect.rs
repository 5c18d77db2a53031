//! The cleanup contract for side effects attached to [`VNode`](`crate::VNode`)s.

use core::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, trace};

/// A side effect owned by a [`VNode`](`crate::VNode`).
///
/// [`cleanup`](`Effect::cleanup`) runs exactly once, when the owning node leaves the live tree.
/// Consuming `self` makes a second call impossible.
///
/// Any `FnOnce()` closure is an [`Effect`].
pub trait Effect {
	fn cleanup(self: Box<Self>);
}
impl<F: FnOnce()> Effect for F {
	fn cleanup(self: Box<Self>) {
		self()
	}
}

/// Runs all cleanups in order.
///
/// A panicking cleanup is logged and doesn't prevent the remaining ones from running.
pub(crate) fn run_cleanups(effects: Vec<Box<dyn Effect>>) {
	if effects.is_empty() {
		return;
	}
	trace!("Cleaning up {} effect(s).", effects.len());
	for (index, effect) in effects.into_iter().enumerate() {
		if let Err(panic) = catch_unwind(AssertUnwindSafe(move || effect.cleanup())) {
			error!(index, "Effect cleanup panicked: {}. Continuing with the remaining effects.", panic_message(&*panic));
		}
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
	if let Some(message) = panic.downcast_ref::<&str>() {
		message
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message
	} else {
		"<non-string panic payload>"
	}
}

#![doc(html_root_url = "https://docs.rs/vnode-patch/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Diffs two [`VNode`] trees into a list of [`Patch`]es and applies them to a live [`RenderTarget`].
//!
//! A render cycle is [`diff`] → [`batch_patches`] → [`Patcher::patch`].
//! [`Reconciler`] wraps that cycle and keeps the current tree between calls.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod apply;
pub mod diff;
pub mod dom;
pub mod effect;
mod error;
pub mod event;
pub mod load;
pub mod memory;
pub mod namespace;
pub mod patch;
pub mod props;
pub mod reconciler;
pub mod target;
pub mod vnode;

pub use crate::{
	apply::Patcher,
	diff::{diff, diff_with_options, DiffOptions},
	effect::Effect,
	error::Error,
	event::{Event, Handler},
	patch::{batch_patches, NodePath, Patch, PropDelta},
	props::PropValue,
	reconciler::Reconciler,
	target::{Builder, Materializer, RenderTarget},
	vnode::{Element, Key, Kind, Props, VNode},
};

/// Text payloads and attribute values only reach log records with the `"dangerous-logging"` feature.
pub(crate) fn redact(text: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		text
	} else {
		"<redacted>"
	}
}

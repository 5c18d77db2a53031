use core::fmt::Debug;
use thiserror::Error;

/// Errors that propagate out of a patch run.
///
/// Inconsistent patches, duplicate keys and failing effect cleanups are not errors.
/// They are logged and recovered from in place.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// The render target rejected a mutation.
	#[error("render target rejected `{operation}`: {message}")]
	Target { operation: &'static str, message: String },
}

impl Error {
	pub(crate) fn target(operation: &'static str, cause: impl Debug) -> Self {
		Self::Target {
			operation,
			message: format!("{:?}", cause),
		}
	}

	pub(crate) fn rejected(operation: &'static str, message: impl Into<String>) -> Self {
		Self::Target {
			operation,
			message: message.into(),
		}
	}
}

//! Event handler props and the events passed to them.

use core::{any::Any, fmt};
use std::rc::Rc;

/// An event delivered to a [`Handler`].
///
/// Backends that wrap a platform event (like [`web_sys::Event`]) make it available through [`Event::raw`].
pub struct Event {
	name: String,
	raw: Option<Box<dyn Any>>,
}
impl Event {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), raw: None }
	}

	#[must_use]
	pub fn with_raw(name: impl Into<String>, raw: impl Any) -> Self {
		Self {
			name: name.into(),
			raw: Some(Box::new(raw)),
		}
	}

	/// The event name, without `on` prefix (`"click"`, not `"onClick"`).
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn raw<T: Any>(&self) -> Option<&T> {
		self.raw.as_ref()?.downcast_ref()
	}
}
impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event").field("name", &self.name).field("raw", &self.raw.is_some()).finish()
	}
}

/// A shared event handler closure.
///
/// Handlers compare by identity only: two handlers are equal iff they are clones of the same [`Handler::new`] result.
/// Recreating a closure during each render therefore always produces a prop change, which the patcher handles by swapping the listener.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);
impl Handler {
	pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &Event) {
		(self.0)(event)
	}

	fn address(&self) -> *const () {
		Rc::as_ptr(&self.0).cast::<()>()
	}
}
impl PartialEq for Handler {
	fn eq(&self, other: &Self) -> bool {
		self.address() == other.address()
	}
}
impl fmt::Debug for Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Handler({:p})", self.address())
	}
}

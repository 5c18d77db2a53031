//! Prop values and how each kind of prop is applied to a render target.

use crate::{event::Handler, namespace, redact, target::RenderTarget, Error};
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Structural prop names. These are never applied to a target.
pub const RESERVED: [&str; 3] = ["key", "children", "ref"];

#[must_use]
pub fn is_reserved(name: &str) -> bool {
	RESERVED.contains(&name)
}

/// A dynamically shaped prop value.
///
/// `NaN` numbers compare equal to each other, so that an unchanged `NaN` prop isn't re-applied.
#[derive(Clone, Debug)]
pub enum PropValue {
	Text(String),
	Number(f64),
	Bool(bool),
	/// Space-joined when applied. `None` and empty entries are skipped.
	List(Vec<Option<String>>),
	/// Names whose flag is `true` are space-joined in insertion order when applied.
	Toggles(Vec<(String, bool)>),
	/// Inline style properties, applied one by one.
	Style(BTreeMap<String, String>),
	Handler(Handler),
}

impl PartialEq for PropValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(PropValue::Text(a), PropValue::Text(b)) => a == b,
			#[allow(clippy::float_cmp)]
			(PropValue::Number(a), PropValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
			(PropValue::Bool(a), PropValue::Bool(b)) => a == b,
			(PropValue::List(a), PropValue::List(b)) => a == b,
			(PropValue::Toggles(a), PropValue::Toggles(b)) => a == b,
			(PropValue::Style(a), PropValue::Style(b)) => a == b,
			(PropValue::Handler(a), PropValue::Handler(b)) => a == b,
			_ => false,
		}
	}
}

impl PropValue {
	#[must_use]
	pub fn list<S: Into<String>>(items: impl IntoIterator<Item = Option<S>>) -> Self {
		PropValue::List(items.into_iter().map(|item| item.map(Into::into)).collect())
	}

	#[must_use]
	pub fn toggles<S: Into<String>>(toggles: impl IntoIterator<Item = (S, bool)>) -> Self {
		PropValue::Toggles(toggles.into_iter().map(|(name, on)| (name.into(), on)).collect())
	}

	#[must_use]
	pub fn style<K: Into<String>, V: Into<String>>(properties: impl IntoIterator<Item = (K, V)>) -> Self {
		PropValue::Style(properties.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	pub fn handler(handler: impl Fn(&crate::Event) + 'static) -> Self {
		PropValue::Handler(Handler::new(handler))
	}

	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			PropValue::Text(text) => !text.is_empty(),
			PropValue::Number(number) => *number != 0.0 && !number.is_nan(),
			PropValue::Bool(bool) => *bool,
			PropValue::List(items) => items.iter().any(|item| item.as_deref().map_or(false, |item| !item.is_empty())),
			PropValue::Toggles(toggles) => toggles.iter().any(|(_, on)| *on),
			PropValue::Style(properties) => !properties.is_empty(),
			PropValue::Handler(_) => true,
		}
	}
}

impl From<&str> for PropValue {
	fn from(text: &str) -> Self {
		PropValue::Text(text.to_owned())
	}
}
impl From<String> for PropValue {
	fn from(text: String) -> Self {
		PropValue::Text(text)
	}
}
impl From<bool> for PropValue {
	fn from(bool: bool) -> Self {
		PropValue::Bool(bool)
	}
}
impl From<f64> for PropValue {
	fn from(number: f64) -> Self {
		PropValue::Number(number)
	}
}
impl From<i32> for PropValue {
	fn from(number: i32) -> Self {
		PropValue::Number(number.into())
	}
}
impl From<u32> for PropValue {
	fn from(number: u32) -> Self {
		PropValue::Number(number.into())
	}
}
impl From<Handler> for PropValue {
	fn from(handler: Handler) -> Self {
		PropValue::Handler(handler)
	}
}

/// The attribute text for a value, or `None` if the attribute should be absent.
///
/// `true` is the empty (value-less) attribute, `false` is absence.
#[must_use]
pub fn stringify(value: &PropValue) -> Option<String> {
	match value {
		PropValue::Text(text) => Some(text.clone()),
		#[allow(clippy::cast_possible_truncation)]
		PropValue::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => Some(format!("{}", *number as i64)),
		PropValue::Number(number) => Some(number.to_string()),
		PropValue::Bool(true) => Some(String::new()),
		PropValue::Bool(false) => None,
		PropValue::List(_) | PropValue::Toggles(_) => Some(class_string(value).unwrap_or_default()),
		PropValue::Style(properties) => Some(style_string(properties)),
		PropValue::Handler(_) => None,
	}
}

/// Normalizes any of the accepted `class` shapes into a class attribute value.
#[must_use]
pub fn class_string(value: &PropValue) -> Option<String> {
	match value {
		PropValue::Text(text) => Some(text.clone()),
		PropValue::List(items) => Some(items.iter().flatten().filter(|item| !item.is_empty()).map(String::as_str).collect::<Vec<_>>().join(" ")),
		PropValue::Toggles(toggles) => Some(toggles.iter().filter(|(_, on)| *on).map(|(name, _)| name.as_str()).collect::<Vec<_>>().join(" ")),
		_ => None,
	}
}

fn style_string(properties: &BTreeMap<String, String>) -> String {
	properties.iter().map(|(property, value)| format!("{}: {};", property, value)).collect::<Vec<_>>().join(" ")
}

const BOOLEAN_ATTRIBUTES: &[&str] = &[
	"allowfullscreen",
	"async",
	"autofocus",
	"autoplay",
	"checked",
	"controls",
	"default",
	"defer",
	"disabled",
	"formnovalidate",
	"hidden",
	"inert",
	"ismap",
	"itemscope",
	"loop",
	"multiple",
	"muted",
	"nomodule",
	"novalidate",
	"open",
	"playsinline",
	"readonly",
	"required",
	"reversed",
	"selected",
];

const ENUMERATED_ATTRIBUTES: &[&str] = &["contenteditable", "draggable", "spellcheck"];

/// How a prop is applied to a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropKind {
	Class,
	Style,
	/// An `onX` prop, carrying the lowercase event name.
	Event(String),
	Boolean,
	Enumerated,
	Attribute { namespace: Option<&'static str> },
}

#[must_use]
pub fn classify(name: &str) -> PropKind {
	match name {
		"class" | "className" => PropKind::Class,
		"style" => PropKind::Style,
		_ if name.len() > 2 && name.starts_with("on") && name.as_bytes()[2].is_ascii_alphabetic() => PropKind::Event(name[2..].to_ascii_lowercase()),
		_ if BOOLEAN_ATTRIBUTES.contains(&name) => PropKind::Boolean,
		_ if ENUMERATED_ATTRIBUTES.contains(&name) || name.starts_with("aria-") => PropKind::Enumerated,
		_ => PropKind::Attribute {
			namespace: namespace::of_attribute(name),
		},
	}
}

/// Applies the transition of prop `name` from `previous` to `value` to `node`.
///
/// `value: None` removes the prop. `previous` is only consulted where a transition can't be expressed by the new value alone (style maps).
///
/// # Errors
///
/// Iff the render target rejects a mutation.
pub fn apply<T: RenderTarget + ?Sized>(target: &mut T, node: &T::Handle, name: &str, previous: Option<&PropValue>, value: Option<&PropValue>) -> Result<(), Error> {
	if is_reserved(name) {
		return Ok(());
	}
	trace!(prop = name, value =?value.map(|value| stringify(value).unwrap_or_default()).as_deref().map(redact), "Applying prop");

	match classify(name) {
		PropKind::Class => match value.and_then(class_string) {
			Some(class) if !class.is_empty() => target.set_attribute(node, None, "class", &class),
			Some(_) => target.remove_attribute(node, None, "class"),
			None => {
				if let Some(value) = value {
					warn!("Unsupported `class` value {:?}. Removing the attribute.", value);
				}
				target.remove_attribute(node, None, "class")
			}
		},

		PropKind::Style => apply_style(target, node, previous, value),

		PropKind::Event(event) => match value {
			Some(PropValue::Handler(handler)) => target.set_listener(node, &event, handler.clone()),
			Some(other) => {
				warn!("Event prop {:?} expects a handler but got {:?}. Detaching any listener instead.", name, other);
				target.remove_listener(node, &event)
			}
			None => target.remove_listener(node, &event),
		},

		PropKind::Boolean => {
			if value.map_or(false, PropValue::is_truthy) {
				target.set_attribute(node, None, name, "")
			} else {
				target.remove_attribute(node, None, name)
			}
		}

		PropKind::Enumerated => match value {
			Some(PropValue::Bool(bool)) => target.set_attribute(node, None, name, if *bool { "true" } else { "false" }),
			Some(value) => match stringify(value) {
				Some(text) => target.set_attribute(node, None, name, &text),
				None => target.remove_attribute(node, None, name),
			},
			None => target.remove_attribute(node, None, name),
		},

		PropKind::Attribute { namespace } => {
			if let Some(PropValue::Handler(_)) = value {
				warn!("Prop {:?} isn't an event prop but got a handler. Removing the attribute.", name);
			}
			match value.and_then(stringify) {
				Some(text) => target.set_attribute(node, namespace, name, &text),
				None => target.remove_attribute(node, namespace, name),
			}
		}
	}
}

fn apply_style<T: RenderTarget + ?Sized>(target: &mut T, node: &T::Handle, previous: Option<&PropValue>, value: Option<&PropValue>) -> Result<(), Error> {
	let previous_properties = match previous {
		Some(PropValue::Style(properties)) => Some(properties),
		_ => None,
	};

	match value {
		Some(PropValue::Style(properties)) => {
			if let Some(PropValue::Text(_)) = previous {
				target.remove_attribute(node, None, "style")?;
			}
			if let Some(previous_properties) = previous_properties {
				for stale in previous_properties.keys().filter(|property| !properties.contains_key(*property)) {
					target.remove_style(node, stale)?;
				}
			}
			for (property, text) in properties {
				if previous_properties.and_then(|previous| previous.get(property)) == Some(text) {
					continue;
				}
				if text.is_empty() {
					target.remove_style(node, property)?;
				} else {
					target.set_style(node, property, text)?;
				}
			}
			Ok(())
		}
		Some(PropValue::Text(text)) => target.set_attribute(node, None, "style", text),
		Some(other) => {
			warn!("Unsupported `style` value {:?}. Ignoring it.", other);
			Ok(())
		}
		None => match previous_properties {
			Some(previous_properties) => {
				for property in previous_properties.keys() {
					target.remove_style(node, property)?;
				}
				Ok(())
			}
			None => target.remove_attribute(node, None, "style"),
		},
	}
}

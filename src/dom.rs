//! The browser [`RenderTarget`], backed by [`web_sys`].

use crate::{
	event::{Event, Handler},
	load::{Inspect, Inspected},
	target::RenderTarget,
	Error,
};
use core::{cell::RefCell, fmt};
use hashbrown::HashMap;
use js_sys::Function;
use std::rc::Rc;
use tracing::trace;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{CharacterData, CssStyleDeclaration, Document, HtmlElement, SvgElement};

type Listener = Closure<dyn Fn(web_sys::Event)>;

/// A DOM node together with the listeners this crate attached to it.
///
/// Clones share the listener table, so a listener attached through one clone can be detached through another.
#[derive(Clone)]
pub struct DomHandle {
	node: web_sys::Node,
	listeners: Rc<RefCell<HashMap<String, Listener>>>,
}

impl DomHandle {
	#[must_use]
	pub fn node(&self) -> &web_sys::Node {
		&self.node
	}
}

impl From<web_sys::Node> for DomHandle {
	fn from(node: web_sys::Node) -> Self {
		Self {
			node,
			listeners: Rc::default(),
		}
	}
}

impl fmt::Debug for DomHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DomHandle")
			.field("node", &self.node.node_name())
			.field("listeners", &self.listeners.borrow().len())
			.finish()
	}
}

/// Renders into a [`Document`].
#[derive(Debug, Clone)]
pub struct DomTarget {
	document: Document,
}

impl DomTarget {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self { document }
	}

	/// Renders into the global `window.document`.
	///
	/// # Errors
	///
	/// Iff there is no global document (outside a browser main thread, for example).
	pub fn from_window() -> Result<Self, Error> {
		web_sys::window()
			.and_then(|window| window.document())
			.map(Self::new)
			.ok_or_else(|| Error::rejected("from_window", "no global document"))
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn element<'a>(node: &'a DomHandle, operation: &'static str) -> Result<&'a web_sys::Element, Error> {
	node.node.dyn_ref().ok_or_else(|| Error::rejected(operation, "not an element"))
}

fn style(node: &DomHandle, operation: &'static str) -> Result<CssStyleDeclaration, Error> {
	if let Some(html_element) = node.node.dyn_ref::<HtmlElement>() {
		Ok(html_element.style())
	} else if let Some(svg_element) = node.node.dyn_ref::<SvgElement>() {
		Ok(svg_element.style())
	} else {
		Err(Error::rejected(operation, "node has no inline style"))
	}
}

fn local_name<'a>(namespace: Option<&str>, name: &'a str) -> &'a str {
	match namespace {
		Some(_) => name.rsplit(':').next().unwrap_or(name),
		None => name,
	}
}

impl RenderTarget for DomTarget {
	type Handle = DomHandle;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Result<DomHandle, Error> {
		let element = match namespace {
			Some(namespace) => self.document.create_element_ns(Some(namespace), tag),
			None => self.document.create_element(tag),
		}
		.map_err(|error| Error::target("create_element", error))?;
		Ok(web_sys::Node::from(element).into())
	}

	fn create_text(&mut self, text: &str) -> Result<DomHandle, Error> {
		Ok(web_sys::Node::from(self.document.create_text_node(text)).into())
	}

	fn set_text(&mut self, node: &DomHandle, text: &str) -> Result<(), Error> {
		node.node
			.dyn_ref::<CharacterData>()
			.ok_or_else(|| Error::rejected("set_text", "not a text node"))?
			.set_data(text);
		Ok(())
	}

	fn insert_before(&mut self, parent: &DomHandle, child: &DomHandle, reference: Option<&DomHandle>) -> Result<(), Error> {
		parent
			.node
			.insert_before(&child.node, reference.map(|reference| &reference.node))
			.map(drop)
			.map_err(|error| Error::target("insert_before", error))
	}

	fn detach(&mut self, node: &DomHandle) -> Result<bool, Error> {
		match node.node.parent_node() {
			Some(parent) => parent.remove_child(&node.node).map(|_| true).map_err(|error| Error::target("detach", error)),
			None => Ok(false),
		}
	}

	fn set_attribute(&mut self, node: &DomHandle, namespace: Option<&str>, name: &str, value: &str) -> Result<(), Error> {
		let element = element(node, "set_attribute")?;
		match namespace {
			Some(_) => element.set_attribute_ns(namespace, name, value),
			None => element.set_attribute(name, value),
		}
		.map_err(|error| Error::target("set_attribute", error))
	}

	fn remove_attribute(&mut self, node: &DomHandle, namespace: Option<&str>, name: &str) -> Result<(), Error> {
		let element = element(node, "remove_attribute")?;
		match namespace {
			Some(_) => element.remove_attribute_ns(namespace, local_name(namespace, name)),
			None => element.remove_attribute(name),
		}
		.map_err(|error| Error::target("remove_attribute", error))
	}

	fn set_style(&mut self, node: &DomHandle, property: &str, value: &str) -> Result<(), Error> {
		style(node, "set_style")?
			.set_property(property, value)
			.map_err(|error| Error::target("set_style", error))
	}

	fn remove_style(&mut self, node: &DomHandle, property: &str) -> Result<(), Error> {
		style(node, "remove_style")?
			.remove_property(property)
			.map(drop)
			.map_err(|error| Error::target("remove_style", error))
	}

	fn set_listener(&mut self, node: &DomHandle, event: &str, handler: Handler) -> Result<(), Error> {
		self.remove_listener(node, event)?;

		let name = event.to_owned();
		let listener = Closure::wrap(Box::new(move |event: web_sys::Event| handler.call(&Event::with_raw(name.as_str(), event))) as Box<dyn Fn(web_sys::Event)>);
		node.node
			.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref::<Function>())
			.map_err(|error| Error::target("set_listener", error))?;
		trace!("Attached {:?} listener.", event);
		node.listeners.borrow_mut().insert(event.to_owned(), listener);
		Ok(())
	}

	fn remove_listener(&mut self, node: &DomHandle, event: &str) -> Result<(), Error> {
		let listener = match node.listeners.borrow_mut().remove(event) {
			Some(listener) => listener,
			None => return Ok(()),
		};
		node.node
			.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref::<Function>())
			.map_err(|error| Error::target("remove_listener", error))?;
		trace!("Detached {:?} listener.", event);
		Ok(())
	}
}

impl Inspect for DomTarget {
	fn inspect(&self, node: &DomHandle) -> Option<Inspected> {
		if let Some(element) = node.node.dyn_ref::<web_sys::Element>() {
			let attributes = element.attributes();
			Some(Inspected::Element {
				tag: element.local_name(),
				attributes: (0..attributes.length())
					.filter_map(|i| attributes.item(i))
					.map(|attribute| (attribute.name(), attribute.value()))
					.collect(),
			})
		} else if let Some(text) = node.node.dyn_ref::<web_sys::Text>() {
			Some(Inspected::Text(text.data()))
		} else {
			None
		}
	}

	fn child_handles(&self, node: &DomHandle) -> Vec<DomHandle> {
		let child_nodes = node.node.child_nodes();
		(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).map(DomHandle::from).collect()
	}
}

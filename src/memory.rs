//! An in-memory [`RenderTarget`], for headless rendering and tests.

use crate::{
	event::{Event, Handler},
	load::{Inspect, Inspected},
	target::RenderTarget,
	Error,
};
use core::{cell::RefCell, fmt};
use hashbrown::HashMap;
use std::{
	collections::BTreeMap,
	rc::{Rc, Weak},
};
use tracing::trace;

/// A handle to a node of a [`MemoryTarget`] tree.
///
/// Clones refer to the same node. Parents own their children; the parent link is weak.
#[derive(Clone)]
pub struct MemoryNode(Rc<RefCell<NodeData>>);

struct NodeData {
	content: Content,
	parent: Weak<RefCell<NodeData>>,
	children: Vec<MemoryNode>,
}

enum Content {
	Element {
		tag: String,
		namespace: Option<String>,
		attributes: BTreeMap<String, (Option<String>, String)>,
		style: BTreeMap<String, String>,
		listeners: HashMap<String, Handler>,
	},
	Text(String),
}

impl MemoryNode {
	fn new(content: Content) -> Self {
		Self(Rc::new(RefCell::new(NodeData {
			content,
			parent: Weak::new(),
			children: Vec::new(),
		})))
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &MemoryNode) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	#[must_use]
	pub fn tag(&self) -> Option<String> {
		match &self.0.borrow().content {
			Content::Element { tag, .. } => Some(tag.clone()),
			Content::Text(_) => None,
		}
	}

	#[must_use]
	pub fn namespace(&self) -> Option<String> {
		match &self.0.borrow().content {
			Content::Element { namespace, .. } => namespace.clone(),
			Content::Text(_) => None,
		}
	}

	/// The character data of a text node.
	#[must_use]
	pub fn data(&self) -> Option<String> {
		match &self.0.borrow().content {
			Content::Text(text) => Some(text.clone()),
			Content::Element { .. } => None,
		}
	}

	/// The concatenated character data of all descendant text nodes.
	#[must_use]
	pub fn text_content(&self) -> String {
		let data = self.0.borrow();
		match &data.content {
			Content::Text(text) => text.clone(),
			Content::Element { .. } => data.children.iter().map(MemoryNode::text_content).collect(),
		}
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<String> {
		match &self.0.borrow().content {
			Content::Element { attributes, style, .. } => match attributes.get(name) {
				Some((_, value)) => Some(value.clone()),
				None if name == "style" && !style.is_empty() => Some(style_attribute(style)),
				None => None,
			},
			Content::Text(_) => None,
		}
	}

	#[must_use]
	pub fn attribute_namespace(&self, name: &str) -> Option<String> {
		match &self.0.borrow().content {
			Content::Element { attributes, .. } => attributes.get(name).and_then(|(namespace, _)| namespace.clone()),
			Content::Text(_) => None,
		}
	}

	/// Attribute names in lexicographic order, including `style` if any inline style is set.
	#[must_use]
	pub fn attribute_names(&self) -> Vec<String> {
		match &self.0.borrow().content {
			Content::Element { attributes, style, .. } => {
				let mut names: Vec<String> = attributes.keys().cloned().collect();
				if !style.is_empty() {
					names.push("style".to_owned());
					names.sort();
				}
				names
			}
			Content::Text(_) => Vec::new(),
		}
	}

	#[must_use]
	pub fn style(&self, property: &str) -> Option<String> {
		match &self.0.borrow().content {
			Content::Element { style, .. } => style.get(property).cloned(),
			Content::Text(_) => None,
		}
	}

	#[must_use]
	pub fn children(&self) -> Vec<MemoryNode> {
		self.0.borrow().children.clone()
	}

	#[must_use]
	pub fn child_count(&self) -> usize {
		self.0.borrow().children.len()
	}

	#[must_use]
	pub fn parent(&self) -> Option<MemoryNode> {
		self.0.borrow().parent.upgrade().map(MemoryNode)
	}

	#[must_use]
	pub fn has_listener(&self, event: &str) -> bool {
		match &self.0.borrow().content {
			Content::Element { listeners, .. } => listeners.contains_key(event),
			Content::Text(_) => false,
		}
	}

	/// Calls the listener for `event` (without bubbling). Returns whether there was one.
	pub fn dispatch(&self, event: &str) -> bool {
		let handler = match &self.0.borrow().content {
			Content::Element { listeners, .. } => listeners.get(event).cloned(),
			Content::Text(_) => None,
		};
		match handler {
			Some(handler) => {
				handler.call(&Event::new(event));
				true
			}
			None => false,
		}
	}

	/// Serializes this node and its descendants. Attributes are sorted by name.
	#[must_use]
	pub fn to_html(&self) -> String {
		let mut html = String::new();
		self.write_html(&mut html);
		html
	}

	fn write_html(&self, html: &mut String) {
		let data = self.0.borrow();
		match &data.content {
			Content::Text(text) => html.push_str(&escape(text, false)),
			Content::Element { tag, attributes, style, .. } => {
				html.push('<');
				html.push_str(tag);
				let mut rendered: Vec<(&str, String)> = attributes.iter().map(|(name, (_, value))| (name.as_str(), value.clone())).collect();
				if !style.is_empty() && !attributes.contains_key("style") {
					rendered.push(("style", style_attribute(style)));
					rendered.sort();
				}
				for (name, value) in rendered {
					html.push(' ');
					html.push_str(name);
					if !value.is_empty() {
						html.push_str("=\"");
						html.push_str(&escape(&value, true));
						html.push('"');
					}
				}
				html.push('>');
				for child in &data.children {
					child.write_html(html)
				}
				html.push_str("</");
				html.push_str(tag);
				html.push('>');
			}
		}
	}

	fn is_inclusive_ancestor_of(&self, other: &MemoryNode) -> bool {
		let mut current = Some(other.clone());
		while let Some(node) = current {
			if node.ptr_eq(self) {
				return true;
			}
			current = node.parent();
		}
		false
	}

	fn unlink(&self) -> bool {
		let parent = match self.parent() {
			Some(parent) => parent,
			None => return false,
		};
		parent.0.borrow_mut().children.retain(|child| !child.ptr_eq(self));
		self.0.borrow_mut().parent = Weak::new();
		true
	}
}

impl fmt::Debug for MemoryNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.0.borrow().content {
			Content::Element { tag, .. } => write!(f, "<{}>", tag),
			Content::Text(text) => write!(f, "{:?}", crate::redact(text)),
		}
	}
}

fn style_attribute(style: &BTreeMap<String, String>) -> String {
	style.iter().map(|(property, value)| format!("{}: {};", property, value)).collect::<Vec<_>>().join(" ")
}

fn escape(text: &str, attribute: bool) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' if attribute => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

/// An in-memory DOM-like tree.
///
/// Nodes live as long as a [`MemoryNode`] handle (or a parent) refers to them; the target itself only counts creations.
#[derive(Debug, Default)]
pub struct MemoryTarget {
	created: usize,
}

impl MemoryTarget {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached element to mount trees into. Not counted by [`MemoryTarget::created`].
	#[must_use]
	pub fn container(&self, tag: &str) -> MemoryNode {
		MemoryNode::new(element_content(tag, None))
	}

	/// Number of nodes created through [`RenderTarget`] methods so far.
	#[must_use]
	pub fn created(&self) -> usize {
		self.created
	}
}

fn element_content(tag: &str, namespace: Option<&str>) -> Content {
	Content::Element {
		tag: tag.to_owned(),
		namespace: namespace.map(ToOwned::to_owned),
		attributes: BTreeMap::new(),
		style: BTreeMap::new(),
		listeners: HashMap::new(),
	}
}

/// Runs `f` on the element parts of `node`, or fails `operation` for text nodes.
fn with_element<R>(
	node: &MemoryNode,
	operation: &'static str,
	f: impl FnOnce(&mut BTreeMap<String, (Option<String>, String)>, &mut BTreeMap<String, String>, &mut HashMap<String, Handler>) -> R,
) -> Result<R, Error> {
	match &mut node.0.borrow_mut().content {
		Content::Element { attributes, style, listeners, .. } => Ok(f(attributes, style, listeners)),
		Content::Text(_) => Err(Error::rejected(operation, "not an element")),
	}
}

impl RenderTarget for MemoryTarget {
	type Handle = MemoryNode;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Result<MemoryNode, Error> {
		if tag.is_empty() || tag.contains(|c: char| c.is_whitespace() || c == '<' || c == '>') {
			return Err(Error::rejected("create_element", format!("invalid tag name {:?}", tag)));
		}
		self.created += 1;
		Ok(MemoryNode::new(element_content(tag, namespace)))
	}

	fn create_text(&mut self, text: &str) -> Result<MemoryNode, Error> {
		self.created += 1;
		Ok(MemoryNode::new(Content::Text(text.to_owned())))
	}

	fn set_text(&mut self, node: &MemoryNode, text: &str) -> Result<(), Error> {
		match &mut node.0.borrow_mut().content {
			Content::Text(data) => {
				*data = text.to_owned();
				Ok(())
			}
			Content::Element { .. } => Err(Error::rejected("set_text", "not a text node")),
		}
	}

	fn insert_before(&mut self, parent: &MemoryNode, child: &MemoryNode, reference: Option<&MemoryNode>) -> Result<(), Error> {
		if parent.tag().is_none() {
			return Err(Error::rejected("insert_before", "parent is not an element"));
		}
		if child.is_inclusive_ancestor_of(parent) {
			return Err(Error::rejected("insert_before", "insertion would create a cycle"));
		}
		if let Some(reference) = reference {
			if reference.ptr_eq(child) {
				return Ok(());
			}
			if !reference.parent().map_or(false, |reference_parent| reference_parent.ptr_eq(parent)) {
				return Err(Error::rejected("insert_before", "reference is not a child of parent"));
			}
		}

		if child.unlink() {
			trace!("Moving attached node {:?}.", child);
		}
		let mut parent_data = parent.0.borrow_mut();
		let position = match reference {
			Some(reference) => parent_data.children.iter().position(|sibling| sibling.ptr_eq(reference)).unwrap_or(parent_data.children.len()),
			None => parent_data.children.len(),
		};
		parent_data.children.insert(position, child.clone());
		child.0.borrow_mut().parent = Rc::downgrade(&parent.0);
		Ok(())
	}

	fn detach(&mut self, node: &MemoryNode) -> Result<bool, Error> {
		Ok(node.unlink())
	}

	fn set_attribute(&mut self, node: &MemoryNode, namespace: Option<&str>, name: &str, value: &str) -> Result<(), Error> {
		if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == '=' || c == '"') {
			return Err(Error::rejected("set_attribute", format!("invalid attribute name {:?}", name)));
		}
		with_element(node, "set_attribute", |attributes, style, _| {
			if name == "style" && namespace.is_none() {
				*style = parse_style(value);
			} else {
				attributes.insert(name.to_owned(), (namespace.map(ToOwned::to_owned), value.to_owned()));
			}
		})
	}

	fn remove_attribute(&mut self, node: &MemoryNode, namespace: Option<&str>, name: &str) -> Result<(), Error> {
		with_element(node, "remove_attribute", |attributes, style, _| {
			if name == "style" && namespace.is_none() {
				style.clear();
			}
			attributes.remove(name);
		})
	}

	fn set_style(&mut self, node: &MemoryNode, property: &str, value: &str) -> Result<(), Error> {
		with_element(node, "set_style", |_, style, _| {
			style.insert(property.to_owned(), value.to_owned());
		})
	}

	fn remove_style(&mut self, node: &MemoryNode, property: &str) -> Result<(), Error> {
		with_element(node, "remove_style", |_, style, _| {
			style.remove(property);
		})
	}

	fn set_listener(&mut self, node: &MemoryNode, event: &str, handler: Handler) -> Result<(), Error> {
		with_element(node, "set_listener", |_, _, listeners| {
			listeners.insert(event.to_owned(), handler);
		})
	}

	fn remove_listener(&mut self, node: &MemoryNode, event: &str) -> Result<(), Error> {
		with_element(node, "remove_listener", |_, _, listeners| {
			listeners.remove(event);
		})
	}
}

fn parse_style(text: &str) -> BTreeMap<String, String> {
	text.split(';')
		.filter_map(|declaration| {
			let (property, value) = declaration.split_once(':')?;
			let (property, value) = (property.trim(), value.trim());
			if property.is_empty() || value.is_empty() {
				None
			} else {
				Some((property.to_owned(), value.to_owned()))
			}
		})
		.collect()
}

impl Inspect for MemoryTarget {
	fn inspect(&self, node: &MemoryNode) -> Option<Inspected> {
		Some(match node.tag() {
			Some(tag) => Inspected::Element {
				attributes: node.attribute_names().into_iter().filter_map(|name| Some((name.clone(), node.attribute(&name)?))).collect(),
				tag,
			},
			None => Inspected::Text(node.data()?),
		})
	}

	fn child_handles(&self, node: &MemoryNode) -> Vec<MemoryNode> {
		node.children()
	}
}

//! Element and attribute namespaces.

pub const SVG: &str = "http://www.w3.org/2000/svg";
pub const MATH_ML: &str = "http://www.w3.org/1998/Math/MathML";
pub const XLINK: &str = "http://www.w3.org/1999/xlink";
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";

/// The namespace an element with `tag` is created in, given the namespace its parent's children are created in.
#[must_use]
pub fn of_element(tag: &str, inherited: Option<&'static str>) -> Option<&'static str> {
	match tag {
		"svg" => Some(SVG),
		"math" => Some(MATH_ML),
		_ => inherited,
	}
}

/// The namespace the children of an element with `tag` in `namespace` are created in.
#[must_use]
pub fn of_children(tag: &str, namespace: Option<&'static str>) -> Option<&'static str> {
	match (tag, namespace) {
		// HTML integration points.
		("foreignObject", Some(SVG)) | ("annotation-xml", Some(MATH_ML)) => None,
		_ => namespace,
	}
}

/// The namespace of a prefixed attribute name, like `xlink:href`.
#[must_use]
pub fn of_attribute(name: &str) -> Option<&'static str> {
	if name == "xmlns" || name.starts_with("xmlns:") {
		Some(XMLNS)
	} else if name.starts_with("xlink:") {
		Some(XLINK)
	} else if name.starts_with("xml:") {
		Some(XML)
	} else {
		None
	}
}

#![allow(dead_code)]

use std::{cell::Cell, rc::Rc};
use vnode_patch::{
	memory::{MemoryNode, MemoryTarget},
	Reconciler, VNode,
};

pub type Node = VNode<MemoryNode>;

/// Renders `tree` into a fresh `<body>` container.
pub fn mount(tree: Option<Node>) -> (Reconciler<MemoryTarget>, MemoryNode) {
	let target = MemoryTarget::new();
	let body = target.container("body");
	let mut reconciler = Reconciler::new(target, body.clone());
	reconciler.render(tree).unwrap();
	(reconciler, body)
}

pub fn inner_html(container: &MemoryNode) -> String {
	container.children().iter().map(MemoryNode::to_html).collect()
}

/// The markup `tree` produces when rendered from scratch.
pub fn fresh_html(tree: Node) -> String {
	inner_html(&mount(Some(tree)).1)
}

/// Counts effect cleanups.
#[derive(Clone, Default)]
pub struct Counter(Rc<Cell<usize>>);
impl Counter {
	pub fn effect(&self) -> impl FnOnce() + 'static {
		let count = Rc::clone(&self.0);
		move || count.set(count.get() + 1)
	}

	pub fn get(&self) -> usize {
		self.0.get()
	}
}

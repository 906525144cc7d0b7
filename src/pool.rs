//! slab-batched node arena
//!
//! Nodes are allocated in batches to amortize allocator traffic (spec.md
//! §4.4): rather than growing the backing [`Vec`] one element at a time,
//! capacity is reserved in chunks once exhausted. Handed-out [`NodeId`]s
//! are indices, so growing/reallocating the `Vec` never invalidates one -
//! unlike the reference's raw node pointers, nothing here needs to pin
//! memory in place.
//!
//! Nodes are never individually freed; the whole arena is dropped with the
//! tree.

use alloc::vec::Vec;

use crate::{
	codec::WORDS,
	node::{
		Node,
		NodeId,
	},
};

/// nodes are reserved in batches of this many at a time
const BATCH: usize = 20;

pub(crate) struct NodePool<T> {
	nodes: Vec<Node<T>>,
}

impl<T> NodePool<T> {
	pub(crate) const fn new() -> Self {
		Self { nodes: Vec::new() }
	}

	pub(crate) fn alloc(
		&mut self,
		bits: [u32; WORDS],
		prefixlen: u8,
		dummy: bool,
		data: Option<T>,
	) -> NodeId {
		if self.nodes.len() == self.nodes.capacity() {
			self.nodes.reserve(BATCH);
		}
		let id = NodeId(self.nodes.len() as u32);
		self.nodes.push(Node::new(bits, prefixlen, dummy, data));
		id
	}

	pub(crate) fn get(&self, id: NodeId) -> &Node<T> {
		&self.nodes[id.0 as usize]
	}

	pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<T> {
		&mut self.nodes[id.0 as usize]
	}

	pub(crate) fn len(&self) -> usize {
		self.nodes.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn handles_stay_valid_across_growth() {
		let mut pool: NodePool<u32> = NodePool::new();
		let mut ids = Vec::new();
		for i in 0..100u32 {
			ids.push(pool.alloc([0; WORDS], 0, false, Some(i)));
		}
		for (i, id) in ids.into_iter().enumerate() {
			assert_eq!(*pool.get(id).data().unwrap(), i as u32);
		}
		assert_eq!(pool.len(), 100);
	}
}

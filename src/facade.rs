//! fixed-width key shapes layered over the shared [`crate::tree::Tree`]
//!
//! §6 describes four facades over the same 160-bit core, differing only
//! in key width and the mask range they accept: a 4-byte IPv4 shape, a
//! 16-byte IPv6 shape, a 20-byte IPv6-plus-ASN shape that is the core
//! itself with no narrowing, and an 8-byte "exact" shape that always
//! operates at a fixed length of 64 bits.

use alloc::vec::Vec;

use crate::{
	node::NodeId,
	tree::Tree,
};

/// a durable handle to a node reached through [`Ipv4Trie::get_node`] and
/// friends. Opaque outside this crate; dereference it with the owning
/// trie's [`Ipv4Trie::node`] (or the equivalent on other facades).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeHandle(pub(crate) NodeId);

macro_rules! forwarding_facade {
	($name:ident, $maxlen:expr, $doc:expr) => {
		#[doc = $doc]
		pub struct $name<T> {
			tree: Tree<T>,
		}

		impl<T> Default for $name<T> {
			fn default() -> Self {
				Self::new()
			}
		}

		impl<T> $name<T> {
			/// a new, empty trie
			pub fn new() -> Self {
				Self { tree: Tree::new() }
			}

			/// install a trace sink on the underlying tree; see
			/// [`Tree::set_trace`]
			pub fn set_trace(&mut self, sink: Option<alloc::boxed::Box<dyn crate::trace::TraceSink>>) {
				self.tree.set_trace(sink);
			}

			/// whether the trie holds no entries
			pub fn is_empty(&self) -> bool {
				self.tree.is_empty()
			}

			fn check_mask(mask: u8) {
				assert!(
					mask as usize <= $maxlen,
					"mask {} exceeds this facade's maximum of {}",
					mask,
					$maxlen
				);
			}
		}

		impl<T: Clone> $name<T> {
			/// insert only if `(key, mask)` is absent; returns `(set, old_value)`
			pub fn append(&mut self, key: &[u8], mask: u8, value: T) -> (bool, Option<T>) {
				Self::check_mask(mask);
				self.tree.append(key, mask, value)
			}

			/// insert, overwriting any existing value at `(key, mask)`
			pub fn set(&mut self, key: &[u8], mask: u8, value: T) -> (bool, Option<T>) {
				Self::check_mask(mask);
				self.tree.set(key, mask, value)
			}

			/// longest-prefix-match lookup
			pub fn get(&mut self, key: &[u8], mask: u8) -> (bool, Vec<u8>, u8, Option<T>) {
				Self::check_mask(mask);
				self.tree.get(key, mask)
			}

			/// get-or-create, returning a durable handle to the node either
			/// way
			pub fn get_node(&mut self, key: &[u8], mask: u8) -> (bool, NodeHandle) {
				Self::check_mask(mask);
				let (was_new, id) = self.tree.get_or_create(key, mask);
				(was_new, NodeHandle(id))
			}

			/// remove the exact `(key, mask)` entry, if present (§4.5)
			pub fn delete(&mut self, key: &[u8], mask: u8) -> bool {
				Self::check_mask(mask);
				self.tree.delete(key, mask)
			}

			/// dereference a handle returned by `get_node`
			pub fn node(&self, handle: NodeHandle) -> &crate::node::Node<T> {
				self.tree.node(handle.0)
			}
		}
	};
}

forwarding_facade!(
	Ipv4Trie,
	32,
	"dotted-quad IPv4 keys: 4-byte addresses, masks of 0 to 32"
);
forwarding_facade!(
	Ipv6Trie,
	128,
	"16-byte IPv6 keys, masks of 0 to 128"
);
forwarding_facade!(
	Ipv6AsnTrie,
	160,
	"20-byte IPv6-plus-ASN keys (the full 160-bit core with no narrowing)"
);

/// fixed (IPv4, 32-bit word) key pairs, always stored and looked up at a
/// length of 64 bits - there is no shorter-prefix matching here, only
/// exact presence.
pub struct ExactTrie<T> {
	tree: Tree<T>,
}

/// bit width of an `ExactTrie` key: a 4-byte IPv4 address followed by a
/// 4-byte word.
const EXACT_LEN: u8 = 64;

impl<T> Default for ExactTrie<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> ExactTrie<T> {
	/// a new, empty trie
	pub fn new() -> Self {
		Self { tree: Tree::new() }
	}

	/// install a trace sink on the underlying tree; see [`Tree::set_trace`]
	pub fn set_trace(&mut self, sink: Option<alloc::boxed::Box<dyn crate::trace::TraceSink>>) {
		self.tree.set_trace(sink);
	}

	/// whether the trie holds no entries
	pub fn is_empty(&self) -> bool {
		self.tree.is_empty()
	}

	fn key(ip: [u8; 4], word: u32) -> Vec<u8> {
		let mut bytes = Vec::with_capacity(8);
		bytes.extend_from_slice(&ip);
		bytes.extend_from_slice(&word.to_be_bytes());
		bytes
	}

	/// dereference a handle returned by `get_node`
	pub fn node(&self, handle: NodeHandle) -> &crate::node::Node<T> {
		self.tree.node(handle.0)
	}
}

impl<T: Clone> ExactTrie<T> {
	/// insert only if `(ip, word)` is absent
	pub fn append(&mut self, ip: [u8; 4], word: u32, value: T) -> (bool, Option<T>) {
		self.tree.append(&Self::key(ip, word), EXACT_LEN, value)
	}

	/// insert, overwriting any existing value at `(ip, word)`
	pub fn set(&mut self, ip: [u8; 4], word: u32, value: T) -> (bool, Option<T>) {
		self.tree.set(&Self::key(ip, word), EXACT_LEN, value)
	}

	/// exact presence lookup; `exact` is false unless `(ip, word)` was
	/// inserted verbatim
	pub fn get(&mut self, ip: [u8; 4], word: u32) -> (bool, Option<T>) {
		let (exact, _bytes, _len, value) = self.tree.get(&Self::key(ip, word), EXACT_LEN);
		(exact, value)
	}

	/// remove the exact `(ip, word)` entry, if present
	pub fn delete(&mut self, ip: [u8; 4], word: u32) -> bool {
		self.tree.delete(&Self::key(ip, word), EXACT_LEN)
	}

	/// get-or-create, returning a durable handle to the node either way
	pub fn get_node(&mut self, ip: [u8; 4], word: u32) -> (bool, NodeHandle) {
		let (was_new, id) = self.tree.get_or_create(&Self::key(ip, word), EXACT_LEN);
		(was_new, NodeHandle(id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ipv4_facade_round_trips() {
		let mut t: Ipv4Trie<u32> = Ipv4Trie::new();
		t.append(&[1, 2, 3, 0], 24, 7);
		let (exact, bytes, len, value) = t.get(&[1, 2, 3, 5], 32);
		assert!(!exact);
		assert_eq!(bytes, alloc::vec![1, 2, 3, 0]);
		assert_eq!(len, 24);
		assert_eq!(value, Some(7));
	}

	#[test]
	#[should_panic(expected = "exceeds this facade's maximum")]
	fn ipv4_facade_rejects_wide_masks() {
		let mut t: Ipv4Trie<u32> = Ipv4Trie::new();
		t.append(&[1, 2, 3, 0], 33, 7);
	}

	#[test]
	fn ipv6_facade_accepts_128_bit_masks() {
		let mut t: Ipv6Trie<u32> = Ipv6Trie::new();
		let key = [0u8; 16];
		t.set(&key, 128, 1);
		let (exact, _, len, value) = t.get(&key, 128);
		assert!(exact);
		assert_eq!(len, 128);
		assert_eq!(value, Some(1));
	}

	#[test]
	fn exact_trie_only_matches_verbatim_pairs() {
		let mut t: ExactTrie<u32> = ExactTrie::new();
		t.append([10, 0, 0, 1], 42, 99);
		assert_eq!(t.get([10, 0, 0, 1], 42), (true, Some(99)));
		assert_eq!(t.get([10, 0, 0, 1], 43), (false, None));
	}

	#[test]
	fn get_node_creates_and_reuses_handle() {
		let mut t: Ipv4Trie<u32> = Ipv4Trie::new();
		let (was_new, h1) = t.get_node(&[1, 2, 3, 0], 24);
		assert!(was_new);
		assert!(t.node(h1).data().is_none());
		let (was_new2, h2) = t.get_node(&[1, 2, 3, 0], 24);
		assert!(!was_new2);
		assert_eq!(h1, h2);
	}

	#[test]
	fn exact_trie_get_node_creates_and_reuses_handle() {
		let mut t: ExactTrie<u32> = ExactTrie::new();
		let (was_new, h1) = t.get_node([10, 0, 0, 1], 42);
		assert!(was_new);
		assert!(t.node(h1).data().is_none());
		let (was_new2, h2) = t.get_node([10, 0, 0, 1], 42);
		assert!(!was_new2);
		assert_eq!(h1, h2);
	}
}

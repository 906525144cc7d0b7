//! the core path-compressed radix tree (spec.md §4.3)
//!
//! `Tree<T>` is the 160-bit general core every facade in [`crate::facade`]
//! delegates to. All bit-twiddling lives in [`crate::codec`] and
//! [`crate::node`]; this module is the traversal and mutation algorithm on
//! top of them.

use alloc::{
	boxed::Box,
	format,
	vec::Vec,
};

use crate::{
	codec::{
		decode,
		encode,
		has_bit,
		mask_to,
		WORDS,
	},
	node::{
		Node,
		NodeId,
	},
	pool::NodePool,
	trace::{
		format_key,
		TraceSink,
	},
	MAXBITS,
};

struct BestMatch {
	exact: bool,
	/// last node that matched during descent (real or dummy); `None` if
	/// even the root failed to match
	deepest: Option<NodeId>,
	/// deepest *real* ancestor strictly above `deepest` (spec.md §9: this
	/// lags one step behind the walk cursor by design)
	container: Option<NodeId>,
}

/// the path-compressed binary radix tree over `MAXBITS`-bit keys
///
/// `T` must be [`Clone`] because the payload is treated as an opaque
/// handle (spec.md §9) that `Append`/`Get` hand back to the caller while
/// the tree keeps its own copy - the same role `V: Clone` plays throughout
/// the teacher's map types.
pub struct Tree<T> {
	pool: NodePool<T>,
	root: Option<NodeId>,
	trace_sink: Option<Box<dyn TraceSink>>,
}

impl<T> Default for Tree<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Tree<T> {
	/// a new, empty tree
	pub const fn new() -> Self {
		Self {
			pool: NodePool::new(),
			root: None,
			trace_sink: None,
		}
	}

	/// install a sink that receives one formatted line per branching
	/// decision (§6). Pass `None` to disable tracing again.
	pub fn set_trace(&mut self, sink: Option<Box<dyn TraceSink>>) {
		self.trace_sink = sink;
	}

	/// whether the tree holds no nodes at all
	pub fn is_empty(&self) -> bool {
		self.root.is_none()
	}

	/// number of nodes (real and dummy) currently allocated
	pub fn node_count(&self) -> usize {
		self.pool.len()
	}

	/// read access to a node by its durable handle
	pub fn node(&self, id: NodeId) -> &Node<T> {
		self.pool.get(id)
	}

	/// mutable access to a node by its durable handle
	pub fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
		self.pool.get_mut(id)
	}

	fn trace(&mut self, line: &str) {
		if let Some(sink) = self.trace_sink.as_deref_mut() {
			sink.trace_line(line);
		}
	}

	/// §4.3.1 `findBestMatch`
	fn find_best_match(&mut self, key: &[u32; WORDS], l: u8) -> BestMatch {
		let mut exact = false;
		let mut container = None;
		let mut parent: Option<NodeId> = None;
		let mut current = self.root;

		while let Some(nid) = current {
			let (is_match, dummy, bits, prefixlen, a, b) = {
				let n = self.pool.get(nid);
				(n.matches(key, l), n.dummy, n.bits, n.prefixlen, n.a, n.b)
			};
			if !is_match {
				break;
			}
			if let Some(pid) = parent {
				if !self.pool.get(pid).dummy {
					container = Some(pid);
				}
			}
			let verb = if dummy { "dummy" } else { "found" };
			let line = format!("{verb} {} for {}", format_key(&bits, prefixlen), format_key(key, l));
			self.trace(&line);

			parent = Some(nid);
			if prefixlen == l {
				exact = true;
				break;
			}
			current = if has_bit(key, prefixlen + 1) { a } else { b };
		}

		BestMatch {
			exact,
			deepest: parent,
			container,
		}
	}
}

impl<T: Clone> Tree<T> {
	/// §6 `Append`: insert only if `(key, l)` is absent.
	pub fn append(&mut self, key: &[u8], l: u8, value: T) -> (bool, Option<T>) {
		self.add_route(key, l, value, false)
	}

	/// §6 `Set`: insert, overwriting any existing value at `(key, l)`.
	pub fn set(&mut self, key: &[u8], l: u8, value: T) -> (bool, Option<T>) {
		self.add_route(key, l, value, true)
	}

	/// §4.3.2 `addRoute`
	fn add_route(&mut self, key_bytes: &[u8], l: u8, value: T, replace: bool) -> (bool, Option<T>) {
		assert!(
			l as usize <= MAXBITS as usize,
			"unable to add a prefix longer than MAXBITS ({MAXBITS})"
		);
		let key = encode(key_bytes, l);

		// Case A: empty tree
		if self.root.is_none() {
			let line = format!("root={} (no subtree)", format_key(&key, l));
			self.trace(&line);
			let id = self.pool.alloc(key, l, false, Some(value));
			self.root = Some(id);
			return (true, None);
		}

		let bm = self.find_best_match(&key, l);

		// Case B: exact match already present
		if bm.exact {
			let nid = bm.deepest.expect("exact match always carries a node");
			let was_dummy = self.pool.get(nid).dummy;
			if was_dummy {
				let n = self.pool.get_mut(nid);
				n.dummy = false;
				n.data = Some(value);
				return (true, None);
			}
			let old = self.pool.get(nid).data.clone();
			if replace {
				self.pool.get_mut(nid).data = Some(value);
				return (true, old);
			}
			return (false, old);
		}

		// Cases C/D: attach or split
		self.insert_new(key, l, Some(value), bm.deepest);
		(true, None)
	}

	/// §4.3.3 `get`
	pub fn get(&mut self, key_bytes: &[u8], l: u8) -> (bool, Vec<u8>, u8, Option<T>) {
		assert!(
			l as usize <= MAXBITS as usize,
			"unable to look up a prefix longer than MAXBITS ({MAXBITS})"
		);
		let key = encode(key_bytes, l);
		let bm = self.find_best_match(&key, l);

		if let Some(nid) = bm.deepest {
			let n = self.pool.get(nid);
			if !n.dummy {
				return (bm.exact, decode(&n.bits, n.prefixlen), n.prefixlen, n.data.clone());
			}
		}
		if let Some(cid) = bm.container {
			let c = self.pool.get(cid);
			return (false, decode(&c.bits, c.prefixlen), c.prefixlen, c.data.clone());
		}
		(false, Vec::new(), 0, None)
	}

	/// §4.3.4 `getOrCreate`: return the existing exact node, or insert a
	/// fresh one holding no payload and return its handle.
	pub fn get_or_create(&mut self, key_bytes: &[u8], l: u8) -> (bool, NodeId) {
		assert!(
			l as usize <= MAXBITS as usize,
			"unable to add a prefix longer than MAXBITS ({MAXBITS})"
		);
		let key = encode(key_bytes, l);

		if self.root.is_none() {
			let line = format!("root={} (no subtree)", format_key(&key, l));
			self.trace(&line);
			let id = self.pool.alloc(key, l, false, None);
			self.root = Some(id);
			return (true, id);
		}

		let bm = self.find_best_match(&key, l);
		if bm.exact {
			let nid = bm.deepest.expect("exact match always carries a node");
			if self.pool.get(nid).dummy {
				self.pool.get_mut(nid).dummy = false;
				return (true, nid);
			}
			return (false, nid);
		}

		let id = self.insert_new(key, l, None, bm.deepest);
		(true, id)
	}

	/// §4.5 optional delete/trim. Returns whether a real node at the
	/// exact `(key, l)` was found (and removed, or converted to a
	/// routing-only dummy if it had two children).
	///
	/// Single-child dummies created by a delete are not re-simplified -
	/// an explicitly implementation-defined choice (spec.md §9).
	pub fn delete(&mut self, key_bytes: &[u8], l: u8) -> bool {
		assert!(
			l as usize <= MAXBITS as usize,
			"unable to delete a prefix longer than MAXBITS ({MAXBITS})"
		);
		if self.root.is_none() {
			return false;
		}
		let key = encode(key_bytes, l);
		let bm = self.find_best_match(&key, l);
		if !bm.exact {
			return false;
		}
		let nid = bm.deepest.expect("exact match always carries a node");
		if self.pool.get(nid).dummy {
			// dummy invisibility: there is no real entry here to delete
			return false;
		}

		let (a, b) = {
			let n = self.pool.get(nid);
			(n.a, n.b)
		};
		match (a, b) {
			(None, None) => self.unlink(nid, &key),
			(Some(c), None) | (None, Some(c)) => self.replace_with_child(nid, c, &key),
			(Some(_), Some(_)) => {
				let n = self.pool.get_mut(nid);
				n.dummy = true;
				n.data = None;
			},
		}
		true
	}

	/// Cases C/D of §4.3.2, shared between `add_route` and
	/// `get_or_create`. Returns the id of the freshly-created real node.
	fn insert_new(&mut self, key: [u32; WORDS], l: u8, value: Option<T>, parent: Option<NodeId>) -> NodeId {
		let down = match parent {
			Some(pid) => self.pool.get(pid).child_towards(&key),
			None => self.root,
		};

		let down_id = match down {
			Some(id) => id,
			None => {
				// Case C: parent has no child on this side yet
				let pid = parent.expect("no-child case only reachable below an existing node");
				let new_id = self.pool.alloc(key, l, false, value);
				let (pbits, pprefixlen) = {
					let p = self.pool.get(pid);
					(p.bits, p.prefixlen)
				};
				let to_a = has_bit(&key, pprefixlen + 1);
				let side = if to_a { "a" } else { "b" };
				let line = format!(
					"{side}-child {} for {}",
					format_key(&key, l),
					format_key(&pbits, pprefixlen)
				);
				self.trace(&line);
				self.pool.get_mut(pid).set_child_towards(&key, new_id);
				return new_id;
			},
		};

		let (d_bits, d_prefixlen) = {
			let d = self.pool.get(down_id);
			(d.bits, d.prefixlen)
		};
		let matched = self.pool.get(down_id).bits_matched(&key, l);

		if matched == l {
			self.split_wrap(key, l, value, parent, down_id, d_bits, d_prefixlen)
		} else {
			self.split_dummy(key, l, value, parent, down_id, d_bits, d_prefixlen, matched)
		}
	}

	/// Sub-case D1: the new key is a strict prefix of `down`; wrap it in a
	/// fresh real node.
	fn split_wrap(
		&mut self,
		key: [u32; WORDS],
		l: u8,
		value: Option<T>,
		parent: Option<NodeId>,
		down_id: NodeId,
		d_bits: [u32; WORDS],
		d_prefixlen: u8,
	) -> NodeId {
		let plen_bit = match parent {
			Some(pid) => self.pool.get(pid).prefixlen + 1,
			None => 1,
		};
		let use_a = has_bit(&key, plen_bit);
		assert_eq!(
			use_a,
			has_bit(&d_bits, plen_bit),
			"branch discriminator mismatch while wrapping {}",
			format_key(&d_bits, d_prefixlen)
		);

		let new_id = self.pool.alloc(key, l, false, value);
		if use_a {
			self.pool.get_mut(new_id).a = Some(down_id);
		} else {
			self.pool.get_mut(new_id).b = Some(down_id);
		}

		match parent {
			Some(pid) => {
				let (pbits, pprefixlen) = {
					let p = self.pool.get(pid);
					(p.bits, p.prefixlen)
				};
				let to_a = has_bit(&key, pprefixlen + 1);
				let side = if to_a { "a" } else { "b" };
				let line = format!(
					"insert {side}-child {} to {} before {}",
					format_key(&key, l),
					format_key(&pbits, pprefixlen),
					format_key(&d_bits, d_prefixlen)
				);
				self.trace(&line);
				self.pool.get_mut(pid).set_child_towards(&key, new_id);
			},
			None => {
				let side = if use_a { "a" } else { "b" };
				let line = format!(
					"root={} (uses {} as {side}-child)",
					format_key(&key, l),
					format_key(&d_bits, d_prefixlen)
				);
				self.trace(&line);
				self.root = Some(new_id);
			},
		}
		new_id
	}

	/// Sub-case D2: the new key diverges from `down` mid-prefix; synthesize
	/// a dummy parent for both.
	fn split_dummy(
		&mut self,
		key: [u32; WORDS],
		l: u8,
		value: Option<T>,
		parent: Option<NodeId>,
		down_id: NodeId,
		d_bits: [u32; WORDS],
		d_prefixlen: u8,
		matched: u8,
	) -> NodeId {
		let dummy_bits = mask_to(&key, matched);
		let dummy_id = self.pool.alloc(dummy_bits, matched, true, None);
		let use_a = has_bit(&d_bits, matched + 1);
		assert_ne!(
			use_a,
			has_bit(&key, matched + 1),
			"tangled branches while splitting at {}",
			format_key(&dummy_bits, matched)
		);

		let new_leaf_id = self.pool.alloc(key, l, false, value);
		if use_a {
			self.pool.get_mut(dummy_id).a = Some(down_id);
			self.pool.get_mut(dummy_id).b = Some(new_leaf_id);
			let line = format!(
				"created a-dummy {} with {} and {}",
				format_key(&dummy_bits, matched),
				format_key(&d_bits, d_prefixlen),
				format_key(&key, l)
			);
			self.trace(&line);
		} else {
			self.pool.get_mut(dummy_id).b = Some(down_id);
			self.pool.get_mut(dummy_id).a = Some(new_leaf_id);
			let line = format!(
				"created b-dummy {} with {} and {}",
				format_key(&dummy_bits, matched),
				format_key(&key, l),
				format_key(&d_bits, d_prefixlen)
			);
			self.trace(&line);
		}

		match parent {
			Some(pid) => {
				let (pbits, pprefixlen) = {
					let p = self.pool.get(pid);
					(p.bits, p.prefixlen)
				};
				let to_a = has_bit(&key, pprefixlen + 1);
				let (child_for_print, side) = if to_a {
					(self.pool.get(dummy_id).a.expect("a-side just assigned"), "a")
				} else {
					(self.pool.get(dummy_id).b.expect("b-side just assigned"), "b")
				};
				let (cbits, cprefixlen) = {
					let c = self.pool.get(child_for_print);
					(c.bits, c.prefixlen)
				};
				let line = format!(
					"insert {side}-child {} to {} before {}",
					format_key(&dummy_bits, matched),
					format_key(&pbits, pprefixlen),
					format_key(&cbits, cprefixlen)
				);
				self.trace(&line);
				self.pool.get_mut(pid).set_child_towards(&key, dummy_id);
			},
			None => {
				let side = if use_a { "a" } else { "b" };
				let line = format!(
					"root={} (uses {} as {side}-child)",
					format_key(&dummy_bits, matched),
					format_key(&key, l)
				);
				self.trace(&line);
				self.root = Some(dummy_id);
			},
		}
		new_leaf_id
	}

	/// re-walk from the root to find `nid`'s parent - the tree never
	/// stores back-pointers (spec.md §9), so this is the only way to find
	/// where to unlink from.
	fn parent_of(&self, nid: NodeId, key: &[u32; WORDS]) -> Option<NodeId> {
		let mut current = self.root?;
		if current == nid {
			return None;
		}
		loop {
			let next = self.pool.get(current).child_towards(key);
			match next {
				Some(c) if c == nid => return Some(current),
				Some(c) => current = c,
				None => return None,
			}
		}
	}

	fn unlink(&mut self, nid: NodeId, key: &[u32; WORDS]) {
		match self.parent_of(nid, key) {
			Some(pid) => {
				let p = self.pool.get_mut(pid);
				if p.a == Some(nid) {
					p.a = None;
				} else {
					p.b = None;
				}
			},
			None => self.root = None,
		}
	}

	fn replace_with_child(&mut self, nid: NodeId, child: NodeId, key: &[u32; WORDS]) {
		match self.parent_of(nid, key) {
			Some(pid) => {
				let p = self.pool.get_mut(pid);
				if p.a == Some(nid) {
					p.a = Some(child);
				} else {
					p.b = Some(child);
				}
			},
			None => self.root = Some(child),
		}
	}
}

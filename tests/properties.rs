//! property-based coverage of the invariants a correct lookup tree must
//! hold regardless of insertion order.

use patricia_trie::{
	codec::{
		encode,
		WORDS,
	},
	tree::Tree,
};
use proptest::prelude::*;

fn arb_ipv4() -> impl Strategy<Value = [u8; 4]> {
	any::<[u8; 4]>()
}

fn arb_mask() -> impl Strategy<Value = u8> {
	0u8..=32
}

fn covers(prefix_bytes: &[u8], prefix_len: u8, query_bytes: &[u8], query_len: u8) -> bool {
	if prefix_len > query_len {
		return false;
	}
	let p = encode(prefix_bytes, prefix_len);
	let q = encode(query_bytes, prefix_len);
	p == q
}

proptest! {
	#[test]
	fn codec_round_trip_masks_and_pads(bytes in arb_ipv4(), len in arb_mask()) {
		let words = encode(&bytes, len);
		let decoded = patricia_trie::codec::decode(&words, len);
		let expected_len = 4 * (((len as usize) + 31) / 32).min(1);
		let expected_len = if len == 0 { 0 } else { expected_len };
		prop_assert_eq!(decoded.len(), expected_len);

		// re-encoding the decoded bytes at the same length must be a fixed point
		if !decoded.is_empty() {
			let roundtrip = encode(&decoded, len);
			prop_assert_eq!(roundtrip, words);
		}
	}

	#[test]
	fn append_is_idempotent_against_the_first_value(
		key in arb_ipv4(), len in arb_mask(), a in any::<u32>(), b in any::<u32>()
	) {
		let mut t: Tree<u32> = Tree::new();
		let (set1, old1) = t.append(&key, len, a);
		prop_assert!(set1);
		prop_assert!(old1.is_none());

		let (set2, old2) = t.append(&key, len, b);
		prop_assert!(!set2);
		prop_assert_eq!(old2, Some(a));

		let (exact, _bytes, _plen, value) = t.get(&key, len);
		prop_assert!(exact);
		prop_assert_eq!(value, Some(a));
	}

	#[test]
	fn set_is_idempotent_against_the_last_value(
		key in arb_ipv4(), len in arb_mask(), a in any::<u32>(), b in any::<u32>()
	) {
		let mut t: Tree<u32> = Tree::new();
		t.set(&key, len, a);
		let (set2, old2) = t.set(&key, len, b);
		prop_assert!(set2);
		prop_assert_eq!(old2, Some(a));

		let (exact, _bytes, _plen, value) = t.get(&key, len);
		prop_assert!(exact);
		prop_assert_eq!(value, Some(b));
	}

	#[test]
	fn every_inserted_prefix_is_exactly_gettable(
		entries in proptest::collection::vec((arb_ipv4(), arb_mask(), any::<u32>()), 1..12)
	) {
		let mut t: Tree<u32> = Tree::new();
		for (key, len, value) in &entries {
			t.set(key, *len, *value);
		}

		// distinct entries can mask down to the same (bits, len) - e.g. two
		// different /0 default routes - and later `set` calls overwrite
		// earlier ones, so the expectation has to be keyed the same way the
		// tree keys it, keeping only the last value per masked key.
		let mut expected: std::collections::BTreeMap<([u32; WORDS], u8), u32> = std::collections::BTreeMap::new();
		for (key, len, value) in &entries {
			expected.insert((encode(key, *len), *len), *value);
		}

		for ((bits, len), value) in &expected {
			let bytes = patricia_trie::codec::decode(bits, *len);
			let (exact, got_bytes, plen, got) = t.get(&bytes, *len);
			prop_assert!(exact, "lost exact match for {:?}/{}", bits, len);
			prop_assert_eq!(plen, *len);
			prop_assert_eq!(&got_bytes, &bytes);
			prop_assert_eq!(got, Some(*value));
		}
	}

	#[test]
	fn lookup_never_returns_a_non_covering_or_dummy_prefix(
		entries in proptest::collection::vec((arb_ipv4(), arb_mask(), any::<u32>()), 0..12),
		query in arb_ipv4(),
		qlen in arb_mask(),
	) {
		let mut t: Tree<u32> = Tree::new();
		for (key, len, value) in &entries {
			t.append(key, *len, *value);
		}

		let (exact, bytes, plen, value) = t.get(&query, qlen);
		if plen > 0 || !bytes.is_empty() || value.is_some() {
			prop_assert!(covers(&bytes, plen, &query, qlen));
			prop_assert!(plen <= qlen || (qlen == 0 && plen == 0));
		}
		if exact {
			prop_assert_eq!(plen, qlen);
		}
	}
}

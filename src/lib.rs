//! longest-prefix-match radix trie for bit-prefix keys (IP routing tables
//! and similar)
//!
//! The core type is [`tree::Tree`], a path-compressed binary radix tree
//! over keys of up to [`MAXBITS`] bits. Insertion (`Append`/`Set`) may
//! synthesize "dummy" internal nodes to hold the branch point between two
//! stored prefixes that share no inserted ancestor; lookup (`Get`) walks
//! down bit by bit, remembering both the deepest node that still matches
//! and the deepest *real* (non-dummy) ancestor above it, so that a query
//! landing inside a dummy's subtree falls back to that ancestor rather
//! than reporting the dummy itself.
//!
//! [`facade`] wraps the shared core in the fixed-width key shapes routing
//! code actually reaches for: dotted IPv4, 16-byte IPv6, IPv6-plus-ASN and
//! an exact-match variant.
#![no_std]
#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/patricia-trie/0.1.0")]

extern crate alloc;

pub mod codec;
pub mod facade;
pub mod node;
mod pool;
pub mod trace;
pub mod tree;

/// the widest prefix this crate's tree stores a bit of: 160 bits, enough
/// for an IPv6 address plus a 32-bit ASN tag.
pub const MAXBITS: u8 = 160;

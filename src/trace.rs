//! the optional debug trace sink (spec.md §6)
//!
//! The reference implementation (`original_source/interface.go`) exposes a
//! single process-wide `var DEBUG io.Writer`. spec.md §9 explicitly calls
//! that out as something a rewrite should turn into a per-tree
//! configuration option instead, so here it's a sink installed on a
//! [`crate::tree::Tree`] at construction or via `set_trace`.

use alloc::{
	format,
	string::String,
};
use core::fmt;

use crate::codec::WORDS;

/// receives formatted trace lines describing a tree's branching decisions
///
/// Blanket-implemented for any [`core::fmt::Write`], so a `String`, or any
/// writer a host environment provides, can be used directly.
pub trait TraceSink {
	/// receive one already-formatted trace line (without a trailing
	/// newline)
	fn trace_line(&mut self, line: &str);
}

impl<W: fmt::Write> TraceSink for W {
	fn trace_line(&mut self, line: &str) {
		// a trace sink is a diagnostic convenience; a write error here
		// has nowhere useful to go and must not disturb tree operations
		let _ = writeln!(self, "{line}");
	}
}

/// render a stored key the way the reference's `keyStr` does: dotted IPv4
/// form for prefixes of 32 bits or less, the literal `"ipv6"` for anything
/// wider.
pub(crate) fn format_key(bits: &[u32; WORDS], prefixlen: u8) -> String {
	if prefixlen <= 32 {
		let word = bits[0];
		format!(
			"{}.{}.{}.{}/{}",
			(word >> 24) as u8,
			(word >> 16) as u8,
			(word >> 8) as u8,
			word as u8,
			prefixlen
		)
	} else {
		String::from("ipv6")
	}
}

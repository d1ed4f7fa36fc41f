//! Byte-stream plumbing between the child's pipes and our own stdio.
//!
//! This module holds the line-prefixing writer and the relay loop that
//! drains one child stream into it.

mod prefix;
mod relay;

pub use prefix::{LinePrefixWriter, Prefix, PrefixWriteError};
pub use relay::{relay, RelayReport, StreamKind};

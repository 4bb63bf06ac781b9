//! Content record data model.
//!
//! Records arrive from the provider as loosely typed JSON; the types here
//! normalise group keys, ranks and flags once at the boundary so the rest of
//! the engine can work with plain Rust values.

mod core;

pub use core::{ContentEnvelope, DEFAULT_GROUP_KEY, GroupKey, Media, Rank, Record};

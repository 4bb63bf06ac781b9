//! Error module orchestrator.
//!
//! Concern-specific error enums live next to the code that raises them; this
//! module unifies them under [`DeckError`].

mod types;

pub use types::{DeckError, FetchError, Result};

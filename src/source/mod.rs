//! Per-source pagination state
//!
//! Tracks how far each source has been paged, which fetched items are
//! still waiting to be delivered, and whether the source is still alive.
//!
//! # Overview
//!
//! The source module provides:
//! - `SourcePage` - One page as returned by a source adapter
//! - `SourcePaginationState` - Immutable per-source cursor and buffer
//!
//! Every transition consumes the state and returns a new one, so a state
//! value observed by the caller never changes underneath it.

mod types;

pub use types::{SourcePage, SourcePaginationState};

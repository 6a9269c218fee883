//! # edu-federate
//!
//! Federated search over independent, paginated educational resource
//! providers, presented as one fairly merged, incrementally loadable
//! result stream.
//!
//! ## Features
//!
//! - **Fair merge**: round-robin interleave across sources in a fixed order
//! - **Incremental loading**: `load_first` / `load_next` with per-source buffers
//! - **Concurrent fan-out**: only sources running low are fetched, each under its own timeout
//! - **Graceful degradation**: a failing source is dropped, the others keep going
//! - **HTTP sources from YAML**: page-number JSON endpoints with retry and rate limiting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use edu_federate::{FnAdapter, PaginationSession, SessionOptions, SourcePage, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let adapter = Arc::new(FnAdapter::new(|req| async move {
//!         Ok(SourcePage::new(vec![format!("{}-{}", req.source_id, req.page)], 3, 3, req.page))
//!     }));
//!
//!     let mut session = PaginationSession::new();
//!     session.configure(SessionOptions::new(["khan", "oer"], adapter).with_page_size(10))?;
//!
//!     let page = session.load_first().await?;
//!     println!("{} of {}", page.meta.shown, page.meta.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    PaginationSession                      │
//! │   configure()   load_first()   load_next()   has_more()   │
//! └───────────────────────────────────────────────────────────┘
//!                              │
//! ┌────────────────────────────┴──────────────────────────────┐
//! │                  MultiSourcePaginator                     │
//! │   fan-out fetch → fold per source → interleave → take     │
//! └───────────────────────────────────────────────────────────┘
//!          │                   │                    │
//! ┌────────┴───────┬───────────┴─────────┬──────────┴────────┐
//! │ SourceAdapter  │ SourcePagination    │   Interleave      │
//! ├────────────────┤ State               ├───────────────────┤
//! │ Fn / Registry  │ cursor, buffer,     │ round-robin,      │
//! │ HTTP + Retry   │ liveness            │ consumed counts   │
//! └────────────────┴─────────────────────┴───────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Search configuration
pub mod config;

/// Source adapter contract and implementations
pub mod adapter;

/// Per-source pagination state
pub mod source;

/// Round-robin interleave
pub mod interleave;

/// Multi-source pagination rounds
pub mod paginator;

/// Session controller
pub mod session;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use adapter::{AdapterRegistry, FetchRequest, FnAdapter, HttpSourceAdapter, SourceAdapter};
pub use config::SearchConfig;
pub use paginator::{PageBatch, PageMeta};
pub use session::{PaginationSession, SessionOptions};
pub use source::SourcePage;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

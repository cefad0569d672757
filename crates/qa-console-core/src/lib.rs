//! # QA Console Core
//!
//! Transport-free logic for QA Console: the Q&A data model, the error
//! taxonomy, the [`backend::QaBackend`] abstraction, and the three roles that
//! keep a local view of a remote Q&A collection in step with the server.
//!
//! This crate contains no HTTP client, filesystem I/O, or async runtime.
//! The `qa-console` crate supplies the reqwest-backed backend and the CLI.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ StagingArea ──commit──▶ backend ──▶ CollectionCursor (reset)
//!                                        ▲                │
//!                                        │                ▼
//!                                   Reconciler ◀── create / update / delete
//! ```
//!
//! Every mutation is followed by a mandatory reload through the [`cursor::Reload`]
//! trait: the server is the source of truth and the client never patches its
//! cached pages incrementally.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`backend`] | Backend trait and in-memory implementation |
//! | [`cursor`] | Paginated collection view |
//! | [`reconcile`] | Create / update / delete with reload |
//! | [`staging`] | Review staging area for generated pairs |
//! | [`chat`] | Chat session against the search endpoint |

pub mod backend;
pub mod chat;
pub mod cursor;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod staging;

pub use error::{Error, Result};

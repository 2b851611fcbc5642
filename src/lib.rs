//! Personal context memory for AI assistants: tenant-isolated storage, query
//! classification, and routed retrieval.
//!
//! Context is stored as JSON entries in named categories ("memory banks") such
//! as `notes`, `github` or `values`. Every entry belongs to exactly one user
//! within one tenant, and every read and write is scoped by both.
//!
//! # Architecture
//!
//! - **Storage**: SQLite via `rusqlite`, pooled with `r2d2`; synchronous SQL runs
//!   on the blocking thread pool behind the async [`store::ContextStore`]
//! - **Classification**: optional Gemini classifier with a deterministic keyword
//!   table fallback
//! - **Routing**: one adapter per category; `comprehensive` queries fan out to
//!   all of them concurrently and merge the results
//! - **Identity**: per-tenant users with opaque random credentials
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: Connection pool, schema, and migrations
//! - [`memory`]: Synchronous entry operations: upsert, get, search, forget, stats
//! - [`store`]: Async store facade and lifecycle
//! - [`identity`]: User issuance and credential resolution
//! - [`classifier`]: Query → category classification
//! - [`llm`]: External classifier and summarizer contracts, Gemini client
//! - [`router`]: Query routing and result merging

pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod llm;
pub mod memory;
pub mod router;
pub mod store;

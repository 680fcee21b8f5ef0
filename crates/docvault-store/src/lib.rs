//! # docvault Store
//!
//! Storage abstraction for docvault. Provides a trait-based interface for
//! document persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store holds two kinds of data per document:
//!
//! - the mutable head state (owner, status, certification, role grants), replaced
//!   as a unit by [`Store::update_document`];
//! - the append-only version history, which only grows through
//!   [`Store::insert_version`] and is never rewritten.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests and embedding
//! - [`InsertResult`] - Result of inserting a version
//! - [`StoredDocument`] - Head state of one document
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docvault_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("docvault.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let id = store.allocate_document_id().await.unwrap();
//!     println!("next document: {id}");
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Never reused ids**: ids come from a persistent counter, even if the insert fails
//! - **Idempotent inserts**: Inserting the same version twice returns `AlreadyExists`
//! - **Conflict detection**: A different version at an occupied index returns `Conflict`
//! - **Dense history**: A version that would leave a gap is rejected

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, Store, StoreExt, StoredDocument};

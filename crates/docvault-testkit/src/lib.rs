//! # docvault Testkit
//!
//! Testing utilities for docvault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a ready ledger with a manual clock, a recording sink and a
//!   cast of principals
//! - **Generators**: Proptest strategies for principals, content ids and
//!   random operation sequences
//!
//! The end-to-end scenario, property and concurrency tests live in `tests/`.
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docvault_testkit::generators::ops;
//!
//! proptest! {
//!     #[test]
//!     fn history_never_shrinks(ops in ops(32)) {
//!         // apply with LedgerFixture::apply and check the version count
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use docvault_testkit::LedgerFixture;
//!
//! let fx = LedgerFixture::new();
//! let id = fx.create_staffed_document().await?;
//! fx.ledger.update(id, &fx.editor, "Qm2", "fix").await?;
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{DocumentSnapshot, LedgerFixture, FIXTURE_EPOCH};
pub use generators::{ops, Actor, Op};

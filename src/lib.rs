//! Unique, shared and weak handles with explicit, deterministic reference
//! counting.
//!
//! This crate provides three handle types, none of which lean on `Rc`, `Arc`
//! or a garbage collector:
//!
//! - `Unique`, a move-only slot that may be empty. Payloads go in with
//!   `set`/`attach` and come out with `detach`/`pick`.
//! - `Shared`, a counted handle to a heap block. Handles made with `share`
//!   alias the same payload.
//! - `Weak`, an observer of a `Shared` block that does not keep the payload
//!   alive and can be promoted back with `lock` while the payload exists.
//!
//! Lifetimes are single-threaded and eager: a payload is dropped the instant
//! its last `Shared` goes, and its block is freed the instant the last
//! `Weak` goes after that. None of the handles are `Send`.
//!
//! Block allocations are accounted per thread (`thread_local_stats`) and,
//! with the `global` feature, for the whole process (`global_stats`), for
//! chasing leaks.

pub(crate) mod block;
mod error;
mod ledger;
pub mod pointers;
mod replicate;
mod stats;
pub mod unique;


pub use block::BlockLayout;
pub use error::{Error, Result};
#[cfg(feature = "global")]
pub use ledger::global_stats;
pub use ledger::thread_local_stats;
pub use pointers::{Shared, Weak};
pub use replicate::{clone_unsupported, Replicate};
pub use stats::Stats;
pub use unique::{pick, Unique};

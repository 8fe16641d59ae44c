//! Trade Ledger
//!
//! Record store for trades kept in an external key-value ledger.
//!
//! # Architecture
//!
//! - **Dispatcher**: operation name + string arguments → handler table
//! - **Record Store**: create, point query, range query, status transition
//! - **Ledger Port**: get / put / ordered scan; RocksDB and in-memory adapters
//! - **Clock**: injectable instant, rendered in a fixed timezone
//!
//! # Invariants
//!
//! - Validation runs before any ledger access; a rejected call writes nothing
//! - Create is a last-write-wins upsert keyed by the caller's trade id
//! - `ctime` is set at creation and never rewritten
//! - Range query output preserves scan order and is always a well-formed array
//! - Scan cursors are released before the operation returns, on every path

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;

// Re-exports
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use dispatch::{Dispatcher, Payload};
pub use error::{Error, Result};
pub use memory::MemoryLedger;
pub use metrics::Metrics;
pub use storage::{LedgerError, LedgerPort, RocksLedger};
pub use store::TradeStore;
pub use types::{Trade, STATUS_IN_PROGRESS};
pub use validation::Operation;

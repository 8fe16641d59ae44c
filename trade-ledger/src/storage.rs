//! Ledger port and the RocksDB adapter
//!
//! The store only needs three things from the ledger underneath it: point
//! get, unconditional put, and an ordered forward scan over one flat key
//! space. [`LedgerPort`] is that contract; [`RocksLedger`] implements it over
//! a single column family.
//!
//! # Column Families
//!
//! - `trades` - Trade records (key: trade id, value: JSON)

use crate::{error::Result, Config};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, ReadOptions, DB,
};
use std::sync::Arc;
use thiserror::Error;

/// Column family holding trade records
const CF_TRADES: &str = "trades";

/// Failure reported by a ledger backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LedgerError(String);

impl LedgerError {
    /// Create from a message
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        LedgerError(err.to_string())
    }
}

/// Result type for ledger port calls
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// One `(key, value)` pair yielded by a scan
pub type KeyValue = (String, Vec<u8>);

/// Forward-only cursor over a key range
///
/// The cursor holds backend resources until it is dropped, so dropping it is
/// the release step. Consumers drop it on every exit path, including early
/// returns on the first failed item.
pub type RangeScan<'a> = Box<dyn Iterator<Item = LedgerResult<KeyValue>> + 'a>;

/// What the store needs from the ledger
pub trait LedgerPort {
    /// Point lookup. `Ok(None)` means the key holds no value.
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Unconditional upsert
    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()>;

    /// Lexicographic scan over `[start_key, end_key)`.
    ///
    /// An empty `start_key` starts at the first key; an empty `end_key` runs
    /// to the last one.
    fn scan(&self, start_key: &str, end_key: &str) -> LedgerResult<RangeScan<'_>>;
}

/// RocksDB-backed ledger
pub struct RocksLedger {
    db: Arc<DB>,
}

impl std::fmt::Debug for RocksLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksLedger")
            .field("path", &self.db.path())
            .finish()
    }
}

impl RocksLedger {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(
            CF_TRADES,
            Self::cf_options_trades(),
        )];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB trade ledger");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_trades() -> Options {
        let mut opts = Options::default();
        // Point reads dominate, LZ4 keeps them cheap
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self) -> LedgerResult<&ColumnFamily> {
        self.db
            .cf_handle(CF_TRADES)
            .ok_or_else(|| LedgerError::new(format!("Column family {} not found", CF_TRADES)))
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

impl LedgerPort for RocksLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        let cf = self.cf_handle()?;
        Ok(self.db.get_cf(cf, key.as_bytes())?)
    }

    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        let cf = self.cf_handle()?;
        self.db.put_cf(cf, key.as_bytes(), value)?;
        Ok(())
    }

    fn scan(&self, start_key: &str, end_key: &str) -> LedgerResult<RangeScan<'_>> {
        let cf = self.cf_handle()?;

        let mut read_opts = ReadOptions::default();
        if !end_key.is_empty() {
            read_opts.set_iterate_upper_bound(end_key.as_bytes().to_vec());
        }

        let iter = self.db.iterator_cf_opt(
            cf,
            read_opts,
            IteratorMode::From(start_key.as_bytes(), Direction::Forward),
        );

        Ok(Box::new(iter.map(|item| -> LedgerResult<KeyValue> {
            let (key, value) = item?;
            let key = String::from_utf8(key.into_vec())
                .map_err(|e| LedgerError::new(format!("Key is not UTF-8: {}", e)))?;
            Ok((key, value.into_vec()))
        })))
    }
}

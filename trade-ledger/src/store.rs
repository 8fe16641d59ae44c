//! Trade record store
//!
//! Implements create, point query, range query and status transition on
//! top of any [`LedgerPort`].
//!
//! # Example
//!
//! ```
//! use trade_ledger::{MemoryLedger, TradeStore};
//!
//! let store = TradeStore::new(MemoryLedger::new());
//! let args: Vec<String> = ["T1", "Alice", "Bob", "100", "Pending"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! store.create_trade(&args).unwrap();
//!
//! let all = store.query_all_trades(&[]).unwrap();
//! assert!(all.starts_with(b"[{\"Key\":\"T1\""));
//! ```

use crate::{
    clock::{format_timestamp, Clock, SystemClock, DEFAULT_TIMEZONE},
    storage::{KeyValue, LedgerPort, LedgerResult},
    types::Trade,
    validation::{check_arity, trade_args, Operation},
    Config, Error, Result,
};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::value::RawValue;

/// Point query success payload
#[derive(Debug, Serialize)]
struct QueryResponse<'a> {
    #[serde(rename = "searchId")]
    search_id: &'a str,
    response: &'a RawValue,
}

/// Record store over a ledger
#[derive(Debug)]
pub struct TradeStore<L> {
    ledger: L,
    clock: Box<dyn Clock>,
    timezone: Tz,
    strict_status_transition: bool,
}

impl<L: LedgerPort> TradeStore<L> {
    /// Store with the wall clock, the default timezone and lenient transitions
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            clock: Box::new(SystemClock),
            timezone: DEFAULT_TIMEZONE,
            strict_status_transition: false,
        }
    }

    /// Store configured from `config`
    pub fn from_config(ledger: L, config: &Config) -> Result<Self> {
        Ok(Self::new(ledger)
            .with_timezone(config.timezone()?)
            .with_strict_status_transition(config.strict_status_transition))
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the timezone `ctime` is rendered in
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Make status transitions on missing keys fail with `RecordNotFound`
    pub fn with_strict_status_transition(mut self, strict: bool) -> Self {
        self.strict_status_transition = strict;
        self
    }

    /// Underlying ledger
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Instantiation-time create: `[id, fromParty, toParty, amount, status]`
    pub fn init(&self, args: &[String]) -> Result<()> {
        self.write_new_trade(Operation::Init, args)
    }

    /// Create or overwrite: `[id, fromParty, toParty, amount, status]`
    ///
    /// A repeated id replaces the earlier record, `ctime` included.
    pub fn create_trade(&self, args: &[String]) -> Result<()> {
        self.write_new_trade(Operation::CreateTrade, args)
    }

    fn write_new_trade(&self, operation: Operation, args: &[String]) -> Result<()> {
        let input = trade_args(operation, args)?;

        let trade = Trade {
            trade_id: input.trade_id.to_string(),
            from_party: input.from_party.to_string(),
            to_party: input.to_party.to_string(),
            amount: input.amount,
            status: input.status.to_string(),
            created_at: format_timestamp(self.clock.now(), self.timezone),
        };

        self.put_trade(operation, input.trade_id, &trade)?;

        tracing::debug!(
            operation = %operation,
            trade_id = %trade.trade_id,
            amount = trade.amount,
            "Trade written"
        );

        Ok(())
    }

    /// Status transition: `[id, statusHint]`
    ///
    /// The hint is accepted and ignored; status always becomes `InProgress`.
    /// Unless strict transitions are enabled, a missing key is not checked:
    /// a zero-valued trade with that status is written under `id`. An empty
    /// stored value counts as missing.
    pub fn update_status(&self, args: &[String]) -> Result<()> {
        let operation = Operation::UpdateStatus;
        check_arity(operation, args)?;
        let trade_id = args[0].as_str();

        let mut trade = match self.get_raw(operation.name(), trade_id)? {
            Some(bytes) => Trade::from_bytes(&bytes)?,
            None if self.strict_status_transition => {
                return Err(not_found(operation.name(), trade_id));
            }
            None => {
                tracing::warn!(trade_id, "Status transition on missing trade writes a blank record");
                Trade::default()
            }
        };

        trade.mark_in_progress();
        self.put_trade(operation, trade_id, &trade)?;

        tracing::debug!(trade_id, hint = %args[1], status = %trade.status, "Trade status updated");

        Ok(())
    }

    /// Point query: `[id]`
    ///
    /// Returns `{"searchId": id, "response": <stored trade>}`.
    pub fn query(&self, args: &[String]) -> Result<Vec<u8>> {
        let operation = Operation::Query;
        check_arity(operation, args)?;
        let trade_id = args[0].as_str();

        let bytes = match self.get_raw(operation.name(), trade_id)? {
            Some(bytes) => bytes,
            None => return Err(not_found(operation.name(), trade_id)),
        };

        let record: &RawValue = serde_json::from_slice(&bytes)?;
        let payload = serde_json::to_vec(&QueryResponse {
            search_id: trade_id,
            response: record,
        })?;

        tracing::debug!(trade_id, bytes = bytes.len(), "Trade queried");

        Ok(payload)
    }

    /// Range query over the whole key space, no arguments
    ///
    /// Keys holding an empty value are left out of the array.
    pub fn query_all_trades(&self, args: &[String]) -> Result<Vec<u8>> {
        let operation = Operation::QueryAllTrades;
        check_arity(operation, args)?;

        let scan = self.ledger.scan("", "").map_err(|e| Error::ScanFailure {
            operation: operation.name().to_string(),
            detail: e.to_string(),
        })?;

        let (payload, count) = assemble_records(scan)?;

        tracing::debug!(records = count, bytes = payload.len(), "Range query assembled");

        Ok(payload)
    }

    /// Typed read of one trade
    pub fn get_trade(&self, trade_id: &str) -> Result<Trade> {
        match self.get_raw(GET_TRADE, trade_id)? {
            Some(bytes) => Trade::from_bytes(&bytes),
            None => Err(not_found(GET_TRADE, trade_id)),
        }
    }

    /// Stored bytes for `trade_id`; an empty value reads as `None`
    fn get_raw(&self, operation: &str, trade_id: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .ledger
            .get(trade_id)
            .map_err(|e| Error::LedgerReadFailure {
                operation: operation.to_string(),
                key: trade_id.to_string(),
                detail: e.to_string(),
            })?;
        Ok(value.filter(|bytes| !bytes.is_empty()))
    }

    fn put_trade(&self, operation: Operation, trade_id: &str, trade: &Trade) -> Result<()> {
        let bytes = trade.to_bytes()?;
        self.ledger
            .put(trade_id, &bytes)
            .map_err(|e| Error::LedgerWriteFailure {
                operation: operation.name().to_string(),
                key: trade_id.to_string(),
                detail: e.to_string(),
            })
    }
}

/// Label for typed reads made outside the invokable operations
const GET_TRADE: &str = "getTrade";

fn not_found(operation: &str, trade_id: &str) -> Error {
    Error::RecordNotFound {
        operation: operation.to_string(),
        key: trade_id.to_string(),
    }
}

/// Build `[{"Key":..,"Record":..},...]` from a scan, in scan order.
///
/// The scan is consumed and dropped before returning on every path. The first
/// failed item aborts assembly and the partial buffer is discarded. Empty
/// values are skipped. Returns the array bytes and the number of members.
pub fn assemble_records<I>(scan: I) -> Result<(Vec<u8>, usize)>
where
    I: IntoIterator<Item = LedgerResult<KeyValue>>,
{
    let mut buffer = Vec::with_capacity(256);
    let mut count = 0usize;

    buffer.push(b'[');

    let scan_failure = |detail: String| Error::ScanFailure {
        operation: Operation::QueryAllTrades.name().to_string(),
        detail,
    };

    for item in scan {
        let (key, value) = item.map_err(|e| scan_failure(e.to_string()))?;
        if value.is_empty() {
            continue;
        }

        let record: &RawValue = serde_json::from_slice(&value).map_err(|e| {
            scan_failure(format!("record at key {:?} is not valid JSON: {}", key, e))
        })?;

        // Separator before every member but the first
        if count > 0 {
            buffer.push(b',');
        }

        buffer.extend_from_slice(b"{\"Key\":");
        serde_json::to_writer(&mut buffer, &key)?;
        buffer.extend_from_slice(b",\"Record\":");
        buffer.extend_from_slice(record.get().as_bytes());
        buffer.push(b'}');

        count += 1;
    }

    buffer.push(b']');

    Ok((buffer, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::MemoryLedger;
    use crate::storage::LedgerError;
    use crate::types::STATUS_IN_PROGRESS;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn test_store() -> TradeStore<MemoryLedger> {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 17, 15, 0).unwrap();
        TradeStore::new(MemoryLedger::new()).with_clock(FixedClock::new(instant))
    }

    #[test]
    fn test_create_and_query() {
        let store = test_store();
        store
            .create_trade(&args(&["T1", "Alice", "Bob", "100", "Pending"]))
            .unwrap();

        let payload: Value = serde_json::from_slice(&store.query(&args(&["T1"])).unwrap()).unwrap();
        assert_eq!(payload["searchId"], "T1");
        assert_eq!(
            payload["response"],
            serde_json::json!({
                "tradeID": "T1",
                "fromParty": "Alice",
                "toParty": "Bob",
                "amount": 100,
                "status": "Pending",
                "ctime": "2024-03-01 09:15:00",
            })
        );
    }

    #[test]
    fn test_init_shares_create_path() {
        let store = test_store();
        store.init(&args(&["T0", "Bank", "Fund", "0", "Open"])).unwrap();
        assert_eq!(store.get_trade("T0").unwrap().status, "Open");

        let err = store.init(&args(&["T0", "Bank", "Fund", "0", "Open", "extra"])).unwrap_err();
        assert!(err.to_string().contains("init"));
    }

    #[test]
    fn test_create_bad_amount_writes_nothing() {
        let store = test_store();
        let err = store
            .create_trade(&args(&["T1", "Alice", "Bob", "1OO", "Pending"]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { .. }));
        assert_eq!(store.ledger().write_count(), 0);
    }

    #[test]
    fn test_query_missing() {
        let store = test_store();
        let err = store.query(&args(&["nope"])).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { ref key, .. } if key == "nope"));
    }

    #[test]
    fn test_query_empty_value_is_not_found() {
        let store = test_store();
        store.ledger().put("blank", b"").unwrap();
        let err = store.query(&args(&["blank"])).unwrap_err();
        assert_eq!(err.kind(), "record_not_found");
    }

    #[test]
    fn test_empty_value_reads_as_missing() {
        let store = test_store();
        store.ledger().put("blank", b"").unwrap();

        let err = store.get_trade("blank").unwrap_err();
        assert!(matches!(
            err,
            Error::RecordNotFound { ref operation, ref key } if operation == "getTrade" && key == "blank"
        ));

        store
            .create_trade(&args(&["T1", "Alice", "Bob", "1", "Pending"]))
            .unwrap();
        let all: Value = serde_json::from_slice(&store.query_all_trades(&[]).unwrap()).unwrap();
        let keys: Vec<&str> = all
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["Key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["T1"]);
    }

    #[test]
    fn test_update_status_empty_value_writes_blank_record() {
        let store = test_store();
        store.ledger().put("blank", b"").unwrap();

        store.update_status(&args(&["blank", "x"])).unwrap();

        assert_eq!(
            store.get_trade("blank").unwrap(),
            Trade {
                status: STATUS_IN_PROGRESS.to_string(),
                ..Trade::default()
            }
        );
    }

    #[test]
    fn test_update_status_strict_rejects_empty_value() {
        let store = test_store().with_strict_status_transition(true);
        store.ledger().put("blank", b"").unwrap();
        let writes = store.ledger().write_count();

        let err = store.update_status(&args(&["blank", "x"])).unwrap_err();
        assert_eq!(err.kind(), "record_not_found");
        assert_eq!(store.ledger().write_count(), writes);
        assert_eq!(store.ledger().get("blank").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_not_found_names_operation() {
        let store = test_store().with_strict_status_transition(true);

        let err = store.update_status(&args(&["ghost", "x"])).unwrap_err();
        assert_eq!(err.to_string(), "updateStatus: no response for trade ghost");

        let err = store.query(&args(&["ghost"])).unwrap_err();
        assert_eq!(err.to_string(), "query: no response for trade ghost");
    }

    #[test]
    fn test_update_status_ignores_hint() {
        let store = test_store();
        store
            .create_trade(&args(&["T1", "Alice", "Bob", "100", "Pending"]))
            .unwrap();
        let before = store.get_trade("T1").unwrap();

        store.update_status(&args(&["T1", "Settled"])).unwrap();

        let after = store.get_trade("T1").unwrap();
        assert_eq!(after.status, STATUS_IN_PROGRESS);
        assert_eq!(Trade { status: before.status.clone(), ..after }, before);
    }

    #[test]
    fn test_update_status_missing_key_writes_blank_record() {
        // No existence check by default: the write creates a zero-valued trade.
        let store = test_store();
        store.update_status(&args(&["ghost", "x"])).unwrap();

        let trade = store.get_trade("ghost").unwrap();
        assert_eq!(
            trade,
            Trade {
                status: STATUS_IN_PROGRESS.to_string(),
                ..Trade::default()
            }
        );
    }

    #[test]
    fn test_update_status_strict_rejects_missing_key() {
        let store = test_store().with_strict_status_transition(true);
        let err = store.update_status(&args(&["ghost", "x"])).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { .. }));
        assert_eq!(store.ledger().write_count(), 0);
    }

    #[test]
    fn test_update_status_corrupt_record() {
        let store = test_store();
        store.ledger().put("T1", b"{broken").unwrap();
        let err = store.update_status(&args(&["T1", "x"])).unwrap_err();
        assert_eq!(err.kind(), "serialization");
        assert_eq!(store.ledger().get("T1").unwrap(), Some(b"{broken".to_vec()));
    }

    #[test]
    fn test_assemble_empty() {
        let (payload, count) = assemble_records(Vec::new()).unwrap();
        assert_eq!(payload, b"[]");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_assemble_escapes_key_but_not_record() {
        let items = vec![Ok(("a\"b".to_string(), br#"{"x":"y"}"#.to_vec()))];
        let (payload, _) = assemble_records(items).unwrap();
        assert_eq!(
            String::from_utf8(payload).unwrap(),
            r#"[{"Key":"a\"b","Record":{"x":"y"}}]"#
        );
    }

    #[test]
    fn test_assemble_stops_at_failure() {
        let items = vec![
            Ok(("a".to_string(), b"{}".to_vec())),
            Err(LedgerError::new("disk on fire")),
            Ok(("c".to_string(), b"{}".to_vec())),
        ];
        let err = assemble_records(items).unwrap_err();
        assert!(matches!(
            err,
            Error::ScanFailure { ref operation, ref detail }
                if operation == "queryAllTrades" && detail.contains("disk on fire")
        ));
    }

    #[test]
    fn test_assemble_skips_empty_values() {
        let items = vec![
            Ok(("a".to_string(), b"{}".to_vec())),
            Ok(("b".to_string(), Vec::new())),
            Ok(("c".to_string(), b"{}".to_vec())),
        ];
        let (payload, count) = assemble_records(items).unwrap();
        assert_eq!(payload, br#"[{"Key":"a","Record":{}},{"Key":"c","Record":{}}]"#);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_assemble_rejects_non_json_record() {
        let items = vec![Ok(("a".to_string(), b"plain text".to_vec()))];
        let err = assemble_records(items).unwrap_err();
        assert_eq!(err.kind(), "scan_failure");
    }

    #[test]
    fn test_query_all_rejects_arguments() {
        let store = test_store();
        let err = store.query_all_trades(&args(&["x"])).unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");
        assert_eq!(store.ledger().open_scans(), 0);
    }
}

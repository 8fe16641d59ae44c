//! Argument validation
//!
//! Every operation declares a fixed argument count. Checks here never touch
//! the ledger, so a rejected call leaves it exactly as it was.

use crate::{Error, Result};
use std::fmt;

/// Store operations and their declared arity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Instantiation-time create
    Init,
    /// Create or overwrite a trade
    CreateTrade,
    /// Dump every stored trade
    QueryAllTrades,
    /// Force status to `InProgress`
    UpdateStatus,
    /// Read one trade
    Query,
}

impl Operation {
    /// Operations reachable through the dispatcher
    pub const INVOKABLE: [Operation; 4] = [
        Operation::CreateTrade,
        Operation::QueryAllTrades,
        Operation::UpdateStatus,
        Operation::Query,
    ];

    /// Name callers use
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::CreateTrade => "createTrade",
            Operation::QueryAllTrades => "queryAllTrades",
            Operation::UpdateStatus => "updateStatus",
            Operation::Query => "query",
        }
    }

    /// Other names existing clients call this operation by
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Operation::CreateTrade => &["createCar"],
            _ => &[],
        }
    }

    /// Required argument count
    pub fn arity(&self) -> usize {
        match self {
            Operation::Init | Operation::CreateTrade => 5,
            Operation::UpdateStatus => 2,
            Operation::Query => 1,
            Operation::QueryAllTrades => 0,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fail with `InvalidArguments` unless `args` has the declared length
pub fn check_arity(operation: Operation, args: &[String]) -> Result<()> {
    if args.len() != operation.arity() {
        return Err(Error::InvalidArguments {
            operation: operation.name().to_string(),
            expected: operation.arity(),
            actual: args.len(),
        });
    }
    Ok(())
}

/// Parse a base-10 amount
pub fn parse_amount(operation: Operation, raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| Error::InvalidAmount {
        operation: operation.name().to_string(),
        value: raw.to_string(),
    })
}

/// Validated `[id, fromParty, toParty, amount, status]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeArgs<'a> {
    /// Ledger key
    pub trade_id: &'a str,
    /// Sending party
    pub from_party: &'a str,
    /// Receiving party
    pub to_party: &'a str,
    /// Parsed amount
    pub amount: i64,
    /// Initial status
    pub status: &'a str,
}

/// Validate create/init arguments
pub fn trade_args(operation: Operation, args: &[String]) -> Result<TradeArgs<'_>> {
    check_arity(operation, args)?;
    let amount = parse_amount(operation, &args[3])?;

    Ok(TradeArgs {
        trade_id: &args[0],
        from_party: &args[1],
        to_party: &args[2],
        amount,
        status: &args[4],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_arity_mismatch() {
        for op in Operation::INVOKABLE {
            let too_many = vec!["x".to_string(); op.arity() + 1];
            let err = check_arity(op, &too_many).unwrap_err();
            match err {
                Error::InvalidArguments {
                    operation,
                    expected,
                    actual,
                } => {
                    assert_eq!(operation, op.name());
                    assert_eq!(expected, op.arity());
                    assert_eq!(actual, op.arity() + 1);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_trade_args() {
        let input = args(&["T1", "Alice", "Bob", "-250", "Pending"]);
        let parsed = trade_args(Operation::CreateTrade, &input).unwrap();
        assert_eq!(parsed.trade_id, "T1");
        assert_eq!(parsed.amount, -250);
        assert_eq!(parsed.status, "Pending");
    }

    #[test]
    fn test_amount_must_be_integer() {
        for bad in ["", "12.5", "1e3", " 7", "ten", "99999999999999999999"] {
            let input = args(&["T1", "Alice", "Bob", bad, "Pending"]);
            let err = trade_args(Operation::Init, &input).unwrap_err();
            assert!(
                matches!(&err, Error::InvalidAmount { value, .. } if value == bad),
                "{bad:?} gave {err}"
            );
        }
    }

    #[test]
    fn test_arity_checked_before_amount() {
        let input = args(&["T1", "Alice", "Bob", "ten"]);
        let err = trade_args(Operation::CreateTrade, &input).unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");
    }
}

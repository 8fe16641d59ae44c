//! Operation dispatch
//!
//! Hosts call [`Dispatcher::invoke`] with an operation name and its string
//! arguments. The name is looked up in a table of handlers; a miss is the
//! single `UnknownOperation` branch. Handlers validate their own arguments.
//!
//! ```text
//! (name, args) ──► handler table ──► TradeStore ──► LedgerPort
//!                      │ miss
//!                      ▼
//!              UnknownOperation
//! ```

use crate::{
    metrics::Metrics, storage::LedgerPort, store::TradeStore, validation::Operation, Error,
    Result,
};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// Success payload; `None` for operations that return nothing
pub type Payload = Option<Vec<u8>>;

type Handler<L> = fn(&TradeStore<L>, &[String]) -> Result<Payload>;

fn create_trade<L: LedgerPort>(store: &TradeStore<L>, args: &[String]) -> Result<Payload> {
    store.create_trade(args).map(|()| None)
}

fn query_all_trades<L: LedgerPort>(store: &TradeStore<L>, args: &[String]) -> Result<Payload> {
    store.query_all_trades(args).map(Some)
}

fn update_status<L: LedgerPort>(store: &TradeStore<L>, args: &[String]) -> Result<Payload> {
    store.update_status(args).map(|()| None)
}

fn query<L: LedgerPort>(store: &TradeStore<L>, args: &[String]) -> Result<Payload> {
    store.query(args).map(Some)
}

/// Routes named invocations to the store
pub struct Dispatcher<L> {
    store: TradeStore<L>,
    handlers: HashMap<&'static str, Handler<L>>,
    metrics: Option<Metrics>,
}

impl<L: fmt::Debug> fmt::Debug for Dispatcher<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations: Vec<_> = self.handlers.keys().collect();
        operations.sort();
        f.debug_struct("Dispatcher")
            .field("store", &self.store)
            .field("operations", &operations)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl<L: LedgerPort> Dispatcher<L> {
    /// Dispatcher over `store` with the standard operation table
    pub fn new(store: TradeStore<L>) -> Self {
        let mut handlers: HashMap<&'static str, Handler<L>> = HashMap::new();
        for operation in Operation::INVOKABLE {
            let handler: Handler<L> = match operation {
                Operation::CreateTrade => create_trade::<L>,
                Operation::QueryAllTrades => query_all_trades::<L>,
                Operation::UpdateStatus => update_status::<L>,
                Operation::Query => query::<L>,
                Operation::Init => continue,
            };
            handlers.insert(operation.name(), handler);
            for alias in operation.aliases() {
                handlers.insert(*alias, handler);
            }
        }

        Self {
            store,
            handlers,
            metrics: None,
        }
    }

    /// Record invocations in `metrics`
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Attached metrics, if any
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Underlying store
    pub fn store(&self) -> &TradeStore<L> {
        &self.store
    }

    /// Names `invoke` accepts, sorted
    pub fn operations(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run the instantiation-time create
    pub fn init(&self, args: &[String]) -> Result<()> {
        let _span = tracing::debug_span!("init", args = args.len()).entered();

        let started = Instant::now();
        let result = self.store.init(args);
        self.observe(Operation::Init.name(), started, &result);
        result
    }

    /// Run `operation` with `args`
    pub fn invoke(&self, operation: &str, args: &[String]) -> Result<Payload> {
        let _span = tracing::debug_span!("invoke", operation, args = args.len()).entered();

        let handler = match self.handlers.get(operation) {
            Some(handler) => *handler,
            None => {
                let err = Error::UnknownOperation(operation.to_string());
                tracing::warn!(operation, "Unknown operation");
                if let Some(metrics) = &self.metrics {
                    metrics.record_error("unknown", err.kind());
                }
                return Err(err);
            }
        };

        let started = Instant::now();
        let result = handler(&self.store, args);
        self.observe(operation, started, &result);
        result
    }

    fn observe<T>(&self, operation: &str, started: Instant, result: &Result<T>) {
        if let Err(err) = result {
            tracing::warn!(operation, kind = err.kind(), error = %err, "Invocation failed");
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_operation(operation, started.elapsed().as_secs_f64());
            if let Err(err) = result {
                metrics.record_error(operation, err.kind());
            }
        }
    }
}

//! Creation timestamps
//!
//! `ctime` is a pure function of the current instant and a configured IANA
//! zone. The instant comes from a [`Clock`] so tests can pin it.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Textual layout of `ctime`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Zone used when none is configured
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

/// Source of the current instant
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Freeze at `instant`
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Render `instant` as local time in `tz`
pub fn format_timestamp(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string()
}

/// Parse an IANA zone name such as `America/Los_Angeles`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| Error::Config(format!("Unknown timezone {:?}: {}", name, e)))
}

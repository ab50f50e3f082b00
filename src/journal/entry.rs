use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::format_description::{self, OwnedFormatItem};
use time::{Duration, OffsetDateTime};

pub const DEFAULT_DATE_FORMAT: &str =
    "[weekday], [month repr:long] [day padding:none], [year] at [hour repr:12]:[minute] [period]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub date: String,
    pub title: String,
    pub content: String,
}

/// The two input fields of the save form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub content: String,
}

impl Draft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn clear(&mut self) {
        self.title.clear();
        self.content.clear();
    }
}

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Clock pinned to an instant that only moves by `advance`. Clones share it.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

#[derive(Debug, Clone)]
pub struct DateFormatter {
    items: OwnedFormatItem,
}

impl DateFormatter {
    pub fn parse(pattern: &str) -> Result<Self, time::error::InvalidFormatDescription> {
        let items = format_description::parse_owned::<2>(pattern)?;
        Ok(Self { items })
    }

    pub fn format(&self, at: OffsetDateTime) -> String {
        at.format(&self.items)
            .unwrap_or_else(|_| at.unix_timestamp().to_string())
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        // The default pattern is a constant known to parse.
        match Self::parse(DEFAULT_DATE_FORMAT) {
            Ok(formatter) => formatter,
            Err(_) => Self {
                items: OwnedFormatItem::Compound(Box::new([])),
            },
        }
    }
}

pub fn timestamp_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Creation-timestamp id, bumped past the largest existing id so two saves
/// inside the same millisecond stay distinct. When the largest id is
/// `i64::MAX`, the first unused id at or below the timestamp is taken.
pub fn next_id(existing: &[Entry], at: OffsetDateTime) -> i64 {
    let candidate = timestamp_millis(at);
    match existing.iter().map(|entry| entry.id).max() {
        Some(max) if max >= candidate => max
            .checked_add(1)
            .unwrap_or_else(|| unused_id_below(existing, candidate)),
        _ => candidate,
    }
}

fn unused_id_below(existing: &[Entry], start: i64) -> i64 {
    let taken: HashSet<i64> = existing.iter().map(|entry| entry.id).collect();
    (i64::MIN..=start)
        .rev()
        .find(|id| !taken.contains(id))
        .unwrap_or(i64::MIN)
}

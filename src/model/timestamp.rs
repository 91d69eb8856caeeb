use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Seconds and nanoseconds since the Unix epoch, kept normalized so that
/// `0 <= nanos < 1e9`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        let mut timestamp = Self { seconds, nanos };
        timestamp.normalize();
        timestamp
    }

    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        Self::new(time.timestamp(), time.timestamp_subsec_nanos() as i32)
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanos as u32).single()
    }

    /// RFC 3339 rendering used in log lines.
    pub fn to_rfc3339(&self) -> String {
        match self.to_datetime() {
            Some(time) => time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            None => format!("{}.{:09}s", self.seconds, self.nanos),
        }
    }

    fn normalize(&mut self) {
        let extra_seconds = self.nanos.div_euclid(NANOS_PER_SECOND);
        self.seconds += extra_seconds as i64;
        self.nanos = self.nanos.rem_euclid(NANOS_PER_SECOND);
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.seconds.cmp(&other.seconds) {
            Ordering::Equal => self.nanos.cmp(&other.nanos),
            ordering => ordering,
        }
    }
}

//! Arrival-time interval filtering.
//!
//! An [`Interval`] is an open time range built from the `-a`/`-b` command
//! line boundaries. Each boundary accepts several syntaxes (see
//! [`Interval::resolve_at`]); relative ones like `"10m"` are anchored to
//! a single "now" captured at first resolution and cached, so every
//! record in a run is judged against the same reference time.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::error::{MailqfError, Result};

/// Seconds per relative-boundary unit.
fn unit_seconds(unit: char) -> Option<i64> {
    match unit.to_ascii_lowercase() {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(3600),
        'd' => Some(86400),
        _ => None,
    }
}

/// An open time range `(after, before)` in epoch seconds.
///
/// Boundary strings are kept verbatim and resolved to timestamps once,
/// on first use. An empty boundary means "unbounded" on that side.
/// `after >= before` is not rejected; such an interval simply matches
/// nothing.
#[derive(Debug, Default)]
pub struct Interval {
    after: String,
    before: String,
    resolved: OnceLock<(i64, i64)>,
}

impl Clone for Interval {
    fn clone(&self) -> Self {
        let copy = Self {
            after: self.after.clone(),
            before: self.before.clone(),
            resolved: OnceLock::new(),
        };
        // Carry the memoized bounds so a clone keeps the same "now" anchor.
        if let Some(&bounds) = self.resolved.get() {
            let _ = copy.resolved.set(bounds);
        }
        copy
    }
}

impl Interval {
    /// Build an interval from optional boundary strings.
    pub fn new(after: Option<&str>, before: Option<&str>) -> Self {
        Self {
            after: after.unwrap_or_default().trim().to_string(),
            before: before.unwrap_or_default().trim().to_string(),
            resolved: OnceLock::new(),
        }
    }

    /// Resolve both boundaries against the given reference time, memoized.
    ///
    /// Boundary syntaxes, tried in order:
    /// 1. empty → unbounded (`i64::MIN` / `i64::MAX`)
    /// 2. all digits → absolute epoch seconds
    /// 3. `<digits><s|m|h|d>` (case-insensitive) → `now - digits * unit`
    /// 4. ISO 8601 calendar date or date-time, interpreted as UTC
    ///
    /// The first successful resolution wins; later calls return the cached
    /// bounds regardless of `now`.
    pub fn resolve_at(&self, now: i64) -> Result<(i64, i64)> {
        if let Some(&bounds) = self.resolved.get() {
            return Ok(bounds);
        }
        let bounds = (
            parse_boundary(&self.after, i64::MIN, now)?,
            parse_boundary(&self.before, i64::MAX, now)?,
        );
        debug!("Arrival interval resolved to ({}, {})", bounds.0, bounds.1);
        Ok(*self.resolved.get_or_init(|| bounds))
    }

    /// Force resolution now so that bad boundary strings fail before any
    /// record is read. Also pins the "now" anchor for relative boundaries.
    pub fn validate(&self) -> Result<()> {
        self.resolve_at(Utc::now().timestamp()).map(|_| ())
    }

    /// True iff `after < timestamp < before`. Both ends are exclusive.
    pub fn within(&self, timestamp: i64) -> bool {
        match self.resolve_at(Utc::now().timestamp()) {
            Ok((after, before)) => after < timestamp && timestamp < before,
            // validate() runs at configuration time, so this arm is only
            // reachable when the caller skipped it.
            Err(e) => {
                debug!("Interval resolution failed: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.after, self.before)
    }
}

/// Parse a single boundary string. See [`Interval::resolve_at`].
fn parse_boundary(spec: &str, default: i64, now: i64) -> Result<i64> {
    if spec.is_empty() {
        return Ok(default);
    }
    if spec.bytes().all(|b| b.is_ascii_digit()) {
        return spec
            .parse::<i64>()
            .map_err(|_| MailqfError::InvalidBoundary(spec.to_string()));
    }
    if let Some(seconds) = parse_relative(spec) {
        return Ok(now - seconds);
    }
    parse_calendar(spec).ok_or_else(|| MailqfError::InvalidBoundary(spec.to_string()))
}

/// Parse `<digits><s|m|h|d>` into a second count, or `None`.
fn parse_relative(spec: &str) -> Option<i64> {
    let unit = spec.chars().last()?;
    let factor = unit_seconds(unit)?;
    let digits = &spec[..spec.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().map(|n| n * factor)
}

/// Parse an ISO 8601 calendar date or date-time, interpreted as UTC.
fn parse_calendar(spec: &str) -> Option<i64> {
    const DATETIME_FMTS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in DATETIME_FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(spec, fmt) {
            return Some(naive.and_utc().timestamp());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(spec, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
    }
    None
}

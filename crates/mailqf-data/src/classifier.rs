//! The record predicate: decides whether one queue record matches the
//! configured filter combination.

use mailqf_core::models::{QueueRecord, RecipientEntry};
use mailqf_core::settings::FilterConfig;
use serde_json::Value;
use tracing::debug;

/// Composes the queue-name, sender, recipient, and arrival-time
/// predicates over a shared [`FilterConfig`]. Stateless: classifying a
/// record mutates nothing, so the same record always yields the same
/// answer.
pub struct RecordClassifier<'a> {
    config: &'a FilterConfig,
}

impl<'a> RecordClassifier<'a> {
    pub fn new(config: &'a FilterConfig) -> Self {
        Self { config }
    }

    /// Logical AND of all four predicates. A record without a
    /// `queue_name` element is malformed and fails immediately (the
    /// accessor logs it).
    pub fn record_matches(&self, record: &QueueRecord) -> bool {
        let Some(name) = record.queue_name() else {
            return false;
        };
        self.config.qname.matches(name)
            && self.config.sender.matches(record.sender())
            && self.rcpt_matches(record.recipients())
            && self.config.interval.within(record.arrival_time())
    }

    /// True if one recipient matches both the address and the delay
    /// reason filter.
    ///
    /// The two checks are correlated per recipient: a single entry must
    /// satisfy both, and the first one that does wins. A recipient
    /// without delay data only counts as a reason match when no reason
    /// filter was requested, so absence of delay metadata never
    /// excludes a record the user did not ask to narrow down.
    pub fn rcpt_matches(&self, recipients: &[Value]) -> bool {
        for rcpt in recipients {
            if !self.config.rcpt.matches(rcpt.address()) {
                continue;
            }
            match rcpt.delay_reason() {
                Some(reason) if self.config.reason.matches(reason) => return true,
                Some(reason) => {
                    debug!(
                        "\"{}\" does not satisfy reason filter \"{}\"",
                        reason,
                        self.config.reason.source()
                    );
                }
                None if self.config.reason.is_match_any() => return true,
                None => {}
            }
        }
        false
    }
}

//! Typed views over raw `postqueue -j` records.
//!
//! Records are kept as [`serde_json::Value`] so that matching records can
//! be echoed to the output verbatim, including fields this tool never
//! inspects (`message_size`, `forced_expire`, ...). The accessors below
//! pull out just the attributes the classifier and reporter need.

use serde_json::Value;
use tracing::error;

/// JSON field names used by the queue inspection tool.
pub const FIELD_QUEUE_NAME: &str = "queue_name";
pub const FIELD_QUEUE_ID: &str = "queue_id";
pub const FIELD_SENDER: &str = "sender";
pub const FIELD_ARRIVAL_TIME: &str = "arrival_time";
pub const FIELD_RECIPIENTS: &str = "recipients";
pub const FIELD_ADDRESS: &str = "address";
pub const FIELD_DELAY_REASON: &str = "delay_reason";

/// One decoded queue record. Read-only wrapper over the raw JSON object.
#[derive(Debug, Clone)]
pub struct QueueRecord(Value);

impl QueueRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON value, for verbatim output.
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// The queue name. Doubles as a sanity check: valid queue data must
    /// contain this attribute, so absence is logged as malformed input.
    pub fn queue_name(&self) -> Option<&str> {
        let name = self.0.get(FIELD_QUEUE_NAME).and_then(Value::as_str);
        if name.is_none() {
            error!(
                "Malformed input data: element \"{}\" is missing",
                FIELD_QUEUE_NAME
            );
        }
        name
    }

    pub fn queue_id(&self) -> &str {
        self.0
            .get(FIELD_QUEUE_ID)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn sender(&self) -> &str {
        self.0
            .get(FIELD_SENDER)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Message arrival time in seconds since the Unix epoch.
    pub fn arrival_time(&self) -> i64 {
        self.0
            .get(FIELD_ARRIVAL_TIME)
            .and_then(Value::as_i64)
            .unwrap_or_default()
    }

    /// Recipient entries, in input order. Missing or non-array
    /// `recipients` yields an empty slice.
    pub fn recipients(&self) -> &[Value] {
        self.0
            .get(FIELD_RECIPIENTS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Accessors for one entry of a record's recipient list.
pub trait RecipientEntry {
    fn address(&self) -> &str;
    fn delay_reason(&self) -> Option<&str>;
}

impl RecipientEntry for Value {
    fn address(&self) -> &str {
        self.get(FIELD_ADDRESS)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Absence is meaningful: the recipient evaluator only requires a
    /// reason match when a reason filter was explicitly requested.
    fn delay_reason(&self) -> Option<&str> {
        self.get(FIELD_DELAY_REASON).and_then(Value::as_str)
    }
}

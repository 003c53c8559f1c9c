//! The per-run processing loop.
//!
//! Drives every input source through decode → classify → route. Matching
//! records either feed the report tally or are written out immediately;
//! the report itself is emitted only after all input is consumed.

use std::io::{BufRead, Write};

use mailqf_core::error::Result;
use mailqf_core::models::QueueRecord;
use mailqf_core::settings::{FilterConfig, ReportKind};
use tracing::warn;

use crate::classifier::RecordClassifier;
use crate::reader::{decode_record, open_input};
use crate::report::{ReportTally, SortOrder};

/// One filtering/reporting run over a list of input sources.
pub struct Pipeline<'a> {
    config: &'a FilterConfig,
    classifier: RecordClassifier<'a>,
    tally: ReportTally,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a FilterConfig) -> Self {
        Self {
            config,
            classifier: RecordClassifier::new(config),
            tally: ReportTally::new(),
        }
    }

    /// Process all inputs in order, writing results to `out`.
    ///
    /// A line that cannot be read or decoded, or a record without a
    /// `queue_name`, is logged and skipped; the run continues but the
    /// returned flag turns `false` so the caller can surface a non-zero
    /// exit status. Only configuration and output I/O errors abort.
    pub fn run(&mut self, inputs: &[String], out: &mut dyn Write) -> Result<bool> {
        let mut clean = true;
        for path in inputs {
            let reader = match open_input(path) {
                Ok(r) => r,
                Err(e) => {
                    warn!("{}", e);
                    clean = false;
                    continue;
                }
            };
            for line in reader.lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("Read error in {}: {}", path, e);
                        clean = false;
                        continue;
                    }
                };
                match decode_record(&line) {
                    Ok(Some(record)) => {
                        if !self.process_record(&record, out)? {
                            clean = false;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Skipping undecodable line in {}: {}", path, e);
                        clean = false;
                    }
                }
            }
        }
        if self.config.report.is_some() {
            self.tally.write_to(out, SortOrder::Ascending)?;
        }
        Ok(clean)
    }

    /// Classify one record and route it. Returns `false` for malformed
    /// records (missing `queue_name`).
    fn process_record(&mut self, record: &QueueRecord, out: &mut dyn Write) -> Result<bool> {
        if record.queue_name().is_none() {
            return Ok(false);
        }
        if !self.classifier.record_matches(record) {
            return Ok(true);
        }
        match self.config.report {
            Some(kind) => match kind.recipient_field() {
                Some(field) => {
                    self.tally
                        .add_recipients(record.recipients(), field, kind.separator());
                }
                None => {
                    self.tally
                        .add(record_value(record, kind), kind.separator());
                }
            },
            None => {
                writeln!(out, "{}", self.format_output(record))?;
            }
        }
        Ok(true)
    }

    /// Either the full record as one JSON line, or only its queue ID.
    fn format_output(&self, record: &QueueRecord) -> String {
        if self.config.queue_id_only {
            record.queue_id().to_string()
        } else {
            record.raw().to_string()
        }
    }
}

/// The record-level attribute a report kind aggregates. Recipient-level
/// kinds are handled by [`ReportTally::add_recipients`] instead.
fn record_value(record: &QueueRecord, kind: ReportKind) -> &str {
    match kind {
        ReportKind::Qname => record.queue_name().unwrap_or_default(),
        ReportKind::Sender | ReportKind::Sdom => record.sender(),
        ReportKind::Rcpt | ReportKind::Rdom | ReportKind::Reason => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailqf_core::settings::{FilterConfig, ReportKind, Settings};
    use std::io::Write as _;
    use tempfile::TempDir;

    fn config_from(args: &[&str]) -> FilterConfig {
        use clap::Parser as _;
        let settings = Settings::try_parse_from(args).expect("argument parsing");
        FilterConfig::from_settings(&settings).expect("config compilation")
    }

    fn sample_line(qname: &str, sender: &str, arrival: i64) -> String {
        serde_json::json!({
            "queue_name": qname,
            "queue_id": format!("ID-{}-{}", qname, arrival),
            "arrival_time": arrival,
            "sender": sender,
            "recipients": [
                {
                    "address": "carol@example.com",
                    "delay_reason": "connect to mail.example.com[1.2.3.4]:25: Connection timed out"
                },
                {"address": "ned@example.net", "delay_reason": "Recipient is over quota"},
            ]
        })
        .to_string()
    }

    fn write_input(dir: &TempDir, name: &str, lines: &[&str]) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path.to_string_lossy().into_owned()
    }

    fn run(config: &FilterConfig, inputs: &[String]) -> (bool, String) {
        let mut out = Vec::new();
        let clean = Pipeline::new(config).run(inputs, &mut out).unwrap();
        (clean, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_passthrough_outputs_full_records() {
        let dir = TempDir::new().unwrap();
        let line = sample_line("deferred", "alice@example.org", 1_642_751_523);
        let input = write_input(&dir, "q.json", &[&line]);

        let config = config_from(&["mailqf"]);
        let (clean, output) = run(&config, &[input]);

        assert!(clean);
        let parsed: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(parsed["queue_name"], "deferred");
        assert_eq!(parsed["sender"], "alice@example.org");
    }

    #[test]
    fn test_queue_id_only_mode() {
        let dir = TempDir::new().unwrap();
        let line = sample_line("deferred", "alice@example.org", 100);
        let input = write_input(&dir, "q.json", &[&line]);

        let config = config_from(&["mailqf", "-i"]);
        let (_, output) = run(&config, &[input]);
        assert_eq!(output, "ID-deferred-100\n");
    }

    #[test]
    fn test_non_matching_records_excluded() {
        let dir = TempDir::new().unwrap();
        let deferred = sample_line("deferred", "alice@example.org", 100);
        let active = sample_line("active", "bob@example.org", 100);
        let input = write_input(&dir, "q.json", &[&deferred, &active]);

        let config = config_from(&["mailqf", "-i", "-q", "^deferred$"]);
        let (clean, output) = run(&config, &[input]);
        assert!(clean);
        assert_eq!(output, "ID-deferred-100\n");
    }

    #[test]
    fn test_undecodable_line_skipped_and_flagged() {
        let dir = TempDir::new().unwrap();
        let good = sample_line("deferred", "alice@example.org", 100);
        let input = write_input(&dir, "q.json", &["{not valid json{{", &good, ""]);

        let config = config_from(&["mailqf", "-i"]);
        let (clean, output) = run(&config, &[input]);
        assert!(!clean);
        assert_eq!(output, "ID-deferred-100\n");
    }

    #[test]
    fn test_malformed_record_excluded_and_flagged() {
        let dir = TempDir::new().unwrap();
        // Valid JSON but missing queue_name: must never reach the output
        // or the tally.
        let input = write_input(
            &dir,
            "q.json",
            &[r#"{"queue_id": "orphan", "sender": "x@y", "arrival_time": 1, "recipients": []}"#],
        );

        let config = config_from(&["mailqf", "-i"]);
        let (clean, output) = run(&config, &[input.clone()]);
        assert!(!clean);
        assert!(output.is_empty());

        let config = config_from(&["mailqf", "--report", "qname"]);
        let (clean, output) = run(&config, &[input]);
        assert!(!clean);
        assert!(output.is_empty());
    }

    #[test]
    fn test_missing_input_file_flagged_but_run_continues() {
        let dir = TempDir::new().unwrap();
        let good = sample_line("deferred", "alice@example.org", 100);
        let input = write_input(&dir, "q.json", &[&good]);

        let config = config_from(&["mailqf", "-i"]);
        let (clean, output) = run(
            &config,
            &["/tmp/does-not-exist-mailqf-xyz".to_string(), input],
        );
        assert!(!clean);
        assert_eq!(output, "ID-deferred-100\n");
    }

    #[test]
    fn test_inputs_processed_in_order() {
        let dir = TempDir::new().unwrap();
        let first = write_input(&dir, "a.json", &[&sample_line("deferred", "a@x", 1)]);
        let second = write_input(&dir, "b.json", &[&sample_line("deferred", "b@x", 2)]);

        let config = config_from(&["mailqf", "-i"]);
        let (_, output) = run(&config, &[first, second]);
        assert_eq!(output, "ID-deferred-1\nID-deferred-2\n");
    }

    #[test]
    fn test_report_qname() {
        let dir = TempDir::new().unwrap();
        let lines = [
            sample_line("deferred", "a@x", 1),
            sample_line("deferred", "b@x", 2),
            sample_line("active", "c@x", 3),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let input = write_input(&dir, "q.json", &refs);

        let config = config_from(&["mailqf", "--report", "qname"]);
        let (clean, output) = run(&config, &[input]);
        assert!(clean);
        assert_eq!(output, "1 active\n2 deferred\n");
    }

    #[test]
    fn test_report_sender_domain() {
        let dir = TempDir::new().unwrap();
        let lines = [
            sample_line("deferred", "alice@ham", 1),
            sample_line("deferred", "bob@ham", 2),
            sample_line("deferred", "chris@eggs", 3),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let input = write_input(&dir, "q.json", &refs);

        let config = config_from(&["mailqf", "--report", "sdom"]);
        let (_, output) = run(&config, &[input]);
        assert_eq!(output, "1 eggs\n2 ham\n");
    }

    #[test]
    fn test_report_recipient_domain_counts_per_recipient() {
        let dir = TempDir::new().unwrap();
        // Each record has recipients at example.com and example.net.
        let lines = [
            sample_line("deferred", "a@x", 1),
            sample_line("deferred", "b@x", 2),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let input = write_input(&dir, "q.json", &refs);

        let config = config_from(&["mailqf", "--report", "rdom"]);
        let (_, output) = run(&config, &[input]);
        assert_eq!(output, "2 example.com\n2 example.net\n");
    }

    #[test]
    fn test_report_reason() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "q.json", &[&sample_line("deferred", "a@x", 1)]);

        let config = config_from(&["mailqf", "--report", "reason"]);
        let (_, output) = run(&config, &[input]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|l| l.ends_with("Recipient is over quota")));
        assert!(lines.iter().all(|l| l.starts_with("1 ")));
    }

    #[test]
    fn test_report_only_covers_matching_records() {
        let dir = TempDir::new().unwrap();
        let lines = [
            sample_line("deferred", "a@x", 1),
            sample_line("hold", "b@x", 2),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let input = write_input(&dir, "q.json", &refs);

        let config = config_from(&["mailqf", "-q", "^hold$", "--report", "qname"]);
        let (_, output) = run(&config, &[input]);
        assert_eq!(output, "1 hold\n");
    }

    #[test]
    fn test_report_kind_plumbs_into_config() {
        let config = config_from(&["mailqf", "--report", "rcpt"]);
        assert_eq!(config.report, Some(ReportKind::Rcpt));
    }

    #[test]
    fn test_empty_report_emits_nothing() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "q.json", &[]);
        let config = config_from(&["mailqf", "--report", "qname"]);
        let (clean, output) = run(&config, &[input]);
        assert!(clean);
        assert!(output.is_empty());
    }

    #[test]
    fn test_arrival_filter_in_pipeline() {
        let dir = TempDir::new().unwrap();
        let lines = [
            sample_line("deferred", "a@x", 100),
            sample_line("deferred", "b@x", 200),
        ];
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let input = write_input(&dir, "q.json", &refs);

        let config = config_from(&["mailqf", "-i", "-a", "150"]);
        let (_, output) = run(&config, &[input]);
        assert_eq!(output, "ID-deferred-200\n");
    }
}

//! Command line surface and the immutable run configuration.
//!
//! [`Settings`] is the raw clap-parsed argument set; [`FilterConfig`] is
//! the compiled form (patterns built, interval validated) assembled once
//! in `main` and passed by reference into the classifier and pipeline.

use clap::{Parser, ValueEnum};

use crate::error::Result;
use crate::interval::Interval;
use crate::models::{FIELD_ADDRESS, FIELD_DELAY_REASON};
use crate::pattern::Pattern;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Filter and summarize Postfix queue data in JSON format
#[derive(Parser, Debug, Clone)]
#[command(
    name = "mailqf",
    about = "Filter and summarize Postfix queue data in JSON format",
    version
)]
pub struct Settings {
    /// Queue name filter
    #[arg(short = 'q', long = "qname", value_name = "REGEX")]
    pub qname: Option<String>,

    /// Sender address filter
    #[arg(short = 's', long = "sender", value_name = "REGEX")]
    pub sender: Option<String>,

    /// Recipient address filter
    #[arg(short = 'r', long = "rcpt", value_name = "REGEX")]
    pub rcpt: Option<String>,

    /// Delay reason filter
    #[arg(short = 'd', long = "reason", value_name = "REGEX")]
    pub reason: Option<String>,

    /// Message arrived after TS (epoch seconds, <digits><s|m|h|d>, or ISO date)
    #[arg(short = 'a', long = "after", value_name = "TS")]
    pub after: Option<String>,

    /// Message arrived before TS (same syntaxes as --after)
    #[arg(short = 'b', long = "before", value_name = "TS")]
    pub before: Option<String>,

    /// Output bare queue IDs instead of full records
    #[arg(short = 'i', long = "queue-id", conflicts_with = "report")]
    pub queue_id: bool,

    /// Aggregate matching records by the given attribute
    #[arg(long, value_enum, value_name = "KIND")]
    pub report: Option<ReportKind>,

    /// Output file. Use a dash "-" for standard output
    #[arg(short = 'o', long = "outfile", value_name = "PATH", default_value = "-")]
    pub outfile: String,

    /// Logging level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Input files. Use a dash "-" for standard input
    #[arg(value_name = "PATH", default_value = "-")]
    pub infile: Vec<String>,
}

// ── ReportKind ─────────────────────────────────────────────────────────────────

/// Which attribute of matching records a report aggregates over.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Queue name, one count per record.
    Qname,
    /// Sender address, one count per record.
    Sender,
    /// Sender domain (address part after "@"), one count per record.
    Sdom,
    /// Recipient address, one count per recipient.
    Rcpt,
    /// Recipient domain, one count per recipient.
    Rdom,
    /// Delay reason, one count per recipient.
    Reason,
}

impl ReportKind {
    /// Separator for sub-key extraction: only the substring after its
    /// first occurrence is counted. Used to collapse addresses into
    /// domains.
    pub fn separator(self) -> Option<char> {
        match self {
            ReportKind::Sdom | ReportKind::Rdom => Some('@'),
            _ => None,
        }
    }

    /// Recipient-level kinds tally one count per recipient entry;
    /// the rest tally one count per record.
    pub fn recipient_field(self) -> Option<&'static str> {
        match self {
            ReportKind::Rcpt | ReportKind::Rdom => Some(FIELD_ADDRESS),
            ReportKind::Reason => Some(FIELD_DELAY_REASON),
            _ => None,
        }
    }
}

// ── FilterConfig ───────────────────────────────────────────────────────────────

/// The compiled, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub qname: Pattern,
    pub sender: Pattern,
    pub rcpt: Pattern,
    pub reason: Pattern,
    pub interval: Interval,
    pub queue_id_only: bool,
    pub report: Option<ReportKind>,
}

impl FilterConfig {
    /// Compile patterns and validate the interval. Any failure here is a
    /// fatal configuration error, raised before any record is processed.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let interval = Interval::new(settings.after.as_deref(), settings.before.as_deref());
        interval.validate()?;
        Ok(Self {
            qname: compile(settings.qname.as_deref())?,
            sender: compile(settings.sender.as_deref())?,
            rcpt: compile(settings.rcpt.as_deref())?,
            reason: compile(settings.reason.as_deref())?,
            interval,
            queue_id_only: settings.queue_id,
            report: settings.report,
        })
    }
}

/// Compile an optional filter expression, falling back to match-any.
fn compile(expr: Option<&str>) -> Result<Pattern> {
    match expr {
        Some(e) => Pattern::new(e),
        None => Ok(Pattern::match_any()),
    }
}

//! Command line surface of the plugin.

use std::error::Error as _;
use std::ffi::OsString;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser};

use crate::check::CheckConfig;
use crate::query::{MetricQuery, QueryType};
use crate::{Comparator, Thresholds};

/// Checks the value of a single prometheus query against warning and critical thresholds.
#[derive(Debug, Parser)]
#[command(name = "check_prometheus_metric", disable_version_flag = true)]
pub struct Cli {
    /// Base URL of the prometheus server, e.g. http://localhost:9090
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: String,

    /// Query expression, sent URL-encoded
    #[arg(short = 'q', long, value_name = "QUERY")]
    pub query: String,

    /// Warning level
    #[arg(
        short = 'w',
        long,
        value_name = "INT",
        value_parser = parse_threshold,
        allow_negative_numbers = true
    )]
    pub warning: i64,

    /// Critical level
    #[arg(
        short = 'c',
        long,
        value_name = "INT",
        value_parser = parse_threshold,
        allow_negative_numbers = true
    )]
    pub critical: i64,

    /// Name of the metric in the plugin output
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name: String,

    /// Comparison applied between the value and the levels
    #[arg(short = 'm', long, value_name = "METHOD", value_enum, default_value_t = Comparator::GreaterOrEqual)]
    pub method: Comparator,

    /// Report a NaN result as OK instead of UNKNOWN
    #[arg(short = 'O', long)]
    pub nan_ok: bool,

    /// Result type of the query
    #[arg(short = 't', long, value_name = "TYPE", value_enum, default_value_t = QueryType::Vector)]
    pub query_type: QueryType,

    /// Print the labels of the returned series as extended output
    #[arg(short = 'i', long)]
    pub info: bool,

    /// Append performance data to the output
    #[arg(short = 'p', long)]
    pub perfdata: bool,
}

/// A command line that couldn't be turned into a [Cli].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct UsageError {
    message: String,
    usage: String,
}

impl UsageError {
    /// The full usage text of the plugin.
    pub fn usage(&self) -> &str {
        &self.usage
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ThresholdError {
    #[error("'{0}' is not a non-negative integer")]
    NotAnInteger(String),
    #[error("'{0}' is too large")]
    OutOfRange(String),
}

impl Cli {
    /// Parses the given arguments (including the program name) without exiting on errors.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|err| UsageError {
            message: describe(&err),
            usage: usage_text(),
        })
    }

    pub fn into_config(self) -> CheckConfig {
        CheckConfig {
            query: MetricQuery::new(&self.host, &self.query, &self.name, self.query_type),
            thresholds: Thresholds::new(self.warning, self.critical, self.method),
            accept_nan: self.nan_ok,
            show_info: self.info,
            perf_data: self.perfdata,
        }
    }
}

pub fn usage_text() -> String {
    Cli::command().render_help().to_string()
}

fn parse_threshold(raw: &str) -> Result<i64, ThresholdError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ThresholdError::NotAnInteger(raw.to_owned()));
    }

    raw.parse()
        .map_err(|_| ThresholdError::OutOfRange(raw.to_owned()))
}

/// Turns a clap error into a one line description of what was wrong.
fn describe(err: &clap::Error) -> String {
    let arg = match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg.clone(),
        Some(ContextValue::Strings(args)) => args.join(", "),
        _ => String::new(),
    };
    let value = match err.get(ContextKind::InvalidValue) {
        Some(ContextValue::String(value)) => value.clone(),
        _ => String::new(),
    };

    match err.kind() {
        ErrorKind::MissingRequiredArgument => format!("missing required option {}", arg),
        ErrorKind::UnknownArgument => format!("unrecognized option '{}'", arg),
        ErrorKind::InvalidValue => format!("invalid value '{}' for {}", value, arg),
        ErrorKind::ValueValidation => match err.source() {
            Some(source) => format!("invalid value for {}: {}", arg, source),
            None => format!("invalid value '{}' for {}", value, arg),
        },
        ErrorKind::DisplayHelp => "usage".to_owned(),
        _ => err
            .to_string()
            .lines()
            .next()
            .unwrap_or_default()
            .trim_start_matches("error: ")
            .to_owned(),
    }
}

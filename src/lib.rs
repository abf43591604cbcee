//! A nagios/icinga plugin which alerts on the value of a single prometheus query.
//!
//! A check is a straight pipeline: [query] fetches the response body for the configured
//! expression, [normalize] reduces the first result to a [NormalizedValue],
//! [threshold] classifies that value and the resulting [CheckOutcome] is printed by
//! [CheckOutcome::print_and_exit], which also terminates the process with the matching
//! nagios exit code.
//!
//! ```rust
//! # use check_prometheus_metric::{CheckOutcome, ServiceState};
//! let outcome = CheckOutcome::new(ServiceState::Warning, "queue_depth is 4");
//! assert_eq!(&outcome.to_nagios_string(), "1 - queue_depth is 4");
//! assert_eq!(outcome.exit_code(), 1);
//! ```

use std::fmt;
use std::process;

#[macro_use]
mod macros;

pub mod check;
pub mod cli;
pub mod error;
pub mod icinga;
pub mod logging;
pub mod normalize;
pub mod perfdata;
pub mod query;
mod runner;
pub mod threshold;

pub use crate::normalize::NormalizedValue;
pub use crate::runner::Runner;
pub use crate::threshold::{Comparator, Thresholds};

/// Represents a service state from nagios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// The terminal result of one check run. Exactly one of these is produced per process and
/// handed to [CheckOutcome::print_and_exit].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckOutcome {
    state: ServiceState,
    short_text: String,
    long_text: Option<String>,
    perf_data: Option<String>,
}

impl CheckOutcome {
    pub fn new(state: ServiceState, short_text: impl Into<String>) -> Self {
        CheckOutcome {
            state,
            short_text: short_text.into(),
            long_text: None,
            perf_data: None,
        }
    }

    /// Shorthand for an outcome in the UNKNOWN state, which is how every failure of the
    /// plugin itself is reported.
    pub fn unknown(short_text: impl Into<String>) -> Self {
        Self::new(ServiceState::Unknown, short_text)
    }

    /// Attaches the detail text printed on the second output line.
    pub fn with_long_text(mut self, long_text: impl Into<String>) -> Self {
        self.long_text = Some(long_text.into());
        self
    }

    /// Attaches performance data, printed after a `|` on the first output line.
    pub fn with_perf_data(mut self, perf_data: impl Into<String>) -> Self {
        self.perf_data = Some(perf_data.into());
        self
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn short_text(&self) -> &str {
        &self.short_text
    }

    pub fn long_text(&self) -> Option<&str> {
        self.long_text.as_deref()
    }

    pub fn perf_data(&self) -> Option<&str> {
        self.perf_data.as_deref()
    }

    /// Returns the full plugin output: `<code> - <short text>` on the first line, followed
    /// by the long text on a second line if there is one.
    pub fn to_nagios_string(&self) -> String {
        let mut s = format!("{} - {}", self.exit_code(), self.short_text);

        if let Some(ref perf_data) = self.perf_data {
            s.push_str(&format!(" | {}", perf_data));
        }

        if let Some(ref long_text) = self.long_text {
            s.push('\n');
            s.push_str(long_text);
        }

        s
    }

    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Will print Self::to_nagios_string and exit with the exit code from Self::exit_code
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}

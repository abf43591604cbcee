//! Threshold evaluation: mapping a normalized value to a service state.

use std::fmt;

use tracing::debug;

use crate::normalize::{positive_infinity_sentinel, NEGATIVE_INFINITY_SENTINEL};
use crate::{CheckOutcome, NormalizedValue, ServiceState};

/// The relational operator a value is tested against the thresholds with.
///
/// A threshold is *triggered* when `value <comparator> threshold` holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Comparator {
    #[value(name = "gt")]
    Greater,
    #[default]
    #[value(name = "ge")]
    GreaterOrEqual,
    #[value(name = "lt")]
    Less,
    #[value(name = "le")]
    LessOrEqual,
    #[value(name = "eq")]
    Equal,
    #[value(name = "ne")]
    NotEqual,
}

impl Comparator {
    pub fn holds(&self, value: i64, threshold: i64) -> bool {
        match self {
            Comparator::Greater => value > threshold,
            Comparator::GreaterOrEqual => value >= threshold,
            Comparator::Less => value < threshold,
            Comparator::LessOrEqual => value <= threshold,
            Comparator::Equal => value == threshold,
            Comparator::NotEqual => value != threshold,
        }
    }

    /// The name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Greater => "gt",
            Comparator::GreaterOrEqual => "ge",
            Comparator::Less => "lt",
            Comparator::LessOrEqual => "le",
            Comparator::Equal => "eq",
            Comparator::NotEqual => "ne",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warning and critical levels together with the comparator applied to both.
///
/// No ordering between the two levels is enforced: which one is "higher" depends entirely
/// on the comparator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    warning: i64,
    critical: i64,
    comparator: Comparator,
}

impl Thresholds {
    pub fn new(warning: i64, critical: i64, comparator: Comparator) -> Self {
        Thresholds {
            warning,
            critical,
            comparator,
        }
    }

    pub fn warning(&self) -> i64 {
        self.warning
    }

    pub fn critical(&self) -> i64 {
        self.critical
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    /// Critical is always tested first, so it wins whenever both thresholds trigger.
    ///
    /// ```rust
    /// # use check_prometheus_metric::{Comparator, ServiceState, Thresholds};
    /// let thresholds = Thresholds::new(3, 5, Comparator::GreaterOrEqual);
    /// assert_eq!(thresholds.classify(2), ServiceState::Ok);
    /// assert_eq!(thresholds.classify(4), ServiceState::Warning);
    /// assert_eq!(thresholds.classify(5), ServiceState::Critical);
    /// ```
    pub fn classify(&self, value: i64) -> ServiceState {
        if self.comparator.holds(value, self.critical) {
            ServiceState::Critical
        } else if self.comparator.holds(value, self.warning) {
            ServiceState::Warning
        } else {
            ServiceState::Ok
        }
    }
}

/// Decides the outcome for a normalized value.
///
/// Comparable values yield OK, WARNING or CRITICAL with `<metric name> is <value>` as text,
/// where the value is the integer or sentinel that was compared. `NaN` is OK only if
/// `accept_nan` is set. Everything else is UNKNOWN, with the raw value in the long text.
pub fn evaluate(
    metric_name: &str,
    value: &NormalizedValue,
    thresholds: &Thresholds,
    accept_nan: bool,
) -> CheckOutcome {
    let n = match value {
        NormalizedValue::Number(n) => *n,
        NormalizedValue::PositiveInfinity => positive_infinity_sentinel(thresholds),
        NormalizedValue::NegativeInfinity => NEGATIVE_INFINITY_SENTINEL,
        NormalizedValue::NaN if accept_nan => {
            return CheckOutcome::new(ServiceState::Ok, format!("{} is NaN", metric_name));
        }
        NormalizedValue::NaN => return unparsable(metric_name, "NaN"),
        NormalizedValue::Unparsable(raw) => return unparsable(metric_name, raw),
    };

    let state = thresholds.classify(n);
    debug!(
        value = n,
        warning = thresholds.warning(),
        critical = thresholds.critical(),
        comparator = %thresholds.comparator(),
        %state,
        "classified value"
    );
    CheckOutcome::new(state, format!("{} is {}", metric_name, n))
}

fn unparsable(metric_name: &str, raw: &str) -> CheckOutcome {
    CheckOutcome::unknown("unable to parse prometheus response")
        .with_long_text(format!("{} is {}", metric_name, raw))
}

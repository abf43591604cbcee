//! Nagios performance data for the checked metric.

use crate::Thresholds;

/// The purpose of ToPerfString is only so one can define custom representations of custom types
/// without using the ToString trait so we don't interfere with that.
pub trait ToPerfString {
    fn to_perf_string(&self) -> String;
}

impl_to_perf_string_on_to_string!(i64);

impl<T> ToPerfString for Option<T>
where
    T: ToPerfString,
{
    fn to_perf_string(&self) -> String {
        match self {
            Some(ref s) => s.to_perf_string(),
            None => String::new(),
        }
    }
}

/// A single `label=value;warn;crit` entry.
///
/// ```rust
/// # use check_prometheus_metric::perfdata::{PerfData, ToPerfString};
/// # use check_prometheus_metric::{Comparator, Thresholds};
/// let thresholds = Thresholds::new(5, 10, Comparator::GreaterOrEqual);
/// let perf = PerfData::new("open files", 7, &thresholds);
/// assert_eq!(&perf.to_perf_string(), "'open files'=7;5;10");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerfData {
    label: String,
    value: i64,
    warning: i64,
    critical: i64,
}

impl PerfData {
    pub fn new(label: &str, value: i64, thresholds: &Thresholds) -> Self {
        PerfData {
            label: label.to_owned(),
            value,
            warning: thresholds.warning(),
            critical: thresholds.critical(),
        }
    }
}

impl ToPerfString for PerfData {
    fn to_perf_string(&self) -> String {
        perf_string!(
            escape_label(&self.label),
            self.value,
            self.warning,
            self.critical
        )
    }
}

fn escape_label(label: &str) -> String {
    // `=` separates label from value
    let label = label.replace('=', "_");

    // quote `'`
    let label = label.replace('\'', "''");

    if label.contains(' ') {
        format!("'{}'", label)
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::{PerfData, ToPerfString};
    use crate::{Comparator, Thresholds};

    #[test]
    fn test_perf_data() {
        let thresholds = Thresholds::new(3, 5, Comparator::GreaterOrEqual);

        let test_data = [
            ("test", "test=4;3;5"),
            ("test=a", "test_a=4;3;5"),
            ("te'st", "te''st=4;3;5"),
            ("te st", "'te st'=4;3;5"),
            ("it's up", "'it''s up'=4;3;5"),
        ];
        for (label, expected_string) in &test_data {
            let perf = PerfData::new(label, 4, &thresholds);
            assert_eq!(&perf.to_perf_string(), expected_string);
        }
    }

    #[test]
    fn test_negative_sentinel() {
        let thresholds = Thresholds::new(0, 0, Comparator::Less);
        let perf = PerfData::new("up", -1, &thresholds);
        assert_eq!(&perf.to_perf_string(), "up=-1;0;0");
    }
}

//! The check pipeline: fetch, extract, normalize, evaluate.

use std::ffi::OsString;

use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::error::CheckError;
use crate::perfdata::{PerfData, ToPerfString};
use crate::query::{extract_sample, MetricQuery, MetricSource, QueryError, Sample};
use crate::threshold::evaluate;
use crate::{CheckOutcome, NormalizedValue, ServiceState, Thresholds};

/// Everything one run of the check needs to know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckConfig {
    pub query: MetricQuery,
    pub thresholds: Thresholds,
    /// Report `NaN` as OK instead of UNKNOWN.
    pub accept_nan: bool,
    /// Attach the labels of the series as long text.
    pub show_info: bool,
    pub perf_data: bool,
}

/// Runs the check once against `source`.
///
/// A failed request is not an error here: it leaves the sample empty, which is reported
/// as an unparsable response.
pub fn run<S>(source: &S, config: &CheckConfig) -> CheckOutcome
where
    S: MetricSource + ?Sized,
{
    let sample = match source.fetch(&config.query) {
        Ok(body) => extract_sample(&body, config.query.query_type()),
        Err(err) => {
            warn!(error = %err, server = config.query.server(), "prometheus query failed");
            Sample::default()
        }
    };

    let value = NormalizedValue::parse(sample.value());
    debug!(raw = sample.value(), ?value, "normalized sample");

    let mut outcome = evaluate(
        config.query.name(),
        &value,
        &config.thresholds,
        config.accept_nan,
    );

    if config.perf_data {
        if let Some(n) = value.as_integer(&config.thresholds) {
            let perf = PerfData::new(config.query.name(), n, &config.thresholds);
            outcome = outcome.with_perf_data(perf.to_perf_string());
        }
    }

    if config.show_info && outcome.state() != ServiceState::Unknown {
        if let Some(labels) = sample.labels() {
            outcome = outcome.with_long_text(labels);
        }
    }

    info!(state = %outcome.state(), text = outcome.short_text(), "check finished");
    outcome
}

/// Parses `args` (including the program name), then obtains a source from `connect` and
/// runs the check against it.
///
/// `connect` is only called once the arguments are valid, so a usage error never reaches
/// the network.
pub fn run_from_args<I, T, S, F>(args: I, connect: F) -> Result<CheckOutcome, CheckError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    S: MetricSource,
    F: FnOnce() -> Result<S, QueryError>,
{
    let config = Cli::try_parse_args(args)?.into_config();
    let source = connect()?;

    Ok(run(&source, &config))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::{run, run_from_args, CheckConfig};
    use crate::query::{MetricQuery, MetricSource, QueryError, QueryType};
    use crate::{Comparator, ServiceState, Thresholds};

    /// Answers every query with a fixed body and counts the calls.
    struct StubSource {
        body: String,
        calls: Cell<usize>,
    }

    impl StubSource {
        fn vector(value: &str) -> Self {
            Self::body(&format!(
                r#"{{"status":"success","data":{{"resultType":"vector","result":[{{"metric":{{"job":"api"}},"value":[1700000000,"{}"]}}]}}}}"#,
                value
            ))
        }

        fn body(body: &str) -> Self {
            StubSource {
                body: body.to_owned(),
                calls: Cell::new(0),
            }
        }
    }

    impl MetricSource for StubSource {
        fn fetch(&self, _query: &MetricQuery) -> Result<String, QueryError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.body.clone())
        }
    }

    /// Fails like an unreachable server would.
    struct UnreachableSource;

    impl MetricSource for UnreachableSource {
        fn fetch(&self, _query: &MetricQuery) -> Result<String, QueryError> {
            let client = reqwest::blocking::Client::builder().no_proxy().build()?;
            // port 0 is never connectable
            client.get("http://127.0.0.1:0/api/v1/query").send()?;
            Ok(String::new())
        }
    }

    fn config(warning: i64, critical: i64, comparator: Comparator) -> CheckConfig {
        CheckConfig {
            query: MetricQuery::new("http://prom", "rate(errors[5m])", "errors", QueryType::Vector),
            thresholds: Thresholds::new(warning, critical, comparator),
            accept_nan: false,
            show_info: false,
            perf_data: false,
        }
    }

    #[test]
    fn test_single_request() {
        let source = StubSource::vector("1");
        run(&source, &config(3, 5, Comparator::GreaterOrEqual));
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_warning() {
        let outcome = run(
            &StubSource::vector("3.7"),
            &config(3, 5, Comparator::GreaterOrEqual),
        );
        assert_eq!(outcome.state(), ServiceState::Warning);
        assert_eq!(&outcome.to_nagios_string(), "1 - errors is 4");
    }

    #[test]
    fn test_positive_infinity_is_critical() {
        let outcome = run(
            &StubSource::vector("+Inf"),
            &config(5, 10, Comparator::GreaterOrEqual),
        );
        assert_eq!(&outcome.to_nagios_string(), "2 - errors is 15");
    }

    #[test]
    fn test_negative_infinity_is_ok() {
        let outcome = run(
            &StubSource::vector("-Inf"),
            &config(0, 0, Comparator::GreaterOrEqual),
        );
        assert_eq!(&outcome.to_nagios_string(), "0 - errors is -1");
    }

    #[test]
    fn test_nan() {
        let source = StubSource::vector("NaN");

        let outcome = run(&source, &config(1, 2, Comparator::GreaterOrEqual));
        assert_eq!(
            &outcome.to_nagios_string(),
            "3 - unable to parse prometheus response\nerrors is NaN"
        );

        let mut accepting = config(1, 2, Comparator::GreaterOrEqual);
        accepting.accept_nan = true;
        let outcome = run(&source, &accepting);
        assert_eq!(&outcome.to_nagios_string(), "0 - errors is NaN");
    }

    #[test]
    fn test_empty_result() {
        let source = StubSource::body(r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#);
        let outcome = run(&source, &config(1, 2, Comparator::GreaterOrEqual));
        assert_eq!(outcome.state(), ServiceState::Unknown);
        assert_eq!(outcome.long_text(), Some("errors is "));
    }

    #[test]
    fn test_transport_failure_is_unknown() {
        let mut accepting = config(1, 2, Comparator::GreaterOrEqual);
        accepting.accept_nan = true;

        let outcome = run(&UnreachableSource, &accepting);
        assert_eq!(outcome.state(), ServiceState::Unknown);
        assert_eq!(outcome.short_text(), "unable to parse prometheus response");
    }

    #[test]
    fn test_scalar_query() {
        let source = StubSource::body(
            r#"{"status":"success","data":{"resultType":"scalar","result":[1700000000,"0.2"]}}"#,
        );
        let mut scalar = config(1, 2, Comparator::Less);
        scalar.query = MetricQuery::new("http://prom", "scalar(up)", "up", QueryType::Scalar);

        let outcome = run(&source, &scalar);
        assert_eq!(&outcome.to_nagios_string(), "2 - up is 0");
    }

    #[test]
    fn test_perf_data_and_info() {
        let mut extended = config(3, 5, Comparator::GreaterOrEqual);
        extended.perf_data = true;
        extended.show_info = true;

        let outcome = run(&StubSource::vector("6"), &extended);
        assert_eq!(
            &outcome.to_nagios_string(),
            "2 - errors is 6 | errors=6;3;5\n{job=\"api\"}"
        );

        // nothing to measure or label on an unparsable response
        let outcome = run(&StubSource::vector("oops"), &extended);
        assert_eq!(outcome.perf_data(), None);
        assert_eq!(outcome.long_text(), Some("errors is oops"));
    }

    const ARGS: [&str; 11] = [
        "check_prometheus_metric",
        "-H",
        "http://prom",
        "-q",
        "up",
        "-w",
        "1",
        "-c",
        "2",
        "-n",
        "up",
    ];

    #[test]
    fn test_args_checked_before_connecting() {
        let source = StubSource::vector("5");
        let connected = Cell::new(false);
        let connect = || {
            connected.set(true);
            Ok(&source)
        };

        let args = ARGS.iter().copied().chain(["-m", "foo"]);
        let outcome = run_from_args(args, connect).unwrap_err().to_outcome();

        assert_eq!(outcome.state(), ServiceState::Unknown);
        assert_eq!(outcome.exit_code(), 3);
        assert!(!connected.get());
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_missing_warning_is_usage_error() {
        let source = StubSource::vector("5");
        let args = ARGS.iter().enumerate().filter(|(i, _)| !(5..7).contains(i));

        let outcome = run_from_args(args.map(|(_, arg)| *arg), || Ok(&source))
            .unwrap_err()
            .to_outcome();

        assert!(outcome
            .to_nagios_string()
            .starts_with("3 - missing required option"));
        assert!(outcome.long_text().unwrap().contains("Usage:"));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_run_from_args() {
        let source = StubSource::vector("5");
        let outcome = run_from_args(ARGS, || Ok(&source)).unwrap();

        assert_eq!(&outcome.to_nagios_string(), "2 - up is 5");
        assert_eq!(source.calls.get(), 1);
    }
}

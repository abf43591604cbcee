//! Talking to the prometheus HTTP API and pulling the sample out of its response.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

/// The `resultType` the query is expected to produce, which decides where the sample value
/// is found in the response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum QueryType {
    /// `data.result[0].value[1]`
    #[default]
    Vector,
    /// `data.result[1]`
    Scalar,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::Vector => f.write_str("vector"),
            QueryType::Scalar => f.write_str("scalar"),
        }
    }
}

/// What to ask which server, and how to call the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricQuery {
    server: String,
    expression: String,
    name: String,
    query_type: QueryType,
}

impl MetricQuery {
    pub fn new(server: &str, expression: &str, name: &str, query_type: QueryType) -> Self {
        MetricQuery {
            server: server.to_owned(),
            expression: expression.to_owned(),
            name: name.to_owned(),
            query_type,
        }
    }

    /// The instant query endpoint of the server.
    pub fn endpoint(&self) -> String {
        format!("{}/api/v1/query", self.server.trim_end_matches('/'))
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Display name of the metric in the plugin output.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The HTTP request itself failed (connection, DNS, TLS, body decoding, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Anything that can answer a [MetricQuery] with a raw response body.
pub trait MetricSource {
    fn fetch(&self, query: &MetricQuery) -> Result<String, QueryError>;
}

impl<T: MetricSource + ?Sized> MetricSource for &T {
    fn fetch(&self, query: &MetricQuery) -> Result<String, QueryError> {
        (**self).fetch(query)
    }
}

/// Blocking client for the prometheus HTTP API. Sends exactly one request per fetch.
pub struct PrometheusClient {
    client: reqwest::blocking::Client,
}

impl PrometheusClient {
    pub fn new() -> Result<Self, QueryError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self::with_client(client))
    }

    /// Reuses an existing client, e.g. one configured with custom TLS roots.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl MetricSource for PrometheusClient {
    fn fetch(&self, query: &MetricQuery) -> Result<String, QueryError> {
        let url = query.endpoint();
        debug!(%url, query = query.expression(), "sending prometheus query");

        let response = self
            .client
            .get(&url)
            .query(&[("query", query.expression())])
            .send()?;

        // prometheus reports query errors in a JSON body with a 4xx/5xx status, which
        // extraction handles like any other response without a value
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "prometheus answered with an error status");
        }

        Ok(response.text()?)
    }
}

/// The first series of a query response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sample {
    value: String,
    labels: Option<String>,
}

impl Sample {
    /// The raw value string, empty if the response didn't contain one.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The label set of the series rendered as `{key="value", ...}`. Scalars have none.
    pub fn labels(&self) -> Option<&str> {
        self.labels.as_deref()
    }
}

/// Extracts the first sample from a response body. Further series are ignored.
///
/// Bodies that aren't JSON, error responses and empty results all produce a sample with an
/// empty value.
///
/// ```rust
/// # use check_prometheus_metric::query::{extract_sample, QueryType};
/// let body = r#"{"status":"success","data":{"resultType":"vector",
///     "result":[{"metric":{"job":"node"},"value":[1700000000.1,"3.7"]}]}}"#;
/// let sample = extract_sample(body, QueryType::Vector);
/// assert_eq!(sample.value(), "3.7");
/// assert_eq!(sample.labels(), Some(r#"{job="node"}"#));
/// ```
pub fn extract_sample(body: &str, query_type: QueryType) -> Sample {
    let response: Value = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(err) => {
            debug!(error = %err, "response body is not JSON");
            return Sample::default();
        }
    };

    let value_pointer = match query_type {
        QueryType::Vector => "/data/result/0/value/1",
        QueryType::Scalar => "/data/result/1",
    };

    let value = match response.pointer(value_pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            debug!(pointer = value_pointer, "response carries no sample value");
            String::new()
        }
    };

    let labels = match query_type {
        QueryType::Vector => response
            .pointer("/data/result/0/metric")
            .and_then(Value::as_object)
            .map(format_labels),
        QueryType::Scalar => None,
    };

    Sample { value, labels }
}

fn format_labels(labels: &serde_json::Map<String, Value>) -> String {
    let pairs = labels
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}=\"{}\"", key, s),
            other => format!("{}={}", key, other),
        })
        .collect::<Vec<_>>();

    format!("{{{}}}", pairs.join(", "))
}

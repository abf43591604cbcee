use std::fmt::Display;

use tracing::debug;

use crate::CheckOutcome;

/// Runs a check and makes sure it ends in a [CheckOutcome], whatever happens.
///
/// ```rust
/// # use check_prometheus_metric::{Runner, ServiceState};
/// let outcome = Runner::<String>::new().safe_run(|| Err("boom".to_owned()));
/// assert_eq!(outcome.state(), ServiceState::Unknown);
/// assert_eq!(&outcome.to_nagios_string(), "3 - boom");
/// ```
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(&E) -> CheckOutcome>>,
}

impl<E: Display> Runner<E> {
    pub fn new() -> Self {
        Self { on_error: None }
    }

    pub fn on_error(mut self, f: impl FnOnce(&E) -> CheckOutcome + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Returns the outcome of `f`, or the one built by the [Runner::on_error] handler if `f`
    /// failed. Without a handler errors become UNKNOWN with the error message as text.
    pub fn safe_run(self, f: impl FnOnce() -> Result<CheckOutcome, E>) -> CheckOutcome {
        match f() {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(error = %err, "check aborted");
                self.on_error
                    .map(|f| f(&err))
                    .unwrap_or_else(|| CheckOutcome::unknown(err.to_string()))
            }
        }
    }
}

impl<E: Display> Default for Runner<E> {
    fn default() -> Self {
        Self::new()
    }
}

use crate::cli::UsageError;
use crate::icinga::IcingaCommandError;
use crate::query::QueryError;
use crate::CheckOutcome;

/// Everything that can stop a check before a value has been evaluated.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("unable to create HTTP client: {0}")]
    Client(#[from] QueryError),
    #[error("unable to generate icinga command: {0}")]
    Icinga(#[from] IcingaCommandError),
}

impl CheckError {
    /// All of these are UNKNOWN. Usage errors carry the usage text as long text.
    pub fn to_outcome(&self) -> CheckOutcome {
        match self {
            CheckError::Usage(err) => {
                CheckOutcome::unknown(err.to_string()).with_long_text(err.usage())
            }
            err => CheckOutcome::unknown(err.to_string()),
        }
    }
}

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValuationError {
    #[error("no historical case data available: {reason}")]
    NoDataAvailable { reason: String },
    #[error("query field `{field}` is invalid: {reason}")]
    InvalidQuery { field: &'static str, reason: String },
}

impl ValuationError {
    pub fn no_data(reason: impl Into<String>) -> Self {
        Self::NoDataAvailable { reason: reason.into() }
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NoDataAvailable { .. } => "no_data_available",
            Self::InvalidQuery { .. } => "invalid_query",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::NoDataAvailable { .. } => {
                "No historical case data is available to value this claim. Load the case corpus and try again."
                    .to_string()
            }
            Self::InvalidQuery { field, reason } => {
                format!("The claim could not be valued because `{field}` is invalid: {reason}.")
            }
        }
    }
}

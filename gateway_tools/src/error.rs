use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not send request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("The gateway did not respond in time")]
    Timeout,
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl GatewayApiError {
    /// The gateway reports card declines with `402 Payment Required`.
    pub fn is_decline(&self) -> bool {
        matches!(self, GatewayApiError::QueryError { status: 402, .. })
    }

    /// True if the request may or may not have been acted on by the gateway.
    pub fn is_indeterminate(&self) -> bool {
        match self {
            GatewayApiError::Timeout | GatewayApiError::RestResponseError(_) | GatewayApiError::JsonError(_) => true,
            GatewayApiError::QueryError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GatewayApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayApiError::Timeout
        } else if e.is_connect() || e.is_builder() {
            GatewayApiError::RestRequestError(e.to_string())
        } else {
            GatewayApiError::RestResponseError(e.to_string())
        }
    }
}

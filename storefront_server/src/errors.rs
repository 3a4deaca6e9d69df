use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use fulfillment_engine::{traits::InventoryError, CheckoutError, FinalizeError, OrderFlowError};
use gateway_tools::GatewayApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Inventory(InventoryError),
    #[error("Payment failed. {0}")]
    PaymentFailed(String),
    #[error("{0}")]
    PaymentOutcomeUnknown(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Operator access denied. {0}")]
    Unauthorized(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Inventory(e) => match e {
                InventoryError::InsufficientStock { .. } => StatusCode::CONFLICT,
                InventoryError::UnknownProduct(_) => StatusCode::NOT_FOUND,
                InventoryError::EmptyOrder | InventoryError::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
                InventoryError::TotalOverflow => StatusCode::BAD_REQUEST,
                InventoryError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::PaymentFailed(_) => StatusCode::BAD_GATEWAY,
            Self::PaymentOutcomeUnknown(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<InventoryError> for ServerError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            e => Self::Inventory(e),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::InvalidRequest(s) => Self::InvalidRequest(s),
            OrderFlowError::Inventory(e) => e.into(),
            OrderFlowError::Gateway(e) => Self::PaymentFailed(e.to_string()),
            OrderFlowError::PaymentOutcomeUnknown(s) => Self::PaymentOutcomeUnknown(s),
            OrderFlowError::Persistence(s) => Self::BackendError(s),
            e @ OrderFlowError::AlreadyFailed(_) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<FinalizeError> for ServerError {
    fn from(e: FinalizeError) -> Self {
        match e {
            FinalizeError::Inventory(e) => e.into(),
            FinalizeError::Persistence(s) => Self::BackendError(s),
            FinalizeError::Validation(s) => Self::InvalidRequest(s),
            e @ FinalizeError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            e @ FinalizeError::StatusTransitionForbidden { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::InvalidRequest(s) => Self::InvalidRequest(s),
            CheckoutError::Inventory(e) => e.into(),
            CheckoutError::Manifest(e) => Self::InvalidRequest(e.to_string()),
            CheckoutError::Gateway(e) => Self::PaymentFailed(e.to_string()),
            CheckoutError::Persistence(s) => Self::BackendError(s),
        }
    }
}

impl From<GatewayApiError> for ServerError {
    fn from(e: GatewayApiError) -> Self {
        Self::InitializeError(format!("Could not create the payment gateway client. {e}"))
    }
}

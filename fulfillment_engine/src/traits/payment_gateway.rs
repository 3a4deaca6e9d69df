use thiserror::Error;

use crate::traits::{ChargeRequest, ChargeResult, HostedSession, SessionRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("The payment was declined. {0}")]
    Declined(String),
    #[error("The payment gateway did not respond in time. The outcome of the request is unknown.")]
    Timeout,
    #[error("The payment gateway is unavailable. {0}")]
    Unavailable(String),
    #[error("The payment gateway sent an invalid response. {0}")]
    InvalidResponse(String),
}

/// The external payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Charges the given payment instrument.
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, GatewayError>;

    /// Creates a gateway-hosted checkout session. The buyer completes payment off-site, and the gateway later reports
    /// the outcome through a signed webhook event.
    async fn create_hosted_session(&self, request: SessionRequest) -> Result<HostedSession, GatewayError>;
}

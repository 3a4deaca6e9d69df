use fulfillment_engine::traits::{
    ChargeRequest,
    ChargeResult,
    ChargeStatus,
    GatewayError,
    HostedSession,
    PaymentGateway,
    SessionRequest,
};
use gateway_tools::{
    GatewayApi,
    GatewayApiError,
    NewCheckoutSession,
    NewPaymentIntent,
    PaymentIntentStatus,
    SessionLineItem,
};
use log::*;

/// Connects the engine's [`PaymentGateway`] contract to the gateway REST API.
#[derive(Clone)]
pub struct GatewayAdapter {
    api: GatewayApi,
}

impl GatewayAdapter {
    pub fn new(api: GatewayApi) -> Self {
        Self { api }
    }
}

impl PaymentGateway for GatewayAdapter {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, GatewayError> {
        let intent = NewPaymentIntent {
            amount: request.amount.value(),
            currency: request.currency,
            payment_method: request.instrument,
            receipt_email: Some(request.email),
        };
        let result = self
            .api
            .create_payment_intent(&intent, request.idempotency_key.as_deref())
            .await
            .map_err(to_gateway_error)?;
        Ok(ChargeResult { id: result.id, status: charge_status(result.status) })
    }

    async fn create_hosted_session(&self, request: SessionRequest) -> Result<HostedSession, GatewayError> {
        let line_items = request
            .line_items
            .into_iter()
            .map(|item| SessionLineItem {
                product_id: item.product_id,
                name: item.name,
                unit_amount: item.unit_amount.value(),
                quantity: item.quantity,
            })
            .collect();
        let session = NewCheckoutSession {
            customer_email: request.email,
            currency: request.currency,
            line_items,
            success_url: request.success_url,
            cancel_url: request.cancel_url,
            metadata: request.metadata,
        };
        let result = self.api.create_checkout_session(&session, None).await.map_err(to_gateway_error)?;
        let url = result.url.ok_or_else(|| {
            GatewayError::InvalidResponse(format!("Checkout session {} was created without a URL", result.id))
        })?;
        Ok(HostedSession { id: result.id, url })
    }
}

/// Any intent that is neither settled nor definitely dead counts as `Processing`, so the engine treats its outcome as
/// unknown rather than as a failure.
fn charge_status(status: PaymentIntentStatus) -> ChargeStatus {
    match status {
        PaymentIntentStatus::Succeeded => ChargeStatus::Succeeded,
        PaymentIntentStatus::Processing | PaymentIntentStatus::RequiresCapture => ChargeStatus::Processing,
        PaymentIntentStatus::RequiresPaymentMethod |
        PaymentIntentStatus::RequiresAction |
        PaymentIntentStatus::RequiresConfirmation |
        PaymentIntentStatus::Canceled => ChargeStatus::Failed,
        PaymentIntentStatus::Unrecognised => {
            warn!("💳️ The gateway returned a payment intent status that is not recognised");
            ChargeStatus::Processing
        },
    }
}

/// Errors after which the gateway may already have acted on the request are reported as [`GatewayError::Timeout`],
/// which the engine handles as an unknown outcome.
fn to_gateway_error(e: GatewayApiError) -> GatewayError {
    match e {
        e if e.is_decline() => GatewayError::Declined(e.to_string()),
        e if e.is_indeterminate() => {
            warn!("💳️ Gateway request outcome is unknown. {e}");
            GatewayError::Timeout
        },
        GatewayApiError::QueryError { status, message } if (400..500).contains(&status) => {
            GatewayError::Declined(message)
        },
        e => GatewayError::Unavailable(e.to_string()),
    }
}

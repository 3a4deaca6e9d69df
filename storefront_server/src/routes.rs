//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the engine, which does its I/O
//! asynchronously, so nothing should ever block a worker.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use fulfillment_engine::{
    db_types::OrderId,
    traits::{FulfillmentDatabase, InventoryManagement, PaymentGateway},
    CatalogApi,
    CheckoutSessionApi,
    DirectOrderApi,
    OrderFinalizer,
    OrderRequest,
    WebhookAck,
    WebhookProcessor,
};
use log::*;

use crate::{
    data_objects::{CheckoutSessionRequest, JsonResponse, ResolveOrderRequest, WebhookSignatureHeader},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(products => Get "/products" impl InventoryManagement);
/// Route handler for the catalog endpoint. Returns every product with its current price and stock level.
pub async fn products<B: InventoryManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET products");
    let products = api.products().await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product_by_id => Get "/products/{id}" impl InventoryManagement);
pub async fn product_by_id<B: InventoryManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET product {id}");
    match api.product(&id).await? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(ServerError::NoRecordFound(format!("Product {id} does not exist"))),
    }
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/orders" impl FulfillmentDatabase, PaymentGateway);
/// Route handler for direct orders.
///
/// The buyer's payment instrument is charged for the ledger price of the items, and the order is created in the same
/// request. Supplying an `idempotencyKey` makes the request safe to retry: a repeated key returns the original order
/// and does not charge the buyer again.
///
/// If the gateway does not answer in time the outcome of the charge is unknown. The response is `504` and the charge
/// is flagged for an operator to check.
pub async fn submit_order<B, G>(
    body: web::Json<OrderRequest>,
    api: web::Data<DirectOrderApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    G: PaymentGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST order for {} ({} line items)", request.email, request.items.len());
    let order = api.submit(request).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout_session => Post "/checkout-session" impl InventoryManagement, PaymentGateway);
/// Creates a hosted checkout session and returns its id and the URL the buyer should be sent to.
pub async fn checkout_session<B, G>(
    body: web::Json<CheckoutSessionRequest>,
    api: web::Data<CheckoutSessionApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: InventoryManagement,
    G: PaymentGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST checkout session for {}", request.email);
    let session = api.create_session(&request.email, &request.items).await?;
    Ok(HttpResponse::Ok().json(session))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(gateway_webhook => Post "/webhook" impl FulfillmentDatabase);
/// Route handler for gateway event notifications.
///
/// The body is taken as raw bytes, since the signature covers the exact bytes that were sent. Any 2xx response stops
/// the gateway from redelivering the event, so only failures that a redelivery could fix return a 500.
pub async fn gateway_webhook<B: FulfillmentDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<WebhookProcessor<B>>,
    header: web::Data<WebhookSignatureHeader>,
) -> HttpResponse {
    trace!("🪝️ Received webhook request: {}", req.uri());
    let signature = req.headers().get(header.0.as_str()).and_then(|v| v.to_str().ok());
    match api.handle(&body, signature).await {
        WebhookAck::Processed { order, duplicate: false } => {
            info!("🪝️ Order {} created from webhook", order.id);
            HttpResponse::Ok().json(JsonResponse::success(format!("Order {} created.", order.id)))
        },
        WebhookAck::Processed { order, duplicate: true } => {
            info!("🪝️ Webhook was a redelivery for order {}", order.id);
            HttpResponse::Ok().json(JsonResponse::success(format!("Order {} already exists.", order.id)))
        },
        WebhookAck::Acknowledged(msg) => HttpResponse::Ok().json(JsonResponse::success(msg)),
        WebhookAck::Ignored(msg) => {
            debug!("🪝️ Webhook ignored. {msg}");
            HttpResponse::Ok().json(JsonResponse::success(msg))
        },
        WebhookAck::Retry(msg) => {
            warn!("🪝️ Webhook could not be processed and should be redelivered. {msg}");
            HttpResponse::InternalServerError().json(JsonResponse::failure(msg))
        },
        WebhookAck::Rejected(e) => {
            warn!("🪝️ Webhook rejected. {e}");
            HttpResponse::BadRequest().json(JsonResponse::failure(e))
        },
    }
}

//----------------------------------------------   Operator  ----------------------------------------------------
// These routes are mounted under `/operator`, behind the operator key check in `server::configure_operator_routes`.
route!(operator_alerts => Get "/alerts" impl FulfillmentDatabase);
/// Returns the reconciliation alert log, oldest first.
pub async fn operator_alerts<B: FulfillmentDatabase>(
    api: web::Data<OrderFinalizer<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET operator alerts");
    let alerts = api.alerts().await?;
    Ok(HttpResponse::Ok().json(alerts))
}

route!(resolve_order => Post "/orders/{id}/resolve" impl FulfillmentDatabase);
/// Settles an order that is waiting for reconciliation. `{"accept": true}` marks it `Paid` and sends the receipt;
/// `{"accept": false}` marks it `Failed`. Orders that are already settled cannot be resolved again (`409`).
pub async fn resolve_order<B: FulfillmentDatabase>(
    path: web::Path<i64>,
    body: web::Json<ResolveOrderRequest>,
    api: web::Data<OrderFinalizer<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = OrderId(path.into_inner());
    let accept = body.accept;
    info!("💻️ Operator is resolving order {id}. Accept: {accept}");
    let order = api.resolve_reconciliation(id, accept).await?;
    Ok(HttpResponse::Ok().json(order))
}

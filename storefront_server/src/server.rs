use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::{header, KeepAlive},
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use fulfillment_engine::{
    db_types::NewProduct,
    events::EventProducers,
    helpers::WebhookVerifier,
    traits::FulfillmentDatabase,
    CatalogApi,
    CheckoutSessionApi,
    DirectOrderApi,
    OrderFinalizer,
    SqliteDatabase,
    WebhookProcessor,
};
use futures::{future::ok, FutureExt};
use gateway_tools::GatewayApi;
use log::*;
use sf_common::Secret;

use crate::{
    config::ServerConfig,
    data_objects::WebhookSignatureHeader,
    errors::ServerError,
    integrations::{
        gateway::GatewayAdapter,
        notifier::{create_notifier_event_handlers, ReceiptNotifier},
    },
    routes::{
        health,
        CheckoutSessionRoute,
        GatewayWebhookRoute,
        OperatorAlertsRoute,
        ProductByIdRoute,
        ProductsRoute,
        ResolveOrderRoute,
        SubmitOrderRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    if let Some(path) = &config.catalog_file {
        seed_catalog(&db, path).await?;
    }
    let gateway = GatewayAdapter::new(GatewayApi::new(config.gateway.clone())?);
    let notifier = ReceiptNotifier::new(config.mail_relay_url.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notifier_event_handlers(notifier);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Upserts the products listed in `path` into the catalog. Stock levels in the file replace the stored ones.
pub async fn seed_catalog(db: &SqliteDatabase, path: &str) -> Result<(), ServerError> {
    let data = tokio::fs::read_to_string(path).await?;
    let catalog = serde_json::from_str::<Vec<NewProduct>>(&data)
        .map_err(|e| ServerError::ConfigurationError(format!("{path} is not a valid catalog file. {e}")))?;
    let products = db
        .seed_products(&catalog)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not seed the catalog. {e}")))?;
    info!("🚀️ {} products loaded from {path}", products.len());
    Ok(())
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: GatewayAdapter,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let finalizer = OrderFinalizer::new(db.clone(), producers.clone());
        let verifier = WebhookVerifier::new(config.webhook.secret.clone(), config.webhook.tolerance);
        let catalog_api = CatalogApi::new(db.clone());
        let orders_api =
            DirectOrderApi::new(finalizer.clone(), gateway.clone()).with_charge_timeout(config.gateway.timeout);
        let checkout_api = CheckoutSessionApi::new(
            db.clone(),
            gateway.clone(),
            config.checkout_urls.clone(),
            config.gateway.timeout,
        );
        let webhook_api = WebhookProcessor::new(finalizer.clone(), verifier);
        let operator = config.operator.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sf::access_log"))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(webhook_api))
            .app_data(web::Data::new(finalizer))
            .app_data(web::Data::new(WebhookSignatureHeader(config.webhook.signature_header.clone())))
            .service(health)
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(SubmitOrderRoute::<SqliteDatabase, GatewayAdapter>::new())
            .service(CheckoutSessionRoute::<SqliteDatabase, GatewayAdapter>::new())
            .service(GatewayWebhookRoute::<SqliteDatabase>::new())
            .configure(|cfg| {
                if operator.enabled {
                    configure_operator_routes::<SqliteDatabase>(cfg, operator.api_key);
                }
            })
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Mounts the operator routes under `/operator`. Every request must carry `Authorization: Bearer <operator key>`.
pub fn configure_operator_routes<B>(cfg: &mut web::ServiceConfig, api_key: Secret<String>)
where B: FulfillmentDatabase + 'static
{
    let scope = web::scope("/operator")
        .wrap_fn(move |req, srv| {
            let authorized = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .is_some_and(|token| keys_match(token, api_key.reveal()));
            if authorized {
                srv.call(req)
            } else {
                warn!("💻️ Refused operator request to {} without a valid key", req.path());
                let err = ServerError::Unauthorized("A valid operator key is required.".into());
                ok(req.error_response(err)).boxed_local()
            }
        })
        .service(OperatorAlertsRoute::<B>::new())
        .service(ResolveOrderRoute::<B>::new());
    cfg.service(scope);
}

/// Compares every byte, so the time taken does not depend on where the keys differ.
fn keys_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len() && given.bytes().zip(expected.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

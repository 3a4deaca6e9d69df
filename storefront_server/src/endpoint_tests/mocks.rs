use fulfillment_engine::{
    db_types::{
        DedupRecord,
        LineItem,
        Money,
        NewOrder,
        NewReconciliationAlert,
        Order,
        OrderId,
        OrderStatusType,
        Product,
        ReconciliationAlert,
    },
    traits::{
        ChargeRequest,
        ChargeResult,
        FulfillmentDatabase,
        FulfillmentError,
        GatewayError,
        HostedSession,
        InsertOrderResult,
        InventoryError,
        InventoryManagement,
        OrderManagement,
        OrderStoreError,
        PaymentGateway,
        Reservation,
        SessionRequest,
    },
};
use mockall::mock;

mock! {
    pub FulfillmentDb {}
    impl Clone for FulfillmentDb {
        fn clone(&self) -> Self;
    }
    impl InventoryManagement for FulfillmentDb {
        async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, InventoryError>;
        async fn fetch_products(&self) -> Result<Vec<Product>, InventoryError>;
        async fn quote(&self, items: &[LineItem]) -> Result<Money, InventoryError>;
        async fn check_and_reserve(&self, items: &[LineItem]) -> Result<Reservation, InventoryError>;
    }
    impl OrderManagement for FulfillmentDb {
        async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_latest_order_for_email(&self, email: &str) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_for_key(&self, idempotency_key: &str) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_dedup_record(&self, idempotency_key: &str) -> Result<Option<DedupRecord>, OrderStoreError>;
    }
    impl FulfillmentDatabase for FulfillmentDb {
        fn url(&self) -> &str;
        async fn fulfil_order(&self, order: NewOrder) -> Result<InsertOrderResult, FulfillmentError>;
        async fn insert_failed_order(&self, order: NewOrder, total: Money) -> Result<Order, FulfillmentError>;
        async fn update_order_status(&self, id: OrderId, status: OrderStatusType) -> Result<Order, FulfillmentError>;
        async fn record_alert(&self, alert: NewReconciliationAlert) -> Result<ReconciliationAlert, FulfillmentError>;
        async fn fetch_alerts(&self) -> Result<Vec<ReconciliationAlert>, FulfillmentError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, GatewayError>;
        async fn create_hosted_session(&self, request: SessionRequest) -> Result<HostedSession, GatewayError>;
    }
}

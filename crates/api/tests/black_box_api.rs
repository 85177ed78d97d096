use reqwest::StatusCode;
use serde_json::{json, Value};

use gymops_infra::AppConfig;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod over an in-memory store, bound to an ephemeral port.
    async fn spawn() -> Self {
        let config = AppConfig::from_lookup(|_| None).expect("default config");
        let facade = gymops_api::app::services::build_facade(&config)
            .await
            .expect("failed to build facade");
        let app = gymops_api::app::build_app(facade);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// Correa TRX: 50 in the central warehouse, 4 at centro_sevilla with a
    /// minimum of 2. Returns the item id.
    async fn seed_trx(&self) -> String {
        let res = self
            .post(
                "/items",
                json!({
                    "sku": "TRX-1",
                    "name": "Correa TRX",
                    "category": "material",
                    "unit": "unidad",
                    "purchase_price_cents": 3000,
                    "sale_price_cents": 5500,
                }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let item: Value = res.json().await.unwrap();
        let item_id = item["id"].as_str().unwrap().to_string();

        for (location, min, initial) in [("almacen_central", 0, 50), ("centro_sevilla", 2, 4)] {
            let res = self
                .post(
                    "/stock",
                    json!({
                        "item_id": item_id,
                        "location": location,
                        "min_stock": min,
                        "initial_stock": initial,
                        "performed_by": "Ana García",
                    }),
                )
                .await;
            assert_eq!(res.status(), StatusCode::CREATED);
        }
        item_id
    }

    async fn consume(&self, quantity: i64) -> reqwest::Response {
        self.post(
            "/consumption",
            json!({
                "item_name": "Correa TRX",
                "quantity": quantity,
                "location": "centro_sevilla",
                "reason": "rotura en clase",
                "reported_by": "Luis",
            }),
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = server.get("/health").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn settings_expose_reorder_defaults() {
    let server = TestServer::spawn().await;
    let body: Value = server.get("/settings").await.json().await.unwrap();
    assert_eq!(body["central_warehouse"], "almacen_central");
    assert_eq!(body["reorder_multiplier"], 2);
}

#[tokio::test]
async fn consumption_opens_alert_and_reorder_runs_full_lifecycle() {
    let server = TestServer::spawn().await;
    server.seed_trx().await;

    let res = server.consume(3).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let report: Value = res.json().await.unwrap();
    assert_eq!(report["entry"]["current_stock"], 1);
    assert_eq!(report["entry"]["available_stock"], 1);
    assert_eq!(report["alert"]["alert_type"], "low-stock");
    assert_eq!(report["alert"]["severity"], "high");
    let alert_id = report["alert"]["id"].as_str().unwrap().to_string();

    let alerts: Value = server.get("/locations/centro_sevilla/alerts").await.json().await.unwrap();
    assert_eq!(alerts.as_array().unwrap().len(), 1);

    let res = server
        .post(&format!("/alerts/{alert_id}/reorder"), json!({ "requested_by": "Ana García" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    assert_eq!(order["order_number"], "PED-AUTO-001");
    assert_eq!(order["status"], "pendiente");
    assert_eq!(order["from_location"], "almacen_central");
    assert_eq!(order["to_location"], "centro_sevilla");
    assert_eq!(order["lines"][0]["quantity"], 4);
    assert_eq!(order["total_amount"], 12_000);
    let order_id = order["id"].as_str().unwrap().to_string();

    let pending: Value = server.get("/orders/pending").await.json().await.unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let res = server
        .post(&format!("/orders/{order_id}/process"), json!({ "processed_by": "Admin" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let processed: Value = res.json().await.unwrap();
    assert_eq!(processed["status"], "procesando");
    assert_eq!(processed["processed_by"], "Admin");

    let res = server
        .post(&format!("/orders/{order_id}/process"), json!({ "processed_by": "Admin" }))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_transition");

    let res = server.post(&format!("/orders/{order_id}/ship"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server
        .post(&format!("/orders/{order_id}/deliver"), json!({ "received_by": "Luis" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.post(&format!("/orders/{order_id}/pay"), json!({})).await;
    let paid: Value = res.json().await.unwrap();
    assert_eq!(paid["status"], "entregado");
    assert_eq!(paid["payment_status"], "pagado");

    let stats: Value = server.get("/orders/stats").await.json().await.unwrap();
    assert_eq!(stats["total_orders"], 1);
    assert_eq!(stats["completed_orders"], 1);
    assert_eq!(stats["total_value"], 12_000);

    let sevilla: Value = server.get("/locations/centro_sevilla/orders").await.json().await.unwrap();
    assert_eq!(sevilla.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn transfer_auto_resolves_the_alert() {
    let server = TestServer::spawn().await;
    let item_id = server.seed_trx().await;

    let report: Value = server.consume(3).await.json().await.unwrap();
    let alert_id = report["alert"]["id"].as_str().unwrap().to_string();

    let res = server
        .post(
            "/stock/transfer",
            json!({
                "item_id": item_id,
                "from_location": "almacen_central",
                "to_location": "centro_sevilla",
                "quantity": 4,
                "reason": "reposición",
                "performed_by": "logística",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let transfer: Value = res.json().await.unwrap();
    assert_eq!(transfer["source"]["current_stock"], 46);
    assert_eq!(transfer["destination"]["current_stock"], 5);

    let alerts: Value = server.get("/locations/centro_sevilla/alerts").await.json().await.unwrap();
    assert!(alerts.as_array().unwrap().is_empty());

    let alert: Value = server.get(&format!("/alerts/{alert_id}")).await.json().await.unwrap();
    assert_eq!(alert["is_resolved"], true);
    assert_eq!(alert["resolved_by"], "system");

    let res = server
        .post(&format!("/alerts/{alert_id}/reorder"), json!({ "requested_by": "Ana García" }))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn movement_history_is_newest_first_and_filterable() {
    let server = TestServer::spawn().await;
    let item_id = server.seed_trx().await;
    server.consume(1).await;

    let movements: Value = server
        .get("/movements?location=centro_sevilla")
        .await
        .json()
        .await
        .unwrap();
    let movements = movements.as_array().unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0]["movement_type"], "shrinkage");
    assert_eq!(movements[1]["movement_type"], "adjustment");

    let all: Value = server
        .get(&format!("/movements?item_id={item_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 3);

    let stock: Value = server.get("/locations/centro_sevilla/stock").await.json().await.unwrap();
    assert_eq!(stock[0]["current_stock"], 3);
}

#[tokio::test]
async fn domain_errors_map_to_status_codes() {
    let server = TestServer::spawn().await;
    server.seed_trx().await;

    let res = server
        .post(
            "/consumption",
            json!({
                "item_name": "Kettlebell",
                "quantity": 1,
                "location": "centro_sevilla",
                "reported_by": "Luis",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "item_not_found");

    let res = server.consume(10).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");

    let res = server.consume(0).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .post(
            "/consumption",
            json!({
                "item_name": "Correa TRX",
                "quantity": 1,
                "location": "centro_malaga",
                "reported_by": "Luis",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "no_stock_record");

    let res = server.post("/orders/not-a-uuid/ship", json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");

    let res = server
        .post(
            "/alerts/0190e6b2-6c1a-7000-8000-000000000000/resolve",
            json!({ "resolved_by": "Ana" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shipping_a_pending_order_is_rejected() {
    let server = TestServer::spawn().await;
    let item_id = server.seed_trx().await;

    let res = server
        .post(
            "/orders",
            json!({
                "item_id": item_id,
                "from_location": "almacen_central",
                "to_location": "centro_sevilla",
                "quantity": 5,
                "requested_by": "Ana García",
                "reason": "temporada alta",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap();

    let res = server.post(&format!("/orders/{order_id}/ship"), json!({})).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = server
        .post(&format!("/orders/{order_id}/cancel"), json!({ "reason": "duplicado" }))
        .await;
    let cancelled: Value = res.json().await.unwrap();
    assert_eq!(cancelled["status"], "cancelado");
    assert_eq!(cancelled["cancel_reason"], "duplicado");
}

//! Router-level tests: requests go through the session middleware, the JSON
//! mapping and the in-memory service wiring, without binding a socket.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

use reclaim_api::app::{build_app, services::{AppServices, build_services}};
use reclaim_api::context::{ROLE_HEADER, TENANT_HEADER, USER_HEADER};
use reclaim_core::{CustomerId, TenantId, UserId};
use reclaim_infra::{EngineConfig, InventoryRepository};
use reclaim_inventory::{InventoryLot, InventoryLotId, LotStatus, SkuId};

struct Api {
    app: Router,
    services: Arc<AppServices>,
    tenant_id: TenantId,
}

impl Api {
    fn new() -> Self {
        let services = build_services(&EngineConfig::default());
        Self {
            app: build_app(services.clone()),
            services,
            tenant_id: TenantId::new(),
        }
    }

    async fn call(&self, method: Method, uri: &str, role: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            req = req
                .header(TENANT_HEADER, self.tenant_id.to_string())
                .header(USER_HEADER, UserId::new().to_string())
                .header(ROLE_HEADER, role);
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn sales(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call(method, uri, Some("sales"), body).await
    }

    async fn manager(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call(method, uri, Some("manager"), body).await
    }

    /// Create, convert, compute tax. Returns the order id.
    async fn taxed_draft(&self) -> String {
        let (status, order) = self.sales(Method::POST, "/sales/orders", Some(create_body())).await;
        assert_eq!(status, StatusCode::CREATED, "{order}");
        let id = order["id"].as_str().unwrap().to_string();

        let (status, _) = self.sales(Method::POST, &format!("/sales/orders/{id}/convert"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, order) = self.sales(Method::POST, &format!("/sales/orders/{id}/tax"), None).await;
        assert_eq!(status, StatusCode::OK, "{order}");
        id
    }

    fn stock(&self, sku: &str, on_hand: Decimal) {
        let lot = InventoryLot {
            lot_id: InventoryLotId::new(),
            tenant_id: self.tenant_id,
            sku_id: SkuId::new(sku).unwrap(),
            location: "Yard A".to_string(),
            on_hand,
            status: LotStatus::Available,
        };
        InventoryRepository::new(self.services.orders.store())
            .put(self.tenant_id, &[lot])
            .unwrap();
    }
}

fn create_body() -> Value {
    let ship_to = json!({
        "line1": "410 Smelter Rd",
        "city": "Hamilton",
        "region": "ON",
        "postal_code": "L8L 4S7",
        "country": "CA",
        "contact_name": "Priya Nair"
    });
    json!({
        "header": {
            "customer_id": CustomerId::new(),
            "bill_to": ship_to.clone(),
            "ship_to": ship_to,
            "currency": "CAD"
        },
        "lines": [{
            "sku_id": "CU-1",
            "description": "Bare bright copper",
            "tax_category": "tangible_goods",
            "quantity_ordered": "100",
            "unit_price": "10.00",
            "unit_of_measure": "t"
        }]
    })
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let api = Api::new();
    let (status, body) = api.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn requests_without_session_headers_are_rejected() {
    let api = Api::new();
    let (status, body) = api.call(Method::POST, "/sales/orders", None, Some(create_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn order_moves_from_quotation_to_closed() {
    let api = Api::new();
    let id = api.taxed_draft().await;

    let (_, order) = api.sales(Method::GET, &format!("/sales/orders/{id}"), None).await;
    let totals = &order["header"]["tax_breakdown"]["totals"];
    assert_eq!(decimal(&totals["totalTax"]), dec!(130));
    assert_eq!(decimal(&totals["grandTotal"]), dec!(1130));

    let (status, order) = api.sales(Method::POST, &format!("/sales/orders/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["header"]["status"], "PENDING_APPROVAL");

    api.stock("CU-1", dec!(60));
    let (_, preview) = api.sales(Method::GET, &format!("/sales/orders/{id}/allocation"), None).await;
    assert_eq!(decimal(&preview["lines"][0]["allocatable"]), dec!(60));

    let (status, order) = api.manager(Method::POST, &format!("/sales/orders/{id}/approve"), None).await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["header"]["status"], "APPROVED");
    assert_eq!(decimal(&order["lines"][0]["quantity_allocated"]), dec!(60));
    assert_eq!(decimal(&order["lines"][0]["quantity_backordered"]), dec!(40));

    for (action, status) in [
        ("release", "RELEASED"),
        ("partially-invoice", "PARTIALLY_INVOICED"),
        ("close", "CLOSED"),
    ] {
        let (code, order) = api.manager(Method::POST, &format!("/sales/orders/{id}/{action}"), None).await;
        assert_eq!(code, StatusCode::OK, "{action}: {order}");
        assert_eq!(order["header"]["status"], status);
    }
}

#[tokio::test]
async fn signature_callback_moves_order_to_approval() {
    let api = Api::new();
    let id = api.taxed_draft().await;

    let (status, order) = api
        .sales(
            Method::POST,
            &format!("/sales/orders/{id}/submit-for-signature"),
            Some(json!({ "signer_email": "buyer@example.com", "signer_name": "Priya Nair" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["header"]["status"], "PENDING_CUSTOMER_SIGNATURE");
    let request_id = order["header"]["signature"]["request"]["request_id"].as_str().unwrap().to_string();

    let (status, order) = api
        .sales(
            Method::POST,
            "/sales/signature-callbacks",
            Some(json!({ "order_id": id, "request_id": request_id, "status": "signed", "document_ref": "doc-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["header"]["status"], "PENDING_APPROVAL");
}

#[tokio::test]
async fn submission_without_current_tax_is_a_conflict() {
    let api = Api::new();
    let id = api.taxed_draft().await;

    let (_, order) = api.sales(Method::GET, &format!("/sales/orders/{id}"), None).await;
    let mut lines = create_body()["lines"].clone();
    lines[0]["line_id"] = order["lines"][0]["line_id"].clone();
    lines[0]["quantity_ordered"] = json!("120");
    let (status, _) = api
        .sales(Method::PUT, &format!("/sales/orders/{id}"), Some(json!({ "lines": lines })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = api.sales(Method::POST, &format!("/sales/orders/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "tax_breakdown_missing");
}

#[tokio::test]
async fn stale_expected_version_is_rejected() {
    let api = Api::new();
    let (_, order) = api.sales(Method::POST, "/sales/orders", Some(create_body())).await;
    let id = order["id"].as_str().unwrap();
    let revision = order["revision"].as_u64().unwrap();

    let (status, _) = api
        .sales(
            Method::POST,
            &format!("/sales/orders/{id}/convert"),
            Some(json!({ "expected_version": revision })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = api
        .sales(
            Method::POST,
            &format!("/sales/orders/{id}/cancel"),
            Some(json!({ "expected_version": revision, "reason": "duplicate" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "stale_revision");
}

#[tokio::test]
async fn sales_role_cannot_approve() {
    let api = Api::new();
    let id = api.taxed_draft().await;
    api.sales(Method::POST, &format!("/sales/orders/{id}/confirm"), None).await;

    let (status, body) = api.sales(Method::POST, &format!("/sales/orders/{id}/approve"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn invalid_transitions_and_bad_input_map_to_client_errors() {
    let api = Api::new();
    let (_, order) = api.sales(Method::POST, "/sales/orders", Some(create_body())).await;
    let id = order["id"].as_str().unwrap();

    let (status, _) = api.manager(Method::POST, &format!("/sales/orders/{id}/release"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = api
        .sales(Method::POST, &format!("/sales/orders/{id}/cancel"), Some(json!({ "reason": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cancellation_reason_missing");

    let (status, body) = api.sales(Method::GET, "/sales/orders/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn deleted_orders_are_gone() {
    let api = Api::new();
    let (_, order) = api.sales(Method::POST, "/sales/orders", Some(create_body())).await;
    let id = order["id"].as_str().unwrap();

    let (status, _) = api.sales(Method::DELETE, &format!("/sales/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = api.sales(Method::GET, &format!("/sales/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn orders_are_invisible_to_other_tenants() {
    let api = Api::new();
    let (_, order) = api.sales(Method::POST, "/sales/orders", Some(create_body())).await;
    let id = order["id"].as_str().unwrap();

    let other = Api {
        app: api.app.clone(),
        services: api.services.clone(),
        tenant_id: TenantId::new(),
    };
    let (status, _) = other.sales(Method::GET, &format!("/sales/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use reclaim_core::ExpectedVersion;
use reclaim_infra::{OrderServiceError, SessionContext};
use reclaim_sales::{SalesOrder, SalesOrderId};

use crate::app::dto::{
    AllocationPreviewResponse, CancelRequest, CreateOrderRequest, OrderResponse, RequestChangesRequest,
    SignatureCallbackRequest, SubmitForSignatureRequest, UpdateOrderRequest, VersionedRequest,
};
use crate::app::errors::{json_error, service_error_to_response};
use crate::app::services::{AppOrderService, AppServices};

type Services = Extension<Arc<AppServices>>;
type Session = Extension<SessionContext>;

/// Operations that only need the order id and the client's revision.
type Transition =
    fn(&AppOrderService, &SessionContext, SalesOrderId, ExpectedVersion) -> Result<SalesOrder, OrderServiceError>;

fn parse_order_id(raw: &str) -> Result<SalesOrderId, Response> {
    raw.parse()
        .map(SalesOrderId::new)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}")))
}

fn order_response(status: StatusCode, result: Result<SalesOrder, OrderServiceError>) -> Response {
    match result {
        Ok(order) => (status, Json(OrderResponse::from(&order))).into_response(),
        Err(e) => service_error_to_response(e),
    }
}

async fn run_transition(
    services: Arc<AppServices>,
    session: SessionContext,
    raw_id: String,
    body: Option<Json<VersionedRequest>>,
    op: Transition,
) -> Response {
    let order_id = match parse_order_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let expected = body.map(|Json(b)| b).unwrap_or_default().expected();
    order_response(StatusCode::OK, op(&services.orders, &session, order_id, expected))
}

pub async fn create_order(
    Extension(services): Services,
    Extension(session): Session,
    Json(body): Json<CreateOrderRequest>,
) -> Response {
    order_response(StatusCode::CREATED, services.orders.create(&session, body.into_new_order()))
}

pub async fn get_order(Extension(services): Services, Extension(session): Session, Path(id): Path<String>) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    order_response(StatusCode::OK, services.orders.get(&session, order_id))
}

pub async fn update_order(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    Json(body): Json<UpdateOrderRequest>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let (expected, update) = body.into_parts();
    order_response(StatusCode::OK, services.orders.update(&session, order_id, expected, update))
}

pub async fn delete_order(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    body: Option<Json<VersionedRequest>>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let expected = body.map(|Json(b)| b).unwrap_or_default().expected();
    match services.orders.delete(&session, order_id, expected) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => service_error_to_response(e),
    }
}

pub async fn compute_tax(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    body: Option<Json<VersionedRequest>>,
) -> Response {
    run_transition(services, session, id, body, AppOrderService::compute_tax).await
}

pub async fn preview_allocation(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.orders.preview_allocation(&session, order_id) {
        Ok(lines) => Json(AllocationPreviewResponse { order_id, lines }).into_response(),
        Err(e) => service_error_to_response(e),
    }
}

pub async fn convert_to_draft(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    body: Option<Json<VersionedRequest>>,
) -> Response {
    run_transition(services, session, id, body, AppOrderService::convert_to_draft).await
}

pub async fn submit_for_signature(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    Json(body): Json<SubmitForSignatureRequest>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let (expected, signer) = body.into_parts();
    order_response(
        StatusCode::OK,
        services.orders.submit_for_signature(&session, order_id, expected, signer),
    )
}

pub async fn confirm_manually(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    body: Option<Json<VersionedRequest>>,
) -> Response {
    run_transition(services, session, id, body, AppOrderService::confirm_manually).await
}

pub async fn approve(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    body: Option<Json<VersionedRequest>>,
) -> Response {
    run_transition(services, session, id, body, AppOrderService::approve).await
}

pub async fn request_changes(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    body: Option<Json<RequestChangesRequest>>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let expected = ExpectedVersion::from_option(body.expected_version);
    order_response(
        StatusCode::OK,
        services.orders.request_changes(&session, order_id, expected, body.note),
    )
}

pub async fn release(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    body: Option<Json<VersionedRequest>>,
) -> Response {
    run_transition(services, session, id, body, AppOrderService::release).await
}

pub async fn mark_partially_invoiced(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    body: Option<Json<VersionedRequest>>,
) -> Response {
    run_transition(services, session, id, body, AppOrderService::mark_partially_invoiced).await
}

pub async fn close(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    body: Option<Json<VersionedRequest>>,
) -> Response {
    run_transition(services, session, id, body, AppOrderService::close).await
}

pub async fn cancel(
    Extension(services): Services,
    Extension(session): Session,
    Path(id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let expected = ExpectedVersion::from_option(body.expected_version);
    order_response(StatusCode::OK, services.orders.cancel(&session, order_id, expected, body.reason))
}

/// Provider callback, scoped to the tenant of the calling session.
pub async fn signature_callback(
    Extension(services): Services,
    Extension(session): Session,
    Json(body): Json<SignatureCallbackRequest>,
) -> Response {
    order_response(
        StatusCode::OK,
        services.orders.record_signature_status(session.tenant_id, body.into()),
    )
}

use axum::{
    Router,
    routing::{get, post},
};

pub mod orders;
pub mod system;

/// All session-protected routes.
pub fn router() -> Router {
    Router::new()
        .route("/sales/orders", post(orders::create_order))
        .route(
            "/sales/orders/:id",
            get(orders::get_order).put(orders::update_order).delete(orders::delete_order),
        )
        .route("/sales/orders/:id/tax", post(orders::compute_tax))
        .route("/sales/orders/:id/allocation", get(orders::preview_allocation))
        .route("/sales/orders/:id/convert", post(orders::convert_to_draft))
        .route("/sales/orders/:id/submit-for-signature", post(orders::submit_for_signature))
        .route("/sales/orders/:id/confirm", post(orders::confirm_manually))
        .route("/sales/orders/:id/approve", post(orders::approve))
        .route("/sales/orders/:id/request-changes", post(orders::request_changes))
        .route("/sales/orders/:id/release", post(orders::release))
        .route("/sales/orders/:id/partially-invoice", post(orders::mark_partially_invoiced))
        .route("/sales/orders/:id/close", post(orders::close))
        .route("/sales/orders/:id/cancel", post(orders::cancel))
        .route("/sales/signature-callbacks", post(orders::signature_callback))
}

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use contaflow_core::{ClientId, InvoiceId};

use crate::app::dto;
use crate::app::routes::common::{respond, respond_items};
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(issue_invoice).get(list_invoices))
        .route("/mark-overdue", post(mark_overdue))
        .route("/reports/sales", get(sales_report))
        .route("/reports/aging", get(receivables_aging))
        .route("/:id", get(get_invoice))
        .route("/:id/payments", post(register_invoice_payment))
        .route("/:id/void", post(void_invoice))
}

pub async fn issue_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateInvoiceRequest>,
) -> axum::response::Response {
    let (input, post_to_ledger) = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::CREATED,
        services.create_invoice(input, post_to_ledger, ctx.actor()).await,
    )
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::InvoiceListQuery>,
) -> axum::response::Response {
    let filter = match query.into_filter() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(services.list_invoices(&filter).await)
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InvoiceId = match dto::parse_id(&id, "invoice") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.get_invoice(id).await)
}

pub async fn register_invoice_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PaymentRequest>,
) -> axum::response::Response {
    let id: InvoiceId = match dto::parse_id(&id, "invoice") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services.register_payment(id, body.paid_on, ctx.actor()).await,
    )
}

pub async fn void_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::VoidInvoiceRequest>,
) -> axum::response::Response {
    let id: InvoiceId = match dto::parse_id(&id, "invoice") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.void_invoice(id, &body.reason).await)
}

pub async fn mark_overdue(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::AsOfQuery>,
) -> axum::response::Response {
    respond_items(services.mark_overdue_invoices(query.as_of).await)
}

pub async fn sales_report(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SalesReportQuery>,
) -> axum::response::Response {
    let client_id: Option<ClientId> = match query.client_id.as_deref().map(|c| dto::parse_id(c, "client")) {
        Some(Ok(v)) => Some(v),
        Some(Err(resp)) => return resp,
        None => None,
    };
    respond(
        StatusCode::OK,
        services.sales_report(query.from, query.to, client_id).await,
    )
}

pub async fn receivables_aging(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::AsOfQuery>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.receivables_aging(query.as_of).await)
}

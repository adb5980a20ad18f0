pub mod handlers;
pub mod response;

use crate::client::InvoiceBackend;
use crate::config::WorkflowConfig;
use crate::session::WorkspaceStore;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

pub use handlers::health_check;
pub use response::ApiResponse;

/// 共享状态: 工作区、后端客户端与流程配置
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<WorkspaceStore>,
    pub backend: Arc<dyn InvoiceBackend>,
    pub workflow: Arc<WorkflowConfig>,
}

impl AppState {
    pub fn new(backend: Arc<dyn InvoiceBackend>, workflow: WorkflowConfig) -> Self {
        Self {
            store: Arc::new(WorkspaceStore::new()),
            backend,
            workflow: Arc::new(workflow),
        }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    // 发票列表
    let invoice_routes = Router::new()
        .route("/invoices", get(handlers::get_invoices))
        .route("/invoices/refresh", post(handlers::refresh_invoices))
        .route("/invoices/page", post(handlers::go_to_page))
        .route("/invoices/next", post(handlers::next_page))
        .route("/invoices/prev", post(handlers::prev_page))
        .route("/invoices/delete", post(handlers::delete_selected))
        .route("/invoices/export", post(handlers::export_selected))
        .route("/filters", put(handlers::set_filters))
        .route("/selection", post(handlers::toggle_select_all))
        .route("/selection/:invoice_id", post(handlers::toggle_row))
        .route("/rows/:index/open", post(handlers::open_row))
        .route("/rows/:index/preview", get(handlers::preview_row));

    // 简易认证流程
    let flow_routes = Router::new()
        .route(
            "/flow",
            post(handlers::open_flow)
                .get(handlers::get_flow)
                .delete(handlers::close_flow),
        )
        .route("/flow/fields", put(handlers::update_field))
        .route("/flow/provider", put(handlers::select_provider))
        .route("/flow/carrier", put(handlers::select_carrier))
        .route("/flow/phone-prefix", put(handlers::select_phone_prefix))
        .route("/flow/consent", put(handlers::set_consent))
        .route("/flow/items/:item", put(handlers::update_item))
        .route("/flow/request", post(handlers::request_verification))
        .route("/flow/confirm", post(handlers::confirm_verification))
        .route("/flow/retry", post(handlers::retry_flow));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/workspaces", post(handlers::create_workspace))
        .route(
            "/api/workspaces/:id",
            axum::routing::delete(handlers::delete_workspace),
        )
        .nest("/api/workspaces/:id", invoice_routes.merge(flow_routes))
        .layer(ServiceBuilder::new())
        .with_state(state)
}

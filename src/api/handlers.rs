use super::response::ApiResponse;
use super::AppState;
use crate::error::{AppError, Result};
use crate::models::{
    AuthContext, Carrier, Consent, Field, FilterCriteria, OcrItem, UserRole, ValidationErrors,
    VerificationForm,
};
use crate::service::{
    FlowMode, FlowOutcome, FlowState, IdentityVerificationFlow, RowAction, TableView,
};
use crate::session::{schedule_outcome, SharedWorkspace, Workspace};
use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio::sync::MutexGuard;
use uuid::Uuid;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// 请求体: 创建工作区
#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub token: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct CreateWorkspaceResponse {
    pub workspace_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct OpenFlowRequest {
    #[serde(default)]
    pub items: Vec<OcrItem>,
}

#[derive(Debug, Deserialize)]
pub struct FieldRequest {
    pub field: Field,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ProviderRequest {
    pub level: u8,
}

#[derive(Debug, Deserialize)]
pub struct CarrierRequest {
    pub carrier: Carrier,
}

#[derive(Debug, Deserialize)]
pub struct PhonePrefixRequest {
    pub prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub consent: Consent,
    pub checked: bool,
}

/// 列表响应
#[derive(Debug, Serialize)]
pub struct InvoicesResponse {
    #[serde(flatten)]
    pub table: TableView,
    /// 认证完成后客户端应跳转的页面
    pub redirect_to: Option<String>,
}

/// 认证流程响应
#[derive(Debug, Serialize)]
pub struct FlowView {
    pub mode: FlowMode,
    #[serde(flatten)]
    pub state: FlowState,
    pub step: u8,
    pub form: VerificationForm,
    pub errors: ValidationErrors,
    pub items: Vec<OcrItem>,
    pub can_submit: bool,
    pub can_confirm: bool,
    pub outcome: Option<FlowOutcome>,
}

impl FlowView {
    fn new(flow: &IdentityVerificationFlow, outcome: Option<FlowOutcome>) -> Self {
        Self {
            mode: flow.mode(),
            state: flow.state().clone(),
            step: flow.step().number(),
            form: flow.form().clone(),
            errors: flow.errors().clone(),
            items: flow.items().to_vec(),
            can_submit: flow.can_submit(),
            can_confirm: flow.can_confirm(),
            outcome,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OpenRowResponse {
    pub action: RowAction,
    pub flow: Option<FlowView>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub url: String,
}

/// 列表类操作会等待后端，忙时直接拒绝
fn try_lock(shared: &SharedWorkspace) -> Result<MutexGuard<'_, Workspace>> {
    shared
        .try_lock()
        .map_err(|_| AppError::OperationInProgress("workspace"))
}

fn invoices_response(ws: &mut Workspace) -> Response {
    let body = InvoicesResponse {
        table: ws.list.view(&ws.auth),
        redirect_to: ws.take_redirect(),
    };
    ApiResponse::ok(body, ws.notices.drain())
}

fn flow_response(ws: &mut Workspace, outcome: Option<FlowOutcome>) -> Result<Response> {
    let view = FlowView::new(ws.flow()?, outcome);
    Ok(ApiResponse::ok(view, ws.notices.drain()))
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn create_workspace(
    State(state): State<AppState>,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Response {
    let auth = AuthContext::new(req.token, req.role);
    let workspace_id = state.store.create(auth, &state.workflow);
    ApiResponse::ok(CreateWorkspaceResponse { workspace_id }, Vec::new())
}

pub async fn delete_workspace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    state.store.remove(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn get_invoices(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    Ok(invoices_response(&mut ws))
}

/// 重新拉取当前页
pub async fn refresh_invoices(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    let ws = &mut *ws;
    ws.list.fetch(state.backend.as_ref(), &ws.auth, &ws.search).await;
    Ok(invoices_response(ws))
}

pub async fn set_filters(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(filters): Json<FilterCriteria>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    let ws = &mut *ws;
    ws.search.set_filters(filters);
    ws.list.fetch(state.backend.as_ref(), &ws.auth, &ws.search).await;
    Ok(invoices_response(ws))
}

pub async fn go_to_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PageRequest>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    let ws = &mut *ws;
    ws.list.go_to_page(req.page);
    ws.list.fetch(state.backend.as_ref(), &ws.auth, &ws.search).await;
    Ok(invoices_response(ws))
}

pub async fn next_page(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    let ws = &mut *ws;
    ws.list.next_page();
    ws.list.fetch(state.backend.as_ref(), &ws.auth, &ws.search).await;
    Ok(invoices_response(ws))
}

pub async fn prev_page(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    let ws = &mut *ws;
    ws.list.prev_page();
    ws.list.fetch(state.backend.as_ref(), &ws.auth, &ws.search).await;
    Ok(invoices_response(ws))
}

pub async fn toggle_row(
    State(state): State<AppState>,
    Path((id, invoice_id)): Path<(Uuid, i64)>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    ws.list.toggle_row(invoice_id)?;
    Ok(invoices_response(&mut ws))
}

pub async fn toggle_select_all(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    ws.list.toggle_select_all();
    Ok(invoices_response(&mut ws))
}

pub async fn delete_selected(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    let ws = &mut *ws;
    ws.list
        .bulk_delete(state.backend.as_ref(), &ws.auth, &ws.search, &mut ws.notices)
        .await;
    Ok(invoices_response(ws))
}

/// 导出成功时直接返回 Excel 文件
pub async fn export_selected(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    let ws = &mut *ws;
    let exported = ws
        .list
        .bulk_export(state.backend.as_ref(), &ws.auth, &mut ws.notices)
        .await;

    let response = match exported {
        Some(bytes) => (
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"tax-invoices.xlsx\""),
            ],
            bytes,
        )
            .into_response(),
        None => ApiResponse::<()>::failure(
            StatusCode::OK,
            "Nothing exported".to_string(),
            ws.notices.drain(),
        ),
    };
    Ok(response)
}

/// 点击行: 已审批/已驳回打开只读详情，未审批打开编辑认证流程
pub async fn open_row(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = try_lock(&shared)?;
    let action = ws
        .list
        .open_row_detail(state.backend.as_ref(), &ws.auth, index)
        .await?;

    let flow = match &action {
        RowAction::EditVerification { invoice_id, items, .. } => {
            let mode = FlowMode::Edit { tax_invoice_id: *invoice_id };
            let flow = IdentityVerificationFlow::new(mode, items.clone(), &state.workflow);
            let view = FlowView::new(&flow, None);
            ws.open_flow(flow);
            Some(view)
        }
        RowAction::ApprovalViewer { .. } => None,
    };

    Ok(ApiResponse::ok(OpenRowResponse { action, flow }, ws.notices.drain()))
}

pub async fn preview_row(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let ws = shared.lock().await;
    let url = ws.list.preview_url(index)?.to_string();
    Ok(ApiResponse::ok(PreviewResponse { url }, Vec::new()))
}

/// 新上传发票的认证流程
pub async fn open_flow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<OpenFlowRequest>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    let flow = IdentityVerificationFlow::new(FlowMode::NewSubmission, req.items, &state.workflow);
    ws.open_flow(flow);
    flow_response(&mut ws, None)
}

pub async fn get_flow(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    flow_response(&mut ws, None)
}

pub async fn close_flow(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    ws.close_flow();
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn update_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FieldRequest>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    ws.flow_mut()?.update_field(req.field, &req.value)?;
    flow_response(&mut ws, None)
}

pub async fn select_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProviderRequest>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    ws.flow_mut()?.select_provider(req.level)?;
    flow_response(&mut ws, None)
}

pub async fn select_carrier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CarrierRequest>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    ws.flow_mut()?.select_carrier(req.carrier)?;
    flow_response(&mut ws, None)
}

pub async fn select_phone_prefix(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PhonePrefixRequest>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    ws.flow_mut()?.select_phone_prefix(&req.prefix)?;
    flow_response(&mut ws, None)
}

pub async fn set_consent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ConsentRequest>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    ws.flow_mut()?.set_consent(req.consent, req.checked)?;
    flow_response(&mut ws, None)
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(item): Json<OcrItem>,
) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    ws.flow_mut()?.update_item(index, item)?;
    flow_response(&mut ws, None)
}

/// 发起简易认证; 等待后端期间不持有工作区锁
pub async fn request_verification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let shared = state.store.get(id)?;

    // 1. 切换到 Requesting，生成请求，记下流程代号
    let (plan, token, generation) = {
        let mut ws = shared.lock().await;
        let plan = ws.flow_mut()?.begin_auth_request()?;
        (plan, ws.auth.token.clone(), ws.flow_generation())
    };

    // 2. 调用后端
    let result =
        IdentityVerificationFlow::send_auth_plan(state.backend.as_ref(), &token, &plan).await;

    // 3. 回写结果; 流程已关闭或被替换则丢弃
    let mut ws = shared.lock().await;
    let ws = &mut *ws;
    if !ws.is_current_flow(generation) {
        tracing::warn!("Dropping auth response for a verification flow that is no longer open");
        return Err(AppError::InvalidState(
            "verification flow closed while requesting".to_string(),
        ));
    }
    let flow = ws.flow.as_mut().ok_or_else(|| {
        AppError::InvalidState("verification flow closed while requesting".to_string())
    })?;
    flow.finish_auth_request(result, &mut ws.notices);
    flow_response(ws, None)
}

/// 确认提供方签名; 成功后刷新列表或安排跳转
pub async fn confirm_verification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let shared = state.store.get(id)?;

    let (key, token, generation) = {
        let mut ws = shared.lock().await;
        let key = ws.flow_mut()?.begin_confirmation()?;
        (key, ws.auth.token.clone(), ws.flow_generation())
    };

    let result = state.backend.confirm_auth(&token, &key).await;

    let mut guard = shared.lock().await;
    let ws = &mut *guard;
    if !ws.is_current_flow(generation) {
        tracing::warn!("Dropping confirmation for a verification flow that is no longer open");
        return Err(AppError::InvalidState(
            "verification flow closed while confirming".to_string(),
        ));
    }
    let flow = ws.flow.as_mut().ok_or_else(|| {
        AppError::InvalidState("verification flow closed while confirming".to_string())
    })?;
    let outcome = flow.finish_confirmation(result, &mut ws.notices);
    let view = FlowView::new(flow, outcome.clone());

    match &outcome {
        Some(FlowOutcome::RefreshAndClose) => {
            ws.list.fetch(state.backend.as_ref(), &ws.auth, &ws.search).await;
            ws.close_flow();
        }
        Some(show @ FlowOutcome::ShowResults { .. }) => schedule_outcome(&shared, ws, show),
        None => {}
    }

    Ok(ApiResponse::ok(view, ws.notices.drain()))
}

pub async fn retry_flow(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    let shared = state.store.get(id)?;
    let mut ws = shared.lock().await;
    ws.flow_mut()?.retry()?;
    flow_response(&mut ws, None)
}

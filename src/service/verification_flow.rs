use crate::client::{ApiResult, InvoiceBackend};
use crate::config::WorkflowConfig;
use crate::error::{ApiError, AppError, Result};
use crate::models::{
    AuthRequest, AuthResult, Carrier, Consent, EditInvoiceRequest, Field, Notices, OcrItem,
    Provider, TaxInvoiceInfo, ValidationErrors, VerificationForm, PHONE_PREFIXES,
};
use crate::service::validation;
use serde::Serialize;
use std::time::Duration;

pub const AUTH_REQUEST_FAILED: &str = "인증 요청에 실패했습니다. 잠시 후 다시 시도해주세요.";
pub const SIGNATURE_INCOMPLETE: &str =
    "서명이 완료되지 않았습니다. 서명을 완료한 이후에 다시 시도해주세요.";
pub const CONFIRMATION_FAILED: &str = "인증 확인에 실패했습니다. 잠시 후 다시 시도해주세요.";

/// 流程用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowMode {
    /// 新上传的发票
    NewSubmission,
    /// 修改已有发票 (未审批行)
    Edit { tax_invoice_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    Request,
    Confirm,
}

/// 认证流程状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Editing,
    Requesting,
    AwaitingProviderConfirmation,
    Confirming,
    Done,
    Failed { stage: FailedStage, message: String },
}

/// 三步进度条，完全由状态推导
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Input = 1,
    Signature = 2,
    Verification = 3,
}

impl Step {
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl FlowState {
    pub fn step(&self) -> Step {
        match self {
            FlowState::Editing | FlowState::Requesting | FlowState::Done => Step::Input,
            FlowState::Failed { stage: FailedStage::Request, .. } => Step::Input,
            FlowState::AwaitingProviderConfirmation => Step::Signature,
            FlowState::Failed { stage: FailedStage::Confirm, .. } => Step::Signature,
            FlowState::Confirming => Step::Verification,
        }
    }

    fn is_pending(&self) -> bool {
        matches!(self, FlowState::Requesting | FlowState::Confirming)
    }
}

/// 认证完成后的后续动作
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// 编辑模式: 刷新列表并关闭弹窗
    RefreshAndClose,
    /// 新上传: 展示一段时间后跳转结果页
    ShowResults {
        #[serde(rename = "delay_ms", serialize_with = "duration_ms")]
        delay: Duration,
        path: String,
    },
}

fn duration_ms<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// 一次认证请求要发送的内容
#[derive(Debug, Clone, PartialEq)]
pub struct AuthPlan {
    /// 编辑模式下先发送的修改请求
    pub edit: Option<EditInvoiceRequest>,
    pub auth: AuthRequest,
}

/// 简易认证流程
///
/// 收集本人信息 -> 发起认证请求 -> 等待用户在提供方 App 内签名 -> 确认结果。
/// 网络调用分为 begin/finish 两段，调用方可以在等待期间释放锁;
/// `Requesting`/`Confirming` 期间重复提交会被拒绝。
#[derive(Debug)]
pub struct IdentityVerificationFlow {
    mode: FlowMode,
    state: FlowState,
    form: VerificationForm,
    errors: ValidationErrors,
    items: Vec<OcrItem>,
    result_delay: Duration,
    results_path: String,
}

impl IdentityVerificationFlow {
    pub fn new(mode: FlowMode, items: Vec<OcrItem>, config: &WorkflowConfig) -> Self {
        Self {
            mode,
            state: FlowState::Editing,
            form: VerificationForm {
                phone_prefix: PHONE_PREFIXES[0].to_string(),
                ..Default::default()
            },
            errors: ValidationErrors::default(),
            items,
            result_delay: config.result_delay(),
            results_path: config.results_path.clone(),
        }
    }

    pub fn mode(&self) -> FlowMode {
        self.mode
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn step(&self) -> Step {
        self.state.step()
    }

    pub fn form(&self) -> &VerificationForm {
        &self.form
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn items(&self) -> &[OcrItem] {
        &self.items
    }

    pub fn can_submit(&self) -> bool {
        self.state == FlowState::Editing && self.form.can_submit()
    }

    pub fn can_confirm(&self) -> bool {
        self.state == FlowState::AwaitingProviderConfirmation && self.form.is_request_confirmed
    }

    /// 只有编辑态可以修改表单; 请求失败后修改表单会回到编辑态
    fn ensure_editable(&mut self) -> Result<()> {
        match self.state {
            FlowState::Editing => Ok(()),
            FlowState::Failed { stage: FailedStage::Request, .. } => {
                self.state = FlowState::Editing;
                Ok(())
            }
            ref s if s.is_pending() => Err(AppError::OperationInProgress("verification request")),
            ref other => Err(AppError::InvalidState(format!("form is locked in {:?}", other))),
        }
    }

    /// 输入变化时清洗并重新校验该字段
    pub fn update_field(&mut self, field: Field, raw: &str) -> Result<()> {
        self.ensure_editable()?;
        let check = validation::check_field(field, raw);
        self.errors.set(field, check.error);
        match field {
            Field::Name => self.form.user_name = check.value,
            Field::Phone => self.form.phone_suffix = check.value,
            Field::Identity => self.form.identity = check.value,
        }
        Ok(())
    }

    pub fn select_provider(&mut self, level: u8) -> Result<()> {
        self.ensure_editable()?;
        let provider = Provider::from_level(level)
            .ok_or_else(|| AppError::Validation(format!("unknown provider level {}", level)))?;
        self.form.provider = Some(provider);
        Ok(())
    }

    pub fn select_carrier(&mut self, carrier: Carrier) -> Result<()> {
        self.ensure_editable()?;
        self.form.carrier = Some(carrier);
        Ok(())
    }

    pub fn select_phone_prefix(&mut self, prefix: &str) -> Result<()> {
        self.ensure_editable()?;
        if !PHONE_PREFIXES.contains(&prefix) {
            return Err(AppError::Validation(format!("unsupported phone prefix {}", prefix)));
        }
        self.form.phone_prefix = prefix.to_string();
        Ok(())
    }

    pub fn set_consent(&mut self, consent: Consent, checked: bool) -> Result<()> {
        self.ensure_editable()?;
        self.form.set_consent(consent, checked);
        Ok(())
    }

    /// 修正某条 OCR 数据
    pub fn update_item(&mut self, index: usize, item: OcrItem) -> Result<()> {
        self.ensure_editable()?;
        let slot = self
            .items
            .get_mut(index)
            .ok_or_else(|| AppError::NotFound(format!("ocr item {}", index)))?;
        *slot = item;
        Ok(())
    }

    /// Editing -> Requesting
    pub fn begin_auth_request(&mut self) -> Result<AuthPlan> {
        if self.state.is_pending() {
            return Err(AppError::OperationInProgress("verification request"));
        }
        if self.state != FlowState::Editing {
            return Err(AppError::InvalidState(format!(
                "cannot request verification in {:?}",
                self.state
            )));
        }
        if !self.form.can_submit() {
            return Err(AppError::Validation(
                "name, phone number, birth date and both consents are required".to_string(),
            ));
        }

        if self.items.is_empty() {
            tracing::warn!("No OCR data loaded, requesting verification without invoices");
        }

        let invoices: Vec<TaxInvoiceInfo> = self.items.iter().map(TaxInvoiceInfo::from).collect();
        let edit = match self.mode {
            FlowMode::Edit { tax_invoice_id } => {
                Some(EditInvoiceRequest::from_first_item(tax_invoice_id, &self.items))
            }
            FlowMode::NewSubmission => None,
        };

        self.state = FlowState::Requesting;
        Ok(AuthPlan {
            edit,
            auth: AuthRequest::new(&self.form, invoices),
        })
    }

    /// 发送修改请求 (如有) 与认证请求，不持有流程状态
    pub async fn send_auth_plan<B: InvoiceBackend + ?Sized>(
        backend: &B,
        token: &str,
        plan: &AuthPlan,
    ) -> ApiResult<AuthResult> {
        if let Some(edit) = &plan.edit {
            tracing::info!("Submitting invoice edit {} before verification", edit.tax_invoice_id);
            backend.edit_invoice(token, edit).await?;
        }
        backend.auth_request(token, &plan.auth).await
    }

    /// Requesting -> AwaitingProviderConfirmation | Failed
    pub fn finish_auth_request(&mut self, result: ApiResult<AuthResult>, notices: &mut Notices) {
        if self.state != FlowState::Requesting {
            tracing::warn!("Ignoring auth response received in {:?}", self.state);
            return;
        }

        match result {
            Ok(AuthResult { key: Some(key) }) => {
                tracing::info!("Verification requested, waiting for provider signature");
                self.form.session_key = Some(key);
                self.form.is_request_confirmed = true;
                self.state = FlowState::AwaitingProviderConfirmation;
            }
            Ok(AuthResult { key: None }) => {
                tracing::error!("Auth request succeeded without a provider session key");
                self.fail(FailedStage::Request, AUTH_REQUEST_FAILED, notices);
            }
            Err(e) => {
                tracing::error!("Auth request failed: {}", e);
                self.fail(FailedStage::Request, AUTH_REQUEST_FAILED, notices);
            }
        }
    }

    /// AwaitingProviderConfirmation -> Confirming, 返回会话 key
    pub fn begin_confirmation(&mut self) -> Result<String> {
        if self.state.is_pending() {
            return Err(AppError::OperationInProgress("verification confirmation"));
        }
        if !self.can_confirm() {
            return Err(AppError::InvalidState(
                "verification has not been requested yet".to_string(),
            ));
        }
        let key = self
            .form
            .session_key
            .clone()
            .ok_or_else(|| AppError::InvalidState("missing provider session key".to_string()))?;
        self.state = FlowState::Confirming;
        Ok(key)
    }

    /// Confirming -> Done | AwaitingProviderConfirmation (401) | Failed
    pub fn finish_confirmation(
        &mut self,
        result: std::result::Result<(), ApiError>,
        notices: &mut Notices,
    ) -> Option<FlowOutcome> {
        if self.state != FlowState::Confirming {
            tracing::warn!("Ignoring confirmation response received in {:?}", self.state);
            return None;
        }

        match result {
            Ok(()) => {
                self.state = FlowState::Done;
                let outcome = match self.mode {
                    FlowMode::Edit { .. } => FlowOutcome::RefreshAndClose,
                    FlowMode::NewSubmission => FlowOutcome::ShowResults {
                        delay: self.result_delay,
                        path: self.results_path.clone(),
                    },
                };
                tracing::info!("Verification confirmed: {:?}", outcome);
                Some(outcome)
            }
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Provider signature not completed yet");
                notices.warning(SIGNATURE_INCOMPLETE);
                self.state = FlowState::AwaitingProviderConfirmation;
                None
            }
            Err(e) => {
                tracing::error!("Verification confirmation failed: {}", e);
                self.fail(FailedStage::Confirm, CONFIRMATION_FAILED, notices);
                None
            }
        }
    }

    /// 从失败态恢复
    pub fn retry(&mut self) -> Result<()> {
        self.state = match &self.state {
            FlowState::Failed { stage: FailedStage::Request, .. } => FlowState::Editing,
            FlowState::Failed { stage: FailedStage::Confirm, .. } => {
                FlowState::AwaitingProviderConfirmation
            }
            other => return Err(AppError::InvalidState(format!("nothing to retry in {:?}", other))),
        };
        Ok(())
    }

    fn fail(&mut self, stage: FailedStage, message: &str, notices: &mut Notices) {
        notices.error(message);
        self.state = FlowState::Failed {
            stage,
            message: message.to_string(),
        };
    }

    /// 单一持有者使用: 发起认证请求
    pub async fn submit_auth_request<B: InvoiceBackend + ?Sized>(
        &mut self,
        backend: &B,
        token: &str,
        notices: &mut Notices,
    ) -> Result<()> {
        let plan = self.begin_auth_request()?;
        let result = Self::send_auth_plan(backend, token, &plan).await;
        self.finish_auth_request(result, notices);
        Ok(())
    }

    /// 单一持有者使用: 确认认证结果
    pub async fn confirm_verification<B: InvoiceBackend + ?Sized>(
        &mut self,
        backend: &B,
        token: &str,
        notices: &mut Notices,
    ) -> Result<Option<FlowOutcome>> {
        let key = self.begin_confirmation()?;
        let result = backend.confirm_auth(token, &key).await;
        Ok(self.finish_confirmation(result, notices))
    }
}

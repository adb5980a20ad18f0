use crate::config::WorkflowConfig;
use crate::error::{AppError, Result};
use crate::models::{AuthContext, Notices, SearchContext};
use crate::service::{FlowOutcome, IdentityVerificationFlow, InvoiceListController};
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// 一个用户画面的全部上下文
///
/// 登录信息、检索条件、列表、当前打开的认证流程与提示消息都显式挂在这里，
/// 创建工作区时初始化，删除工作区时一起销毁。
#[derive(Debug)]
pub struct Workspace {
    pub auth: AuthContext,
    pub search: SearchContext,
    pub list: InvoiceListController,
    pub flow: Option<IdentityVerificationFlow>,
    /// 每次打开或关闭流程递增，用来识别过期的后端回包
    flow_generation: u64,
    pub notices: Notices,
    /// 认证完成后待跳转的结果页
    pub redirect_to: Option<String>,
    redirect_timer: Option<JoinHandle<()>>,
}

impl Workspace {
    pub fn new(auth: AuthContext, config: &WorkflowConfig) -> Self {
        Self {
            auth,
            search: SearchContext::default(),
            list: InvoiceListController::new(config.page_size),
            flow: None,
            flow_generation: 0,
            notices: Notices::default(),
            redirect_to: None,
            redirect_timer: None,
        }
    }

    pub fn flow(&self) -> Result<&IdentityVerificationFlow> {
        self.flow
            .as_ref()
            .ok_or_else(|| AppError::NotFound("no verification flow is open".to_string()))
    }

    pub fn flow_mut(&mut self) -> Result<&mut IdentityVerificationFlow> {
        self.flow
            .as_mut()
            .ok_or_else(|| AppError::NotFound("no verification flow is open".to_string()))
    }

    pub fn flow_generation(&self) -> u64 {
        self.flow_generation
    }

    /// 发出请求时的流程仍是当前流程
    pub fn is_current_flow(&self, generation: u64) -> bool {
        self.flow.is_some() && self.flow_generation == generation
    }

    /// 打开新流程，旧流程直接丢弃
    pub fn open_flow(&mut self, flow: IdentityVerificationFlow) {
        self.cancel_redirect();
        self.redirect_to = None;
        self.flow_generation += 1;
        self.flow = Some(flow);
    }

    pub fn close_flow(&mut self) {
        self.cancel_redirect();
        self.flow_generation += 1;
        self.flow = None;
    }

    /// 跳转目标只返回一次
    pub fn take_redirect(&mut self) -> Option<String> {
        self.redirect_to.take()
    }

    fn cancel_redirect(&mut self) {
        if let Some(timer) = self.redirect_timer.take() {
            timer.abort();
        }
    }

    pub fn teardown(&mut self) {
        self.close_flow();
        self.notices.drain();
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.cancel_redirect();
    }
}

pub type SharedWorkspace = Arc<Mutex<Workspace>>;

/// 认证成功后的收尾: 编辑模式刷新列表并关闭流程，新上传则延时跳转
pub fn schedule_outcome(handle: &SharedWorkspace, workspace: &mut Workspace, outcome: &FlowOutcome) {
    if let FlowOutcome::ShowResults { delay, path } = outcome {
        let weak: Weak<Mutex<Workspace>> = Arc::downgrade(handle);
        let delay = *delay;
        let path = path.clone();
        workspace.cancel_redirect();
        workspace.redirect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // 工作区已销毁则什么都不做
            let Some(shared) = weak.upgrade() else { return };
            let mut ws = shared.lock().await;
            tracing::info!("Redirecting workspace to {}", path);
            ws.redirect_timer = None;
            ws.close_flow();
            ws.redirect_to = Some(path);
        }));
    }
}

/// 工作区存储
#[derive(Debug, Default)]
pub struct WorkspaceStore {
    workspaces: DashMap<Uuid, SharedWorkspace>,
}

impl WorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, auth: AuthContext, config: &WorkflowConfig) -> Uuid {
        let id = Uuid::new_v4();
        self.workspaces
            .insert(id, Arc::new(Mutex::new(Workspace::new(auth, config))));
        tracing::info!("Workspace {} created", id);
        id
    }

    pub fn get(&self, id: Uuid) -> Result<SharedWorkspace> {
        self.workspaces
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AppError::NotFound(format!("workspace {}", id)))
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let (_, shared) = self
            .workspaces
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("workspace {}", id)))?;
        shared.lock().await.teardown();
        tracing::info!("Workspace {} closed", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::service::FlowMode;
    use std::time::Duration;

    fn config() -> WorkflowConfig {
        WorkflowConfig {
            result_delay_ms: 20,
            ..Default::default()
        }
    }

    fn auth() -> AuthContext {
        AuthContext::new("token", UserRole::User)
    }

    #[tokio::test]
    async fn create_get_remove() {
        let store = WorkspaceStore::new();
        let id = store.create(auth(), &config());
        assert!(store.get(id).is_ok());
        store.remove(id).await.unwrap();
        assert!(matches!(store.get(id), Err(AppError::NotFound(_))));
        assert!(matches!(store.remove(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn redirect_fires_after_delay() {
        let store = WorkspaceStore::new();
        let id = store.create(auth(), &config());
        let shared = store.get(id).unwrap();
        {
            let mut ws = shared.lock().await;
            ws.open_flow(IdentityVerificationFlow::new(FlowMode::NewSubmission, vec![], &config()));
            let outcome = FlowOutcome::ShowResults {
                delay: Duration::from_millis(20),
                path: "/dashboard/searchfile".into(),
            };
            schedule_outcome(&shared, &mut ws, &outcome);
            assert!(ws.redirect_to.is_none());
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        let ws = shared.lock().await;
        assert_eq!(ws.redirect_to.as_deref(), Some("/dashboard/searchfile"));
        assert!(ws.flow.is_none());
    }

    #[tokio::test]
    async fn redirect_is_returned_once() {
        let mut ws = Workspace::new(auth(), &config());
        ws.redirect_to = Some("/dashboard/searchfile".into());
        assert_eq!(ws.take_redirect().as_deref(), Some("/dashboard/searchfile"));
        assert!(ws.take_redirect().is_none());
    }

    #[test]
    fn reopening_flow_changes_generation() {
        let mut ws = Workspace::new(auth(), &config());
        let flow = || IdentityVerificationFlow::new(FlowMode::NewSubmission, vec![], &config());

        ws.open_flow(flow());
        let first = ws.flow_generation();
        assert!(ws.is_current_flow(first));

        ws.close_flow();
        assert!(!ws.is_current_flow(first));
        ws.open_flow(flow());
        assert!(!ws.is_current_flow(first));
        assert!(ws.is_current_flow(ws.flow_generation()));
    }

    #[tokio::test]
    async fn closing_flow_cancels_redirect() {
        let store = WorkspaceStore::new();
        let id = store.create(auth(), &config());
        let shared = store.get(id).unwrap();
        {
            let mut ws = shared.lock().await;
            let outcome = FlowOutcome::ShowResults {
                delay: Duration::from_millis(20),
                path: "/dashboard/searchfile".into(),
            };
            schedule_outcome(&shared, &mut ws, &outcome);
            ws.close_flow();
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(shared.lock().await.redirect_to.is_none());
    }
}

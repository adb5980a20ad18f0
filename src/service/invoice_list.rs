use crate::client::InvoiceBackend;
use crate::error::{AppError, Result};
use crate::models::{
    format_date, row_number, ApprovalDetail, ApprovalStatus, AuthContext, InvoiceRecord, Notices,
    OcrItem, SearchContext,
};
use indexmap::IndexSet;
use serde::Serialize;

pub const DELETE_NOTHING_SELECTED: &str = "삭제할 항목을 선택하세요";
pub const EXPORT_NOTHING_SELECTED: &str = "내보낼 항목을 선택하세요";
pub const DELETE_SUCCEEDED: &str = "파일이 삭제되었습니다.";
pub const DELETE_FAILED: &str = "삭제하는데 실패했습니다.";

/// 点击行之后要打开的弹窗
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "modal", rename_all = "snake_case")]
pub enum RowAction {
    /// 只读审批详情 (已审批/已驳回)
    ApprovalViewer {
        number: String,
        invoice_id: i64,
        detail: ApprovalDetail,
    },
    /// 未审批: 修正 OCR 数据后走简易认证
    EditVerification {
        number: String,
        invoice_id: i64,
        items: Vec<OcrItem>,
    },
}

/// 列表行视图
#[derive(Debug, Clone, Serialize)]
pub struct RowView {
    pub number: String,
    pub id: i64,
    pub supplier: String,
    pub recipient: String,
    /// 仅管理员可见
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    pub date: String,
    pub file_url: String,
    pub status: ApprovalStatus,
    pub status_label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub page: u32,
    pub total_pages: u32,
    pub rows: Vec<RowView>,
    pub all_selected: bool,
    pub selected: Vec<i64>,
}

/// 发票列表: 分页、筛选、多选与批量操作
#[derive(Debug)]
pub struct InvoiceListController {
    rows: Vec<InvoiceRecord>,
    total_pages: u32,
    /// 用户选择的页码
    current_page: u32,
    /// 最近一次实际请求的页码
    loaded_page: u32,
    page_size: u32,
    selected: IndexSet<i64>,
}

impl InvoiceListController {
    pub fn new(page_size: u32) -> Self {
        Self {
            rows: Vec::new(),
            total_pages: 0,
            current_page: 1,
            loaded_page: 1,
            page_size: page_size.max(1),
            selected: IndexSet::new(),
        }
    }

    pub fn rows(&self) -> &[InvoiceRecord] {
        &self.rows
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn selected(&self) -> impl Iterator<Item = i64> + '_ {
        self.selected.iter().copied()
    }

    /// 拉取当前页; 失败时保留旧数据
    pub async fn fetch<B: InvoiceBackend + ?Sized>(
        &mut self,
        backend: &B,
        auth: &AuthContext,
        search: &SearchContext,
    ) {
        let params = search.search_params(self.current_page, self.page_size);
        tracing::debug!("Searching invoices: {:?}", params);

        match backend.search_invoices(&auth.token, &params).await {
            Ok(page) => {
                tracing::info!(
                    "Loaded {} invoices (page {}/{})",
                    page.content.len(),
                    params.page,
                    page.total_pages
                );
                self.rows = page.content;
                self.total_pages = page.total_pages;
                self.loaded_page = params.page;
                // 选中集合只保留当前页存在的行
                let visible: IndexSet<i64> = self.rows.iter().map(|r| r.id).collect();
                self.selected.retain(|id| visible.contains(id));
            }
            Err(e) => {
                tracing::warn!("Failed to load invoice list, keeping previous rows: {}", e);
            }
        }
    }

    /// 首次加载前总页数未知，不做上限
    pub fn go_to_page(&mut self, page: u32) {
        let page = page.max(1);
        self.current_page = if self.total_pages == 0 {
            page
        } else {
            page.min(self.total_pages)
        };
    }

    pub fn next_page(&mut self) {
        self.current_page = self
            .current_page
            .saturating_add(1)
            .min(self.total_pages.max(1));
    }

    pub fn prev_page(&mut self) {
        self.current_page = self.current_page.saturating_sub(1).max(1);
    }

    pub fn toggle_row(&mut self, id: i64) -> Result<()> {
        if !self.rows.iter().any(|r| r.id == id) {
            return Err(AppError::NotFound(format!("invoice {} is not on this page", id)));
        }
        if !self.selected.shift_remove(&id) {
            self.selected.insert(id);
        }
        Ok(())
    }

    pub fn is_all_selected(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| self.selected.contains(&r.id))
    }

    /// 全选/全不选，只针对当前页
    pub fn toggle_select_all(&mut self) {
        if self.selected.len() == self.rows.len() {
            self.selected.clear();
        } else {
            self.selected = self.rows.iter().map(|r| r.id).collect();
        }
    }

    /// 批量删除选中行
    pub async fn bulk_delete<B: InvoiceBackend + ?Sized>(
        &mut self,
        backend: &B,
        auth: &AuthContext,
        search: &SearchContext,
        notices: &mut Notices,
    ) {
        if self.selected.is_empty() {
            notices.warning(DELETE_NOTHING_SELECTED);
            return;
        }

        let ids: Vec<i64> = self.selected.iter().copied().collect();
        match backend.delete_invoices(&auth.token, &ids).await {
            Ok(()) => {
                tracing::info!("Deleted {} invoices", ids.len());
                self.selected.clear();
                self.fetch(backend, auth, search).await;
                notices.success(DELETE_SUCCEEDED);
            }
            Err(e) => {
                tracing::error!("Failed to delete invoices {:?}: {}", ids, e);
                notices.error(DELETE_FAILED);
            }
        }
    }

    /// 导出选中行; 失败只记录日志
    pub async fn bulk_export<B: InvoiceBackend + ?Sized>(
        &self,
        backend: &B,
        auth: &AuthContext,
        notices: &mut Notices,
    ) -> Option<Vec<u8>> {
        if self.selected.is_empty() {
            notices.error(EXPORT_NOTHING_SELECTED);
            return None;
        }

        let ids: Vec<i64> = self.selected.iter().copied().collect();
        match backend.export_invoices(&auth.token, &ids).await {
            Ok(bytes) => {
                tracing::info!("Exported {} invoices ({} bytes)", ids.len(), bytes.len());
                Some(bytes)
            }
            Err(e) => {
                tracing::error!("Failed to export invoices {:?}: {}", ids, e);
                None
            }
        }
    }

    pub fn row(&self, index: usize) -> Result<&InvoiceRecord> {
        self.rows
            .get(index)
            .ok_or_else(|| AppError::NotFound(format!("row {}", index)))
    }

    pub fn row_number(&self, index: usize) -> String {
        row_number(self.loaded_page, self.page_size, index)
    }

    /// 按行状态分派弹窗
    pub async fn open_row_detail<B: InvoiceBackend + ?Sized>(
        &self,
        backend: &B,
        auth: &AuthContext,
        index: usize,
    ) -> Result<RowAction> {
        let row = self.row(index)?;
        let number = self.row_number(index);
        let detail = backend.approval_detail(&auth.token, row.id).await?;

        let action = match row.status {
            ApprovalStatus::Approved | ApprovalStatus::Rejected => RowAction::ApprovalViewer {
                number,
                invoice_id: row.id,
                detail,
            },
            ApprovalStatus::Unapproved => RowAction::EditVerification {
                number,
                invoice_id: row.id,
                items: vec![OcrItem::from(&detail)],
            },
        };
        Ok(action)
    }

    /// 预览文件地址
    pub fn preview_url(&self, index: usize) -> Result<&str> {
        Ok(&self.row(index)?.file_url)
    }

    pub fn view(&self, auth: &AuthContext) -> TableView {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, r)| RowView {
                number: self.row_number(index),
                id: r.id,
                supplier: r.supplier_name.clone(),
                recipient: r.recipient_name.clone(),
                handler: if auth.is_admin() { r.handler.clone() } else { None },
                date: format_date(&r.issue_date).unwrap_or_else(|e| {
                    tracing::warn!("Invoice {} has bad date {:?}: {}", r.id, r.issue_date, e);
                    String::new()
                }),
                file_url: r.file_url.clone(),
                status: r.status,
                status_label: r.status.label(),
                selected: self.selected.contains(&r.id),
            })
            .collect();

        TableView {
            page: self.loaded_page,
            total_pages: self.total_pages,
            rows,
            all_selected: self.is_all_selected(),
            selected: self.selected.iter().copied().collect(),
        }
    }
}

//! 单元测试用的脚本化后端

use super::{ApiResult, InvoiceBackend};
use crate::models::{
    ApprovalDetail, ApprovalStatus, AuthRequest, AuthResult, EditInvoiceRequest, InvoiceRecord,
    Page, SearchParams,
};
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Auth(AuthRequest),
    Confirm(String),
    Edit(EditInvoiceRequest),
    Search(SearchParams),
    Delete(Vec<i64>),
    Export(Vec<i64>),
    Detail(i64),
}

/// 每个接口一个结果队列; 队列为空时返回默认成功结果
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    pub auth: Mutex<VecDeque<ApiResult<AuthResult>>>,
    pub confirm: Mutex<VecDeque<ApiResult<()>>>,
    pub edit: Mutex<VecDeque<ApiResult<()>>>,
    pub search: Mutex<VecDeque<ApiResult<Page<InvoiceRecord>>>>,
    pub delete: Mutex<VecDeque<ApiResult<()>>>,
    pub export: Mutex<VecDeque<ApiResult<Vec<u8>>>>,
    pub detail: Mutex<VecDeque<ApiResult<ApprovalDetail>>>,
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn push_search(&self, result: ApiResult<Page<InvoiceRecord>>) {
        self.search.lock().unwrap().push_back(result);
    }
}

fn next<T>(queue: &Mutex<VecDeque<ApiResult<T>>>, fallback: impl FnOnce() -> T) -> ApiResult<T> {
    queue.lock().unwrap().pop_front().unwrap_or_else(|| Ok(fallback()))
}

pub fn record(id: i64, status: ApprovalStatus) -> InvoiceRecord {
    InvoiceRecord {
        id,
        supplier_name: format!("공급자{}", id),
        supplier_id: "1112233333".into(),
        recipient_name: format!("공급받는자{}", id),
        recipient_id: "4445566666".into(),
        issue_date: vec![2025, 1, 5],
        handler: Some("kim".into()),
        file_url: format!("https://files.example/{}.png", id),
        status,
        charge_total: None,
    }
}

pub fn page(ids: &[i64], total_pages: u32) -> Page<InvoiceRecord> {
    Page {
        content: ids.iter().map(|&id| record(id, ApprovalStatus::Unapproved)).collect(),
        total_pages,
    }
}

pub fn detail(status: ApprovalStatus) -> ApprovalDetail {
    ApprovalDetail {
        issue_id: "20250105-41000000-12345678".into(),
        er_dat: "20250105".into(),
        su_name: "수급상사".into(),
        su_id: "4445566666".into(),
        ip_name: "공급상사".into(),
        ip_id: "1112233333".into(),
        tax_total: "15000".into(),
        process_status: status,
        url: "https://files.example/1.png".into(),
    }
}

impl InvoiceBackend for FakeBackend {
    fn auth_request<'a>(
        &'a self,
        _token: &'a str,
        request: &'a AuthRequest,
    ) -> BoxFuture<'a, ApiResult<AuthResult>> {
        self.record(Call::Auth(request.clone()));
        let result = next(&self.auth, || AuthResult { key: Some("key-1".into()) });
        Box::pin(async move { result })
    }

    fn confirm_auth<'a>(&'a self, _token: &'a str, key: &'a str) -> BoxFuture<'a, ApiResult<()>> {
        self.record(Call::Confirm(key.to_string()));
        let result = next(&self.confirm, || ());
        Box::pin(async move { result })
    }

    fn edit_invoice<'a>(
        &'a self,
        _token: &'a str,
        request: &'a EditInvoiceRequest,
    ) -> BoxFuture<'a, ApiResult<()>> {
        self.record(Call::Edit(request.clone()));
        let result = next(&self.edit, || ());
        Box::pin(async move { result })
    }

    fn search_invoices<'a>(
        &'a self,
        _token: &'a str,
        params: &'a SearchParams,
    ) -> BoxFuture<'a, ApiResult<Page<InvoiceRecord>>> {
        self.record(Call::Search(params.clone()));
        let result = next(&self.search, || page(&[], 0));
        Box::pin(async move { result })
    }

    fn delete_invoices<'a>(&'a self, _token: &'a str, ids: &'a [i64]) -> BoxFuture<'a, ApiResult<()>> {
        self.record(Call::Delete(ids.to_vec()));
        let result = next(&self.delete, || ());
        Box::pin(async move { result })
    }

    fn export_invoices<'a>(
        &'a self,
        _token: &'a str,
        ids: &'a [i64],
    ) -> BoxFuture<'a, ApiResult<Vec<u8>>> {
        self.record(Call::Export(ids.to_vec()));
        let result = next(&self.export, || b"xlsx".to_vec());
        Box::pin(async move { result })
    }

    fn approval_detail<'a>(
        &'a self,
        _token: &'a str,
        invoice_id: i64,
    ) -> BoxFuture<'a, ApiResult<ApprovalDetail>> {
        self.record(Call::Detail(invoice_id));
        let result = next(&self.detail, || detail(ApprovalStatus::Approved));
        Box::pin(async move { result })
    }
}

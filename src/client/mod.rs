pub mod http;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::ApiError;
use crate::models::{
    ApprovalDetail, AuthRequest, AuthResult, EditInvoiceRequest, InvoiceRecord, Page, SearchParams,
};
use futures::future::BoxFuture;

pub use http::{create_client, HttpBackend};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// 税务发票后端 API
///
/// 所有调用都带上登录 token; 具体的线上格式由后端决定。
pub trait InvoiceBackend: Send + Sync {
    /// 发起简易认证，返回提供方会话 key
    fn auth_request<'a>(
        &'a self,
        token: &'a str,
        request: &'a AuthRequest,
    ) -> BoxFuture<'a, ApiResult<AuthResult>>;

    /// 确认提供方签名结果; 未签名时返回 401
    fn confirm_auth<'a>(&'a self, token: &'a str, key: &'a str) -> BoxFuture<'a, ApiResult<()>>;

    fn edit_invoice<'a>(
        &'a self,
        token: &'a str,
        request: &'a EditInvoiceRequest,
    ) -> BoxFuture<'a, ApiResult<()>>;

    fn search_invoices<'a>(
        &'a self,
        token: &'a str,
        params: &'a SearchParams,
    ) -> BoxFuture<'a, ApiResult<Page<InvoiceRecord>>>;

    fn delete_invoices<'a>(&'a self, token: &'a str, ids: &'a [i64]) -> BoxFuture<'a, ApiResult<()>>;

    /// 导出 Excel，原样返回文件内容
    fn export_invoices<'a>(
        &'a self,
        token: &'a str,
        ids: &'a [i64],
    ) -> BoxFuture<'a, ApiResult<Vec<u8>>>;

    fn approval_detail<'a>(
        &'a self,
        token: &'a str,
        invoice_id: i64,
    ) -> BoxFuture<'a, ApiResult<ApprovalDetail>>;
}

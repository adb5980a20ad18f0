use super::{ApiResult, InvoiceBackend};
use crate::config::BackendConfig;
use crate::error::ApiError;
use crate::models::{
    ApprovalDetail, AuthRequest, AuthResult, EditInvoiceRequest, InvoiceRecord, Page, SearchParams,
};
use futures::future::BoxFuture;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 创建后端 HTTP 客户端
pub fn create_client(config: &BackendConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(20);

    // 默认不限时，与前端行为保持一致
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

/// 后端统一响应包装
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    result: Option<T>,
}

fn default_success() -> bool {
    true
}

#[derive(Serialize)]
struct ConfirmBody<'a> {
    key: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdListBody<'a> {
    tax_invoice_id_list: &'a [i64],
}

/// 基于 reqwest 的后端实现
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(create_client(config)?, config.base_url.clone()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 发送请求，检查状态码，返回原始响应体
    async fn send_raw(&self, request: RequestBuilder, token: &str) -> ApiResult<Vec<u8>> {
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            tracing::warn!("Backend responded {}: {}", status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body.to_vec())
    }

    /// 发送请求并拆开响应包装
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &str,
    ) -> ApiResult<Option<T>> {
        let body = self.send_raw(request, token).await?;
        if body.is_empty() {
            return Ok(None);
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        if !envelope.success {
            return Err(ApiError::Rejected {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            });
        }
        Ok(envelope.result)
    }

    async fn send_expecting<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &str,
    ) -> ApiResult<T> {
        self.send(request, token)
            .await?
            .ok_or_else(|| ApiError::Decode("missing result in response".to_string()))
    }
}

impl InvoiceBackend for HttpBackend {
    fn auth_request<'a>(
        &'a self,
        token: &'a str,
        request: &'a AuthRequest,
    ) -> BoxFuture<'a, ApiResult<AuthResult>> {
        Box::pin(async move {
            let req = self.client.post(self.url("/api/auth/simple")).json(request);
            // result 不是对象时视为没有 key
            let result = self.send::<serde_json::Value>(req, token).await?;
            Ok(result
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default())
        })
    }

    fn confirm_auth<'a>(&'a self, token: &'a str, key: &'a str) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(async move {
            let req = self
                .client
                .post(self.url("/api/auth/simple/confirm"))
                .json(&ConfirmBody { key });
            self.send::<serde_json::Value>(req, token).await.map(|_| ())
        })
    }

    fn edit_invoice<'a>(
        &'a self,
        token: &'a str,
        request: &'a EditInvoiceRequest,
    ) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(async move {
            let req = self.client.put(self.url("/api/tax-invoice")).json(request);
            self.send::<serde_json::Value>(req, token).await.map(|_| ())
        })
    }

    fn search_invoices<'a>(
        &'a self,
        token: &'a str,
        params: &'a SearchParams,
    ) -> BoxFuture<'a, ApiResult<Page<InvoiceRecord>>> {
        Box::pin(async move {
            let req = self.client.post(self.url("/api/tax-invoice/search")).json(params);
            self.send_expecting(req, token).await
        })
    }

    fn delete_invoices<'a>(&'a self, token: &'a str, ids: &'a [i64]) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(async move {
            let req = self
                .client
                .delete(self.url("/api/tax-invoice"))
                .json(&IdListBody { tax_invoice_id_list: ids });
            self.send::<serde_json::Value>(req, token).await.map(|_| ())
        })
    }

    fn export_invoices<'a>(
        &'a self,
        token: &'a str,
        ids: &'a [i64],
    ) -> BoxFuture<'a, ApiResult<Vec<u8>>> {
        Box::pin(async move {
            let req = self
                .client
                .post(self.url("/api/tax-invoice/excel"))
                .json(&IdListBody { tax_invoice_id_list: ids });
            self.send_raw(req, token).await
        })
    }

    fn approval_detail<'a>(
        &'a self,
        token: &'a str,
        invoice_id: i64,
    ) -> BoxFuture<'a, ApiResult<ApprovalDetail>> {
        Box::pin(async move {
            let req = self.client.get(self.url(&format!("/api/tax-invoice/{}", invoice_id)));
            self.send_expecting(req, token).await
        })
    }
}

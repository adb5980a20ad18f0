use crate::error::{AppError, Result};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 审批状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Unapproved,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// 列表徽章显示文字
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalStatus::Unapproved => "미승인",
            ApprovalStatus::Approved => "승인",
            ApprovalStatus::Rejected => "반려",
        }
    }
}

/// 已上传的税务发票 (列表行)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: i64,
    #[serde(rename = "ipBusinessName")]
    pub supplier_name: String,
    #[serde(rename = "ipId", default)]
    pub supplier_id: String,
    #[serde(rename = "suBusinessName")]
    pub recipient_name: String,
    #[serde(rename = "suId", default)]
    pub recipient_id: String,
    /// [年, 月, 日, ...]
    #[serde(rename = "createAt")]
    pub issue_date: Vec<i32>,
    #[serde(rename = "writer", default)]
    pub handler: Option<String>,
    #[serde(rename = "imageUrl")]
    pub file_url: String,
    pub status: ApprovalStatus,
    #[serde(default)]
    pub charge_total: Option<BigDecimal>,
}

/// 审批详情 (只读查看)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDetail {
    pub issue_id: String,
    pub er_dat: String,
    pub su_name: String,
    pub su_id: String,
    pub ip_name: String,
    pub ip_id: String,
    pub tax_total: String,
    pub process_status: ApprovalStatus,
    pub url: String,
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
}

/// 日期数组格式化为 YY.MM.DD
pub fn format_date(parts: &[i32]) -> Result<String> {
    let [year, month, day, ..] = parts else {
        return Err(AppError::InvalidDate);
    };
    Ok(format!("{:02}.{:02}.{:02}", year.rem_euclid(100), month, day))
}

/// 列表序号: 跨页连续编号，补零到三位
pub fn row_number(page: u32, page_size: u32, index: usize) -> String {
    let n = (page.max(1) as usize - 1) * page_size as usize + index + 1;
    format!("{:03}", n)
}

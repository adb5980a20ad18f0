use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;

use super::ApprovalDetail;

/// OCR 识别出的发票字段，用户可在认证前修正
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrItem {
    /// 承认番号
    #[serde(default)]
    pub issue_id: Option<String>,
    /// 作成日期
    #[serde(default)]
    pub er_dat: Option<String>,
    /// 供应方登记号
    #[serde(default)]
    pub ip_id: Option<String>,
    /// 接收方登记号
    #[serde(default)]
    pub su_id: Option<String>,
    /// 供给价额
    #[serde(default)]
    pub charge_total: Option<String>,
    #[serde(default)]
    pub ip_name: Option<String>,
    #[serde(default)]
    pub su_name: Option<String>,
}

impl From<&ApprovalDetail> for OcrItem {
    fn from(detail: &ApprovalDetail) -> Self {
        Self {
            issue_id: Some(detail.issue_id.clone()),
            er_dat: Some(detail.er_dat.clone()),
            ip_id: Some(detail.ip_id.clone()),
            su_id: Some(detail.su_id.clone()),
            charge_total: Some(detail.tax_total.clone()),
            ip_name: Some(detail.ip_name.clone()),
            su_name: Some(detail.su_name.clone()),
        }
    }
}

fn or_empty(field: &Option<String>) -> String {
    field.clone().unwrap_or_default()
}

/// 简易认证请求中的发票信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxInvoiceInfo {
    pub supplier_reg_number: String,
    #[serde(rename = "contractorRegNumber")]
    pub recipient_reg_number: String,
    #[serde(rename = "approvalNo")]
    pub approval_number: String,
    pub reporting_date: String,
    pub supply_value: String,
}

impl From<&OcrItem> for TaxInvoiceInfo {
    fn from(item: &OcrItem) -> Self {
        Self {
            supplier_reg_number: or_empty(&item.ip_id),
            recipient_reg_number: or_empty(&item.su_id),
            approval_number: or_empty(&item.issue_id),
            reporting_date: or_empty(&item.er_dat),
            supply_value: or_empty(&item.charge_total),
        }
    }
}

/// 修改请求 (编辑模式下先于认证请求发送)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditInvoiceRequest {
    pub tax_invoice_id: i64,
    pub issue_id: String,
    pub er_dat: String,
    pub su_id: String,
    pub ip_id: String,
    #[serde(serialize_with = "decimal_as_number")]
    pub charge_total: BigDecimal,
}

impl EditInvoiceRequest {
    /// 取第一条 OCR 数据; 无法解析的金额按 0 处理
    pub fn from_first_item(tax_invoice_id: i64, items: &[OcrItem]) -> Self {
        let first = items.first().cloned().unwrap_or_default();
        let charge_total = first
            .charge_total
            .as_deref()
            .map(|v| v.replace(',', ""))
            .and_then(|v| BigDecimal::from_str(v.trim()).ok())
            .unwrap_or_else(|| BigDecimal::from(0));
        Self {
            tax_invoice_id,
            issue_id: or_empty(&first.issue_id),
            er_dat: or_empty(&first.er_dat),
            su_id: or_empty(&first.su_id),
            ip_id: or_empty(&first.ip_id),
            charge_total,
        }
    }
}

fn decimal_as_number<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    match value.to_i64() {
        Some(n) if BigDecimal::from(n) == *value => serializer.serialize_i64(n),
        _ => serializer.serialize_f64(value.to_f64().unwrap_or(0.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> OcrItem {
        OcrItem {
            issue_id: Some("20250105-41000000-12345678".into()),
            er_dat: Some("20250105".into()),
            ip_id: Some("1112233333".into()),
            su_id: Some("4445566666".into()),
            charge_total: Some("1,250,000".into()),
            ..Default::default()
        }
    }

    #[test]
    fn tax_invoice_info_maps_supplier_and_recipient() {
        let info = TaxInvoiceInfo::from(&item());
        assert_eq!(info.supplier_reg_number, "1112233333");
        assert_eq!(info.recipient_reg_number, "4445566666");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["contractorRegNumber"], "4445566666");
        assert_eq!(json["approvalNo"], "20250105-41000000-12345678");
    }

    #[test]
    fn missing_fields_become_empty_strings() {
        let info = TaxInvoiceInfo::from(&OcrItem::default());
        assert_eq!(info.supply_value, "");
        assert_eq!(info.reporting_date, "");
    }

    #[test]
    fn edit_request_sends_numeric_charge_total() {
        let req = EditInvoiceRequest::from_first_item(42, &[item()]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["taxInvoiceId"], 42);
        assert_eq!(json["chargeTotal"], 1_250_000);
    }

    #[test]
    fn edit_request_without_items_defaults_to_zero() {
        let req = EditInvoiceRequest::from_first_item(1, &[]);
        assert_eq!(req.charge_total, BigDecimal::from(0));
        assert_eq!(req.issue_id, "");
    }
}

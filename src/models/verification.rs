use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::TaxInvoiceInfo;

/// 简易认证提供方 (loginTypeLevel 1..=9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Kakao,
    Payco,
    Samsung,
    KbBank,
    Pass,
    Naver,
    ShinhanBank,
    Toss,
    BankSalad,
}

impl Provider {
    pub const ALL: [Provider; 9] = [
        Provider::Kakao,
        Provider::Payco,
        Provider::Samsung,
        Provider::KbBank,
        Provider::Pass,
        Provider::Naver,
        Provider::ShinhanBank,
        Provider::Toss,
        Provider::BankSalad,
    ];

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(usize::from(level).checked_sub(1)?).copied()
    }

    pub fn level(&self) -> u8 {
        Self::ALL.iter().position(|p| p == self).map_or(0, |i| i as u8 + 1)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Kakao => "카카오톡",
            Provider::Payco => "페이코",
            Provider::Samsung => "삼성패스",
            Provider::KbBank => "KB모바일",
            Provider::Pass => "통신사PASS",
            Provider::Naver => "네이버",
            Provider::ShinhanBank => "신한인증서",
            Provider::Toss => "toss",
            Provider::BankSalad => "뱅크샐러드",
        }
    }

    /// 只有通信社 PASS 需要选择运营商
    pub fn needs_carrier(&self) -> bool {
        matches!(self, Provider::Pass)
    }
}

/// 通信运营商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Carrier {
    #[serde(rename = "SKT")]
    Skt,
    #[serde(rename = "KT")]
    Kt,
    #[serde(rename = "LGU+")]
    LgUplus,
}

impl Carrier {
    /// 后端 telecom 字段值
    pub fn wire_value(&self) -> &'static str {
        match self {
            Carrier::Skt => "0",
            Carrier::Kt => "1",
            Carrier::LgUplus => "2",
        }
    }
}

/// 手机号前缀
pub const PHONE_PREFIXES: [&str; 6] = ["010", "011", "016", "017", "018", "019"];

/// 可校验的输入字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Phone,
    Identity,
}

/// 同意项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consent {
    All,
    Privacy,
    ThirdParty,
}

/// 字段 -> 错误信息 (空串表示无错误)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl Default for ValidationErrors {
    fn default() -> Self {
        Self([Field::Name, Field::Phone, Field::Identity]
            .into_iter()
            .map(|f| (f, String::new()))
            .collect())
    }
}

impl ValidationErrors {
    pub fn get(&self, field: Field) -> &str {
        self.0.get(&field).map_or("", String::as_str)
    }

    pub fn set(&mut self, field: Field, message: Option<&str>) {
        self.0.insert(field, message.unwrap_or_default().to_string());
    }

    pub fn has_error(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }
}

/// 一次认证尝试的表单状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationForm {
    pub provider: Option<Provider>,
    pub user_name: String,
    /// 生日 YYYYMMDD
    pub identity: String,
    pub carrier: Option<Carrier>,
    pub phone_prefix: String,
    pub phone_suffix: String,
    pub agree_all: bool,
    pub agree_privacy: bool,
    pub agree_third_party: bool,
    /// 提供方会话 key
    #[serde(skip_serializing)]
    pub session_key: Option<String>,
    pub is_request_confirmed: bool,
}

impl VerificationForm {
    pub fn set_consent(&mut self, consent: Consent, checked: bool) {
        match consent {
            Consent::All => {
                self.agree_all = checked;
                self.agree_privacy = checked;
                self.agree_third_party = checked;
            }
            Consent::Privacy => self.agree_privacy = checked,
            Consent::ThirdParty => self.agree_third_party = checked,
        }
    }

    /// 认证请求按钮是否可用 (运营商不参与判断)
    pub fn can_submit(&self) -> bool {
        !self.user_name.trim().is_empty()
            && !self.phone_suffix.trim().is_empty()
            && !self.identity.trim().is_empty()
            && self.agree_privacy
            && self.agree_third_party
    }

    pub fn phone_number(&self) -> String {
        format!("{}{}", self.phone_prefix, self.phone_suffix)
    }
}

/// 简易认证请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub login_type_level: u8,
    pub user_name: String,
    pub phone_no: String,
    pub identity: String,
    pub telecom: String,
    pub tax_invoice_info_list: Vec<TaxInvoiceInfo>,
}

impl AuthRequest {
    pub fn new(form: &VerificationForm, invoices: Vec<TaxInvoiceInfo>) -> Self {
        Self {
            login_type_level: form.provider.map_or(0, |p| p.level()),
            user_name: form.user_name.clone(),
            phone_no: form.phone_number(),
            identity: form.identity.clone(),
            telecom: form.carrier.map(|c| c.wire_value().to_string()).unwrap_or_default(),
            tax_invoice_info_list: invoices,
        }
    }
}

/// 简易认证请求结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    #[serde(default)]
    pub key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_levels_are_one_based() {
        assert_eq!(Provider::from_level(1), Some(Provider::Kakao));
        assert_eq!(Provider::from_level(5), Some(Provider::Pass));
        assert_eq!(Provider::from_level(9), Some(Provider::BankSalad));
        assert_eq!(Provider::from_level(0), None);
        assert_eq!(Provider::from_level(10), None);
        assert_eq!(Provider::Toss.level(), 8);
    }

    #[test]
    fn agree_all_sets_both_flags() {
        let mut form = VerificationForm::default();
        form.set_consent(Consent::All, true);
        assert!(form.agree_privacy && form.agree_third_party);
        form.set_consent(Consent::All, false);
        assert!(!form.agree_privacy && !form.agree_third_party);
    }

    #[test]
    fn sub_consents_are_independent() {
        let mut form = VerificationForm::default();
        form.set_consent(Consent::Privacy, true);
        assert!(form.agree_privacy);
        assert!(!form.agree_third_party);
        form.set_consent(Consent::ThirdParty, true);
        form.set_consent(Consent::Privacy, false);
        assert!(!form.agree_privacy);
        assert!(form.agree_third_party);
    }

    #[test]
    fn submit_ignores_carrier() {
        let mut form = VerificationForm {
            user_name: "홍길동".into(),
            identity: "19990101".into(),
            phone_suffix: "12345678".into(),
            ..Default::default()
        };
        assert!(!form.can_submit());
        form.set_consent(Consent::All, true);
        assert!(form.carrier.is_none());
        assert!(form.can_submit());
        form.user_name.clear();
        assert!(!form.can_submit());
    }

    #[test]
    fn auth_request_joins_phone_and_maps_carrier() {
        let form = VerificationForm {
            provider: Some(Provider::Pass),
            user_name: "홍길동".into(),
            identity: "19990101".into(),
            carrier: Some(Carrier::Kt),
            phone_prefix: "010".into(),
            phone_suffix: "12345678".into(),
            ..Default::default()
        };
        let req = AuthRequest::new(&form, Vec::new());
        assert_eq!(req.login_type_level, 5);
        assert_eq!(req.phone_no, "01012345678");
        assert_eq!(req.telecom, "1");
    }
}

use super::ApprovalStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 检索条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// 交易对方名称
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<ApprovalStatus>,
}

impl FilterCriteria {
    /// 所有条件均为默认值
    pub fn is_initial_state(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.name.as_deref().map_or(true, |n| n.trim().is_empty())
            && self.status.is_none()
    }
}

/// 发往后端的检索参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApprovalStatus>,
    pub page: u32,
    pub size: u32,
}

/// 检索上下文: 持有当前条件，只能通过 setter 修改
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    filters: FilterCriteria,
}

impl SearchContext {
    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
    }

    pub fn set_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.filters.start_date = start;
        self.filters.end_date = end;
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.filters.name = name;
    }

    pub fn set_status(&mut self, status: Option<ApprovalStatus>) {
        self.filters.status = status;
    }

    pub fn reset(&mut self) {
        self.filters = FilterCriteria::default();
    }

    pub fn is_initial_state(&self) -> bool {
        self.filters.is_initial_state()
    }

    /// 合并条件与页码; 条件为初始状态时页码回到 1
    pub fn search_params(&self, requested_page: u32, size: u32) -> SearchParams {
        let page = if self.is_initial_state() { 1 } else { requested_page.max(1) };
        SearchParams {
            start_date: self.filters.start_date,
            end_date: self.filters.end_date,
            name: self.filters.name.clone().filter(|n| !n.trim().is_empty()),
            status: self.filters.status,
            page,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filters_reset_page() {
        let ctx = SearchContext::default();
        assert!(ctx.is_initial_state());
        assert_eq!(ctx.search_params(3, 10).page, 1);
    }

    #[test]
    fn custom_filters_keep_requested_page() {
        let mut ctx = SearchContext::default();
        ctx.set_name(Some("한빛상사".into()));
        assert!(!ctx.is_initial_state());
        let params = ctx.search_params(3, 10);
        assert_eq!(params.page, 3);
        assert_eq!(params.name.as_deref(), Some("한빛상사"));
    }

    #[test]
    fn blank_name_is_still_initial() {
        let mut ctx = SearchContext::default();
        ctx.set_name(Some("   ".into()));
        assert!(ctx.is_initial_state());
    }

    #[test]
    fn params_serialize_without_empty_criteria() {
        let mut ctx = SearchContext::default();
        ctx.set_status(Some(ApprovalStatus::Rejected));
        let json = serde_json::to_value(ctx.search_params(2, 10)).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "REJECTED", "page": 2, "size": 10 }));
    }
}

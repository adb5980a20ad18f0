use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_USER")]
    User,
}

/// 登录上下文: 调用后端所需的 token 与角色
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub token: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(token: impl Into<String>, role: UserRole) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

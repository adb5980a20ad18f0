use thiserror::Error;

/// 后端 API 调用错误
#[derive(Error, Debug)]
pub enum ApiError {
    /// 非 2xx 响应，保留状态码
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx 但 success=false
    #[error("backend rejected request (code {code:?}): {message}")]
    Rejected { code: Option<i64>, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 简易认证尚未在提供方完成签名
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// 服务层错误
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Operation already in progress: {0}")]
    OperationInProgress(&'static str),

    #[error("Invalid date array. At least [year, month, day] are required.")]
    InvalidDate,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(#[from] ApiError),
}

pub type Result<T> = std::result::Result<T, AppError>;

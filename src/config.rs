use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 税务发票后端 API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// 单次请求超时 (秒)，不设置则不限时
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// 每页行数
    pub page_size: u32,
    /// 认证完成后跳转结果页前的展示时间 (毫秒)
    pub result_delay_ms: u64,
    /// 结果页路径
    pub results_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            backend: BackendConfig {
                base_url: std::env::var("BACKEND_URL")
                    .unwrap_or_else(|_| "http://localhost:9090".to_string()),
                timeout_secs: None,
            },
            workflow: WorkflowConfig::default(),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            result_delay_ms: 1500,
            results_path: "/dashboard/searchfile".to_string(),
        }
    }
}

impl WorkflowConfig {
    pub fn result_delay(&self) -> Duration {
        Duration::from_millis(self.result_delay_ms)
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            backend: BackendConfig {
                base_url: defaults.backend.base_url,
                timeout_secs: std::env::var("BACKEND_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok()),
            },
            workflow: defaults.workflow,
        }
    }

    /// 分层加载: 默认值 -> workflow.toml (可选) -> APP__* 环境变量
    pub fn load() -> Result<Self, config::ConfigError> {
        let base = Self::from_env();
        config::Config::builder()
            .add_source(config::Config::try_from(&base)?)
            .add_source(config::File::with_name("workflow").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}

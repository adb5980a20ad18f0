use std::sync::Arc;
use tax_invoice_workflow::{router, AppConfig, AppState, HttpBackend};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 创建后端客户端
    let backend = HttpBackend::from_config(&config.backend)?;
    info!("Backend client created for {}", config.backend.base_url);

    let state = AppState::new(Arc::new(backend), config.workflow.clone());
    let app = router(state);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/workspaces                    - open a workspace");
    info!("  GET  /api/workspaces/:id/invoices       - invoice table");
    info!("  POST /api/workspaces/:id/flow/request   - request simple authentication");
    info!("  POST /api/workspaces/:id/flow/confirm   - confirm provider signature");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

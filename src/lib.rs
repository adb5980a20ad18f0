pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod session;

pub use api::{router, AppState};
pub use client::{create_client, HttpBackend, InvoiceBackend};
pub use config::AppConfig;
pub use error::{ApiError, AppError};
pub use service::{IdentityVerificationFlow, InvoiceListController};
pub use session::WorkspaceStore;

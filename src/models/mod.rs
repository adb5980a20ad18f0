pub mod auth;
pub mod filter;
pub mod invoice;
pub mod notice;
pub mod ocr;
pub mod verification;

pub use auth::{AuthContext, UserRole};
pub use filter::{FilterCriteria, SearchContext, SearchParams};
pub use invoice::{format_date, row_number, ApprovalDetail, ApprovalStatus, InvoiceRecord, Page};
pub use notice::{Notice, NoticeLevel, Notices};
pub use ocr::{EditInvoiceRequest, OcrItem, TaxInvoiceInfo};
pub use verification::{
    AuthRequest, AuthResult, Carrier, Consent, Field, Provider, ValidationErrors,
    VerificationForm, PHONE_PREFIXES,
};

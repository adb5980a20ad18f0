pub mod invoice_list;
pub mod validation;
pub mod verification_flow;

pub use invoice_list::{InvoiceListController, RowAction, RowView, TableView};
pub use verification_flow::{
    AuthPlan, FailedStage, FlowMode, FlowOutcome, FlowState, IdentityVerificationFlow, Step,
};

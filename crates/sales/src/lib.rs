//! Sales order domain module.
//!
//! The `SalesOrder` aggregate owns the order header, its lines and the last
//! computed tax breakdown, and enforces the order lifecycle. Pure domain logic:
//! collaborators (tax service, e-signature, storage) are driven by the infra
//! crate around `handle`/`apply`.

pub mod command;
pub mod digest;
pub mod error;
pub mod event;
pub mod header;
pub mod line;
pub mod order;
pub mod status;

pub use command::{
    Approve, AttachTaxBreakdown, Cancel, Close, ConfirmManually, ConvertToDraft, CreateSalesOrder, DeleteOrder,
    MarkPartiallyInvoiced, RecordSignatureStatus, Release, ReplaceLines, RequestChanges, SalesOrderCommand,
    SubmitForSignature, UpdateHeader,
};
pub use digest::tax_inputs_digest;
pub use error::{OrderError, OrderGuard};
pub use event::SalesOrderEvent;
pub use header::{HeaderDraft, OrderHeader, SalesOrderId, SignatureRequest, SignatureState, SignatureStatus};
pub use line::{LineAllocationRecord, LineDraft, SalesOrderLine, SalesOrderLineId};
pub use order::SalesOrder;
pub use status::SalesOrderStatus;

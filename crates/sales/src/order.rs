use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use reclaim_core::{Aggregate, AggregateRoot, DomainError, PostalAddress, TenantId};
use reclaim_events::Event;
use reclaim_inventory::{AllocationRequest, LineAllocation};
use reclaim_tax::{TaxBreakdown, TaxRequest, TaxableLine};

use crate::command::*;
use crate::digest::tax_inputs_digest;
use crate::error::{OrderError, OrderGuard};
use crate::event::*;
use crate::header::{HeaderDraft, OrderHeader, SalesOrderId, SignatureState, SignatureStatus};
use crate::line::{LineAllocationRecord, LineDraft, SalesOrderLine, SalesOrderLineId};
use crate::status::SalesOrderStatus;

/// Aggregate root: SalesOrder (header + lines + last computed tax).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrder {
    id: SalesOrderId,
    header: Option<OrderHeader>,
    lines: Vec<SalesOrderLine>,
    version: u64,
    deleted: bool,
}

impl SalesOrder {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: SalesOrderId) -> Self {
        Self {
            id,
            header: None,
            lines: Vec::new(),
            version: 0,
            deleted: false,
        }
    }

    /// Rehydrate from persisted records. Lines are ordered by `line_no`.
    pub fn from_records(header: OrderHeader, mut lines: Vec<SalesOrderLine>) -> Self {
        lines.sort_by_key(|l| l.line_no);
        Self {
            id: header.order_id,
            version: header.revision,
            header: Some(header),
            lines,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> SalesOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.header.as_ref().map(|h| h.tenant_id)
    }

    pub fn header(&self) -> Option<&OrderHeader> {
        self.header.as_ref()
    }

    pub fn lines(&self) -> &[SalesOrderLine] {
        &self.lines
    }

    pub fn status(&self) -> Option<SalesOrderStatus> {
        self.header.as_ref().map(|h| h.status)
    }

    pub fn tax_breakdown(&self) -> Option<&TaxBreakdown> {
        self.header.as_ref().and_then(|h| h.tax_breakdown.as_ref())
    }

    pub fn is_created(&self) -> bool {
        self.header.is_some() && !self.deleted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Digest of the current tax inputs.
    pub fn current_tax_digest(&self) -> Option<String> {
        self.header.as_ref().map(|h| tax_inputs_digest(h, &self.lines))
    }

    /// The tax engine request for the order as it stands now.
    pub fn tax_request(&self, ship_from: Option<PostalAddress>) -> Result<TaxRequest, OrderError> {
        let header = self.require_header()?;
        Ok(TaxRequest {
            ship_to: header.ship_to.clone(),
            ship_from,
            customer_exempt: header.customer_tax_exempt,
            exemption_type: header.exemption_type.clone(),
            lines: self
                .lines
                .iter()
                .map(|l| TaxableLine {
                    line_ref: l.line_id.to_string(),
                    sku: l.sku_id.to_string(),
                    quantity: l.quantity_ordered,
                    unit_price: l.unit_price,
                    discount: l.discount,
                    category: l.tax_category.clone(),
                    external_tax_code: l.external_tax_code.clone(),
                })
                .collect(),
            shipping_amount: header.shipping_amount,
        })
    }

    /// Allocator input, one request per line.
    pub fn allocation_requests(&self) -> Vec<AllocationRequest> {
        self.lines
            .iter()
            .map(|l| AllocationRequest {
                line_ref: l.line_id.to_string(),
                sku_id: l.sku_id.clone(),
                needed: l.quantity_ordered,
            })
            .collect()
    }

    /// Guards shared by both submission paths.
    ///
    /// Exposed so that the signature request is only dispatched for an order
    /// that would accept the resulting `SubmitForSignature`.
    pub fn ensure_can_submit(&self, to: SalesOrderStatus) -> Result<(), OrderError> {
        let header = self.require_header()?;
        transition(header, to)?;
        ensure_ship_to(header)?;
        if !self.lines.iter().any(SalesOrderLine::is_valid) {
            return Err(OrderGuard::NoValidLines.into());
        }
        self.ensure_tax_current(header)
    }

    fn require_header(&self) -> Result<&OrderHeader, OrderError> {
        match &self.header {
            Some(h) if !self.deleted => Ok(h),
            _ => Err(DomainError::not_found().into()),
        }
    }

    fn existing(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Result<&OrderHeader, OrderError> {
        let header = self.require_header()?;
        if header.tenant_id != tenant_id {
            return Err(DomainError::invariant("tenant mismatch").into());
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch").into());
        }
        Ok(header)
    }

    fn ensure_tax_current(&self, header: &OrderHeader) -> Result<(), OrderError> {
        if header.tax_breakdown.is_none() {
            return Err(OrderGuard::TaxBreakdownMissing.into());
        }
        let current = tax_inputs_digest(header, &self.lines);
        if header.tax_inputs_digest.as_deref() != Some(current.as_str()) {
            return Err(OrderGuard::TaxBreakdownStale.into());
        }
        Ok(())
    }
}

fn transition(header: &OrderHeader, to: SalesOrderStatus) -> Result<(), OrderError> {
    if header.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(OrderError::InvalidTransition { from: header.status, to })
    }
}

fn ensure_editable(header: &OrderHeader) -> Result<(), OrderError> {
    if header.status.is_editable() {
        Ok(())
    } else {
        Err(OrderError::NotEditable(header.status))
    }
}

fn ensure_ship_to(header: &OrderHeader) -> Result<(), OrderError> {
    let missing = header.ship_to.missing_fields();
    if !missing.is_empty() {
        return Err(OrderGuard::ShipToIncomplete { missing }.into());
    }
    if header.ship_to.is_po_box() {
        return Err(OrderGuard::ShipToPoBox.into());
    }
    Ok(())
}

fn validate_header(draft: &HeaderDraft) -> Result<(), OrderError> {
    if draft.currency.trim().is_empty() {
        return Err(DomainError::validation("currency is required").into());
    }
    if draft.shipping_amount < Decimal::ZERO {
        return Err(DomainError::validation("shipping_amount cannot be negative").into());
    }
    Ok(())
}

fn validate_lines(drafts: &[LineDraft]) -> Result<(), OrderError> {
    if let Some(last) = drafts.len().checked_sub(1) {
        line_number(last)?;
    }
    let mut seen = BTreeSet::new();
    for draft in drafts {
        if !seen.insert(draft.line_id) {
            return Err(DomainError::validation(format!("duplicate line id {}", draft.line_id)).into());
        }
        if draft.quantity_ordered < Decimal::ZERO {
            return Err(DomainError::validation("quantity_ordered cannot be negative").into());
        }
        if draft.unit_price < Decimal::ZERO {
            return Err(DomainError::validation("unit_price cannot be negative").into());
        }
        if draft.discount < Decimal::ZERO {
            return Err(DomainError::validation("discount cannot be negative").into());
        }
    }
    Ok(())
}

/// 1-based `line_no` for the draft at `index`.
fn line_number(index: usize) -> Result<u32, OrderError> {
    index
        .checked_add(1)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| DomainError::validation(format!("line {index} exceeds the maximum line number")).into())
}

/// Drafts have passed `validate_lines`, so every index has a line number.
fn lines_from_drafts(order_id: SalesOrderId, drafts: &[LineDraft]) -> Vec<SalesOrderLine> {
    drafts
        .iter()
        .enumerate()
        .map(|(i, d)| SalesOrderLine::from_draft(order_id, line_number(i).unwrap_or(u32::MAX), d))
        .collect()
}

impl AggregateRoot for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for SalesOrder {
    type Command = SalesOrderCommand;
    type Event = SalesOrderEvent;
    type Error = OrderError;

    fn apply(&mut self, event: &Self::Event) {
        let at = event.occurred_at();

        if let SalesOrderEvent::SalesOrderCreated(e) = event {
            self.id = e.order_id;
            self.header = Some(OrderHeader::from_draft(e.tenant_id, e.order_id, &e.header, e.created_by, at));
            self.lines = lines_from_drafts(e.order_id, &e.lines);
            self.deleted = false;
        } else if let Some(header) = self.header.as_mut() {
            match event {
                SalesOrderEvent::SalesOrderCreated(_) => {}
                SalesOrderEvent::HeaderUpdated(e) => {
                    header.apply_draft(&e.header);
                    if e.tax_invalidated {
                        header.invalidate_tax();
                    }
                }
                SalesOrderEvent::LinesReplaced(e) => {
                    self.lines = lines_from_drafts(e.order_id, &e.lines);
                    if e.tax_invalidated {
                        header.invalidate_tax();
                    }
                }
                SalesOrderEvent::TaxComputed(e) => {
                    header.tax_breakdown = Some(e.breakdown.clone());
                    header.tax_inputs_digest = Some(e.inputs_digest.clone());
                    header.tax_computed_at = Some(at);
                }
                SalesOrderEvent::ConvertedToDraft(_) => {
                    header.status = SalesOrderStatus::Draft;
                    header.converted_at = Some(at);
                }
                SalesOrderEvent::SignatureRequested(e) => {
                    header.status = SalesOrderStatus::PendingCustomerSignature;
                    header.signature_requested_at = Some(at);
                    header.signature = Some(SignatureState {
                        request: e.request.clone(),
                        status: SignatureStatus::Pending,
                        document_ref: None,
                        updated_at: at,
                    });
                }
                SalesOrderEvent::ConfirmationPrinted(_) => {
                    header.status = SalesOrderStatus::PendingApproval;
                    header.confirmation_printed_at = Some(at);
                }
                SalesOrderEvent::SignatureStatusChanged(e) => {
                    if let Some(signature) = header.signature.as_mut() {
                        signature.status = e.status;
                        if e.document_ref.is_some() {
                            signature.document_ref = e.document_ref.clone();
                        }
                        signature.updated_at = at;
                    }
                }
                SalesOrderEvent::SignatureReceived(_) => {
                    header.status = SalesOrderStatus::PendingApproval;
                    header.signature_received_at = Some(at);
                }
                SalesOrderEvent::OrderApproved(e) => {
                    header.status = SalesOrderStatus::Approved;
                    header.approved_at = Some(at);
                    header.approved_by = Some(e.approved_by);
                    for record in &e.allocations {
                        if let Some(line) = self.lines.iter_mut().find(|l| l.line_id == record.line_id) {
                            line.quantity_allocated = Some(record.quantity_allocated);
                            line.quantity_backordered = Some(record.quantity_backordered);
                        }
                    }
                }
                SalesOrderEvent::ChangesRequested(e) => {
                    header.status = SalesOrderStatus::NeedsUpdate;
                    header.changes_requested_at = Some(at);
                    header.change_request_note = e.note.clone();
                }
                SalesOrderEvent::OrderReleased(e) => {
                    header.status = SalesOrderStatus::Released;
                    header.released_at = Some(at);
                    header.released_by = Some(e.released_by);
                }
                SalesOrderEvent::OrderPartiallyInvoiced(_) => {
                    header.status = SalesOrderStatus::PartiallyInvoiced;
                    header.partially_invoiced_at = Some(at);
                }
                SalesOrderEvent::OrderClosed(_) => {
                    header.status = SalesOrderStatus::Closed;
                    header.closed_at = Some(at);
                }
                SalesOrderEvent::OrderCancelled(e) => {
                    header.status = SalesOrderStatus::Cancelled;
                    header.cancelled_at = Some(at);
                    header.cancelled_by = Some(e.cancelled_by);
                    header.cancellation_reason = Some(e.reason.clone());
                }
                SalesOrderEvent::OrderDeleted(_) => {
                    self.deleted = true;
                }
            }
        }

        // One revision per applied event; the header carries it to storage.
        self.version += 1;
        if let Some(header) = self.header.as_mut() {
            header.revision = self.version;
            header.updated_at = at;
        }
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let header = match command {
            SalesOrderCommand::CreateSalesOrder(cmd) => return self.handle_create(cmd),
            other => self.existing(other.tenant_id(), other.order_id())?,
        };
        match command {
            SalesOrderCommand::CreateSalesOrder(cmd) => self.handle_create(cmd),
            SalesOrderCommand::UpdateHeader(cmd) => self.handle_update_header(header, cmd),
            SalesOrderCommand::ReplaceLines(cmd) => self.handle_replace_lines(header, cmd),
            SalesOrderCommand::AttachTaxBreakdown(cmd) => self.handle_attach_tax(header, cmd),
            SalesOrderCommand::ConvertToDraft(cmd) => {
                transition(header, SalesOrderStatus::Draft)?;
                Ok(vec![SalesOrderEvent::ConvertedToDraft(ConvertedToDraft {
                    tenant_id: cmd.tenant_id,
                    order_id: cmd.order_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            SalesOrderCommand::SubmitForSignature(cmd) => self.handle_submit_for_signature(cmd),
            SalesOrderCommand::ConfirmManually(cmd) => {
                self.ensure_can_submit(SalesOrderStatus::PendingApproval)?;
                Ok(vec![SalesOrderEvent::ConfirmationPrinted(ConfirmationPrinted {
                    tenant_id: cmd.tenant_id,
                    order_id: cmd.order_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            SalesOrderCommand::RecordSignatureStatus(cmd) => self.handle_signature_status(header, cmd),
            SalesOrderCommand::Approve(cmd) => self.handle_approve(header, cmd),
            SalesOrderCommand::RequestChanges(cmd) => {
                transition(header, SalesOrderStatus::NeedsUpdate)?;
                Ok(vec![SalesOrderEvent::ChangesRequested(ChangesRequested {
                    tenant_id: cmd.tenant_id,
                    order_id: cmd.order_id,
                    note: cmd.note.as_deref().map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
                    occurred_at: cmd.occurred_at,
                })])
            }
            SalesOrderCommand::Release(cmd) => {
                transition(header, SalesOrderStatus::Released)?;
                Ok(vec![SalesOrderEvent::OrderReleased(OrderReleased {
                    tenant_id: cmd.tenant_id,
                    order_id: cmd.order_id,
                    released_by: cmd.released_by,
                    occurred_at: cmd.occurred_at,
                })])
            }
            SalesOrderCommand::MarkPartiallyInvoiced(cmd) => {
                transition(header, SalesOrderStatus::PartiallyInvoiced)?;
                Ok(vec![SalesOrderEvent::OrderPartiallyInvoiced(OrderPartiallyInvoiced {
                    tenant_id: cmd.tenant_id,
                    order_id: cmd.order_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            SalesOrderCommand::Close(cmd) => {
                transition(header, SalesOrderStatus::Closed)?;
                Ok(vec![SalesOrderEvent::OrderClosed(OrderClosed {
                    tenant_id: cmd.tenant_id,
                    order_id: cmd.order_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            SalesOrderCommand::Cancel(cmd) => {
                transition(header, SalesOrderStatus::Cancelled)?;
                let reason = cmd.reason.trim();
                if reason.is_empty() {
                    return Err(OrderGuard::CancellationReasonMissing.into());
                }
                Ok(vec![SalesOrderEvent::OrderCancelled(OrderCancelled {
                    tenant_id: cmd.tenant_id,
                    order_id: cmd.order_id,
                    reason: reason.to_string(),
                    cancelled_by: cmd.cancelled_by,
                    occurred_at: cmd.occurred_at,
                })])
            }
            SalesOrderCommand::DeleteOrder(cmd) => {
                ensure_editable(header)?;
                Ok(vec![SalesOrderEvent::OrderDeleted(OrderDeleted {
                    tenant_id: cmd.tenant_id,
                    order_id: cmd.order_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

impl SalesOrder {
    fn handle_create(&self, cmd: &CreateSalesOrder) -> Result<Vec<SalesOrderEvent>, OrderError> {
        if self.header.is_some() {
            return Err(DomainError::conflict("sales order already exists").into());
        }
        if self.id != cmd.order_id {
            return Err(DomainError::invariant("order_id mismatch").into());
        }
        validate_header(&cmd.header)?;
        validate_lines(&cmd.lines)?;

        Ok(vec![SalesOrderEvent::SalesOrderCreated(SalesOrderCreated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            header: cmd.header.clone(),
            lines: cmd.lines.clone(),
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_header(&self, header: &OrderHeader, cmd: &UpdateHeader) -> Result<Vec<SalesOrderEvent>, OrderError> {
        ensure_editable(header)?;
        validate_header(&cmd.header)?;

        let mut updated = header.clone();
        updated.apply_draft(&cmd.header);
        let tax_invalidated = tax_inputs_digest(header, &self.lines) != tax_inputs_digest(&updated, &self.lines);

        Ok(vec![SalesOrderEvent::HeaderUpdated(HeaderUpdated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            header: cmd.header.clone(),
            tax_invalidated,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_replace_lines(&self, header: &OrderHeader, cmd: &ReplaceLines) -> Result<Vec<SalesOrderEvent>, OrderError> {
        ensure_editable(header)?;
        validate_lines(&cmd.lines)?;

        let kept: BTreeSet<SalesOrderLineId> = cmd.lines.iter().map(|l| l.line_id).collect();
        let removed: Vec<SalesOrderLineId> = self
            .lines
            .iter()
            .map(|l| l.line_id)
            .filter(|id| !kept.contains(id))
            .collect();

        let replacement = lines_from_drafts(cmd.order_id, &cmd.lines);
        let tax_invalidated = tax_inputs_digest(header, &self.lines) != tax_inputs_digest(header, &replacement);

        Ok(vec![SalesOrderEvent::LinesReplaced(LinesReplaced {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            lines: cmd.lines.clone(),
            removed,
            tax_invalidated,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_attach_tax(&self, header: &OrderHeader, cmd: &AttachTaxBreakdown) -> Result<Vec<SalesOrderEvent>, OrderError> {
        if !header.status.accepts_tax_computation() {
            return Err(OrderError::NotEditable(header.status));
        }

        // The breakdown must describe exactly the current lines.
        let expected: BTreeSet<String> = self.lines.iter().map(|l| l.line_id.to_string()).collect();
        let actual: BTreeSet<String> = cmd.breakdown.lines.iter().map(|l| l.line_ref.clone()).collect();
        if expected != actual || cmd.breakdown.lines.len() != self.lines.len() {
            return Err(OrderGuard::TaxBreakdownStale.into());
        }

        Ok(vec![SalesOrderEvent::TaxComputed(TaxComputed {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            breakdown: cmd.breakdown.clone(),
            inputs_digest: tax_inputs_digest(header, &self.lines),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit_for_signature(&self, cmd: &SubmitForSignature) -> Result<Vec<SalesOrderEvent>, OrderError> {
        self.ensure_can_submit(SalesOrderStatus::PendingCustomerSignature)?;
        if cmd.request.signer_email.trim().is_empty() {
            return Err(OrderGuard::SignerEmailMissing.into());
        }
        if cmd.request.request_id.trim().is_empty() {
            return Err(DomainError::validation("signature request id is required").into());
        }

        Ok(vec![SalesOrderEvent::SignatureRequested(SignatureRequested {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            request: cmd.request.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_signature_status(
        &self,
        header: &OrderHeader,
        cmd: &RecordSignatureStatus,
    ) -> Result<Vec<SalesOrderEvent>, OrderError> {
        if header.status != SalesOrderStatus::PendingCustomerSignature {
            return Err(OrderGuard::SignatureRequestMismatch.into());
        }
        let dispatched = header.signature.as_ref().map(|s| s.request.request_id.as_str());
        if dispatched != Some(cmd.request_id.as_str()) {
            return Err(OrderGuard::SignatureRequestMismatch.into());
        }

        let mut events = vec![SalesOrderEvent::SignatureStatusChanged(SignatureStatusChanged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            request_id: cmd.request_id.clone(),
            status: cmd.status,
            document_ref: cmd.document_ref.clone(),
            occurred_at: cmd.occurred_at,
        })];

        if cmd.status == SignatureStatus::Signed {
            transition(header, SalesOrderStatus::PendingApproval)?;
            events.push(SalesOrderEvent::SignatureReceived(SignatureReceived {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                document_ref: cmd.document_ref.clone(),
                occurred_at: cmd.occurred_at,
            }));
        }
        Ok(events)
    }

    fn handle_approve(&self, header: &OrderHeader, cmd: &Approve) -> Result<Vec<SalesOrderEvent>, OrderError> {
        transition(header, SalesOrderStatus::Approved)?;
        ensure_ship_to(header)?;
        self.ensure_tax_current(header)?;
        let allocations = self.allocation_records(&cmd.allocations)?;

        Ok(vec![SalesOrderEvent::OrderApproved(OrderApproved {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            approved_by: cmd.approved_by,
            allocations,
            occurred_at: cmd.occurred_at,
        })])
    }

    /// One allocation per line, for the ordered quantity, conserving it.
    fn allocation_records(&self, allocations: &[LineAllocation]) -> Result<Vec<LineAllocationRecord>, OrderError> {
        if allocations.len() != self.lines.len() {
            return Err(OrderGuard::AllocationMismatch(format!(
                "{} allocations for {} lines",
                allocations.len(),
                self.lines.len()
            ))
            .into());
        }

        self.lines
            .iter()
            .map(|line| {
                let line_ref = line.line_id.to_string();
                let a = allocations
                    .iter()
                    .find(|a| a.line_ref == line_ref)
                    .ok_or_else(|| OrderGuard::AllocationMismatch(format!("no allocation for line {line_ref}")))?;
                if a.sku_id != line.sku_id || a.needed != line.quantity_ordered {
                    return Err(OrderGuard::AllocationMismatch(format!("allocation for line {line_ref} is outdated")).into());
                }
                if a.allocatable + a.backordered != line.quantity_ordered {
                    return Err(OrderGuard::AllocationMismatch(format!(
                        "allocation for line {line_ref} does not add up to the ordered quantity"
                    ))
                    .into());
                }
                Ok(LineAllocationRecord {
                    line_id: line.line_id,
                    quantity_allocated: a.allocatable,
                    quantity_backordered: a.backordered,
                })
            })
            .collect()
    }
}

impl SalesOrder {
    /// `handle` followed by `apply` for each emitted event.
    pub fn execute(&mut self, command: &SalesOrderCommand) -> Result<Vec<SalesOrderEvent>, OrderError> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }

    /// Last event time recorded on the header.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.header.as_ref().map(|h| h.updated_at)
    }
}

//! Integration tests for the full order pipeline.
//!
//! Tests: OrderService → TaxEngine / allocator / e-signature → RecordStore → EventBus
//!
//! Verifies:
//! - Lifecycle transitions commit header and lines together
//! - Failed guards, collaborators and commits leave the stored order untouched
//! - Tenant isolation and optimistic revisions are enforced

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::Value as JsonValue;

    use reclaim_auth::Role;
    use reclaim_core::id::CustomerId;
    use reclaim_core::{AggregateId, AggregateRoot, ExpectedVersion, PostalAddress, TenantId, UserId};
    use reclaim_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
    use reclaim_inventory::{AllocationStatus, InventoryLot, InventoryLotId, LotStatus, SkuId};
    use reclaim_sales::{HeaderDraft, LineDraft, SalesOrder, SalesOrderLineId, SalesOrderStatus, SignatureStatus};
    use reclaim_tax::{
        BreakdownSource, ExternalLineTax, ExternalTaxCalculator, ExternalTaxError, ExternalTaxRequest,
        ExternalTaxResponse, ExternalTaxResult, TaxCategory,
    };

    use crate::error::ErrorKind;
    use crate::repository::InventoryRepository;
    use crate::service::{NewOrder, OrderService, OrderUpdate, SessionContext, SignatureCallback, Signer};
    use crate::signature::RecordingSignatureService;
    use crate::store::{Collection, InMemoryRecordStore};

    /// External calculator with a canned answer.
    struct CannedExternalTax(Result<ExternalTaxResponse, ExternalTaxError>);

    impl ExternalTaxCalculator for CannedExternalTax {
        fn calculate(&self, _: &ExternalTaxRequest) -> Result<ExternalTaxResponse, ExternalTaxError> {
            self.0.clone()
        }
    }

    type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
    type Service = OrderService<Arc<InMemoryRecordStore>, CannedExternalTax, Arc<RecordingSignatureService>, Bus>;

    struct Harness {
        service: Service,
        store: Arc<InMemoryRecordStore>,
        signatures: Arc<RecordingSignatureService>,
        events: Subscription<EventEnvelope<JsonValue>>,
        sales: SessionContext,
        manager: SessionContext,
    }

    fn harness_with(external: Result<ExternalTaxResponse, ExternalTaxError>) -> Harness {
        let store = Arc::new(InMemoryRecordStore::new());
        let signatures = Arc::new(RecordingSignatureService::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let events = bus.subscribe();
        let service = OrderService::new(store.clone(), CannedExternalTax(external), signatures.clone(), bus);

        let tenant_id = TenantId::new();
        Harness {
            service,
            store,
            signatures,
            events,
            sales: SessionContext::new(tenant_id, UserId::new(), Role::SALES),
            manager: SessionContext::new(tenant_id, UserId::new(), Role::MANAGER),
        }
    }

    fn harness() -> Harness {
        harness_with(Err(ExternalTaxError::Unavailable("not used".to_string())))
    }

    fn address(region: &str, country: &str) -> PostalAddress {
        PostalAddress {
            line1: "77 Baler Ave".to_string(),
            city: "Windsor".to_string(),
            region: region.to_string(),
            postal_code: "N9A 1A1".to_string(),
            country: country.to_string(),
            contact_name: "Sam Ortiz".to_string(),
            ..PostalAddress::default()
        }
    }

    fn line(sku: &str, quantity: Decimal, price: Decimal) -> LineDraft {
        LineDraft {
            line_id: SalesOrderLineId::new(AggregateId::new()),
            sku_id: SkuId::new(sku).unwrap(),
            description: String::new(),
            category: "metals".to_string(),
            sub_category: String::new(),
            tax_category: TaxCategory::TangibleGoods,
            quantity_ordered: quantity,
            unit_price: price,
            discount: dec!(0),
            unit_of_measure: "t".to_string(),
            external_tax_code: None,
        }
    }

    fn new_order(ship_to: PostalAddress, lines: Vec<LineDraft>) -> NewOrder {
        NewOrder {
            header: HeaderDraft {
                customer_id: CustomerId::new(),
                bill_to: ship_to.clone(),
                ship_to,
                shipping_amount: dec!(0),
                currency: "CAD".to_string(),
                customer_tax_exempt: false,
                exemption_type: None,
            },
            lines,
        }
    }

    fn rev(order: &SalesOrder) -> ExpectedVersion {
        ExpectedVersion::Exact(order.version())
    }

    fn signer() -> Signer {
        Signer {
            email: "buyer@example.com".to_string(),
            name: "Sam Ortiz".to_string(),
        }
    }

    impl Harness {
        /// A DRAFT order with one 100 t line at 10.00 shipped to Ontario.
        fn draft(&self) -> SalesOrder {
            let order = self
                .service
                .create(&self.sales, new_order(address("ON", "CA"), vec![line("CU-1", dec!(100), dec!(10))]))
                .unwrap();
            self.service
                .convert_to_draft(&self.sales, order.id_typed(), rev(&order))
                .unwrap()
        }

        fn pending_approval(&self) -> SalesOrder {
            let order = self.draft();
            let order = self.service.compute_tax(&self.sales, order.id_typed(), rev(&order)).unwrap();
            self.service
                .confirm_manually(&self.sales, order.id_typed(), rev(&order))
                .unwrap()
        }

        fn stock(&self, sku: &str, on_hand: Decimal) {
            let lot = InventoryLot {
                lot_id: InventoryLotId::new(),
                tenant_id: self.sales.tenant_id,
                sku_id: SkuId::new(sku).unwrap(),
                location: "Yard B".to_string(),
                on_hand,
                status: LotStatus::Available,
            };
            InventoryRepository::new(self.store.as_ref())
                .put(self.sales.tenant_id, &[lot])
                .unwrap();
        }

        fn reload(&self, order: &SalesOrder) -> SalesOrder {
            self.service.get(&self.sales, order.id_typed()).unwrap()
        }

        fn drain_events(&self) -> Vec<EventEnvelope<JsonValue>> {
            let mut out = Vec::new();
            while let Ok(e) = self.events.recv_timeout(Duration::from_millis(10)) {
                out.push(e);
            }
            out
        }
    }

    #[test]
    fn signature_path_runs_from_quotation_to_closed() {
        let h = harness();
        h.stock("CU-1", dec!(60));
        let order = h.draft();
        let id = order.id_typed();

        let order = h.service.compute_tax(&h.sales, id, rev(&order)).unwrap();
        assert_eq!(order.tax_breakdown().unwrap().grand_total(), dec!(1130.00));

        let order = h.service.submit_for_signature(&h.sales, id, rev(&order), signer()).unwrap();
        assert_eq!(order.status(), Some(SalesOrderStatus::PendingCustomerSignature));
        let sent = h.signatures.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.signer_email, "buyer@example.com");

        let order = h
            .service
            .record_signature_status(
                h.sales.tenant_id,
                SignatureCallback {
                    order_id: id,
                    request_id: sent[0].0.clone(),
                    status: SignatureStatus::Signed,
                    document_ref: Some("signed/77.pdf".to_string()),
                },
            )
            .unwrap();
        assert_eq!(order.status(), Some(SalesOrderStatus::PendingApproval));

        let order = h.service.approve(&h.manager, id, rev(&order)).unwrap();
        assert_eq!(order.status(), Some(SalesOrderStatus::Approved));

        let order = h.service.release(&h.manager, id, rev(&order)).unwrap();
        let order = h.service.mark_partially_invoiced(&h.sales, id, rev(&order)).unwrap();
        let order = h.service.close(&h.sales, id, rev(&order)).unwrap();
        assert_eq!(order.status(), Some(SalesOrderStatus::Closed));

        let stored = h.reload(&order);
        assert_eq!(stored, order);
        assert!(stored.header().unwrap().closed_at.is_some());
    }

    #[test]
    fn approval_persists_allocation_with_status() {
        let h = harness();
        h.stock("CU-1", dec!(35));
        h.stock("CU-1", dec!(25));
        let order = h.pending_approval();

        let preview = h.service.preview_allocation(&h.manager, order.id_typed()).unwrap();
        assert_eq!(preview[0].allocatable, dec!(60));
        assert_eq!(preview[0].status, AllocationStatus::Backordered);
        assert_eq!(h.reload(&order).version(), order.version());

        h.service.approve(&h.manager, order.id_typed(), rev(&order)).unwrap();

        let stored = h.reload(&order);
        let line = &stored.lines()[0];
        assert_eq!(stored.status(), Some(SalesOrderStatus::Approved));
        assert_eq!(line.quantity_allocated, Some(preview[0].allocatable));
        assert_eq!(line.quantity_backordered, Some(dec!(40)));
    }

    #[test]
    fn failed_commit_leaves_order_and_bus_untouched() {
        let h = harness();
        h.stock("CU-1", dec!(500));
        let order = h.pending_approval();
        h.drain_events();

        h.store.fail_next_commit("connection reset");
        let err = h.service.approve(&h.manager, order.id_typed(), rev(&order)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Persistence);
        let stored = h.reload(&order);
        assert_eq!(stored.status(), Some(SalesOrderStatus::PendingApproval));
        assert!(stored.lines().iter().all(|l| l.quantity_allocated.is_none()));
        assert!(h.drain_events().is_empty());
    }

    #[test]
    fn stale_tax_blocks_submission() {
        let h = harness();
        let order = h.draft();
        let id = order.id_typed();
        let order = h.service.compute_tax(&h.sales, id, rev(&order)).unwrap();

        let mut lines: Vec<LineDraft> = vec![line("CU-1", dec!(120), dec!(10))];
        lines[0].line_id = order.lines()[0].line_id;
        let order = h
            .service
            .update(
                &h.sales,
                id,
                rev(&order),
                OrderUpdate {
                    header: None,
                    lines: Some(lines),
                },
            )
            .unwrap();
        assert!(order.tax_breakdown().is_none());

        let err = h.service.submit_for_signature(&h.sales, id, rev(&order), signer()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Stale);
        assert!(h.signatures.sent().is_empty());
        assert_eq!(h.reload(&order).status(), Some(SalesOrderStatus::Draft));
    }

    #[test]
    fn signature_dispatch_failure_keeps_draft() {
        let h = harness();
        let order = h.draft();
        let order = h.service.compute_tax(&h.sales, order.id_typed(), rev(&order)).unwrap();
        h.signatures.set_failure(Some("mail relay down".to_string()));

        let err = h
            .service
            .submit_for_signature(&h.sales, order.id_typed(), rev(&order), signer())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert_eq!(err.code(), "signature_dispatch_failed");
        assert_eq!(h.reload(&order).status(), Some(SalesOrderStatus::Draft));
    }

    #[test]
    fn external_fallback_is_blocking() {
        let h = harness_with(Ok(ExternalTaxResponse::Fallback {
            reason: "no nexus data for this state".to_string(),
        }));
        let order = h
            .service
            .create(&h.sales, new_order(address("CA", "US"), vec![line("AL-9", dec!(2), dec!(50))]))
            .unwrap();

        let err = h.service.compute_tax(&h.sales, order.id_typed(), rev(&order)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert!(err.to_string().contains("no nexus data"));
        assert!(h.reload(&order).tax_breakdown().is_none());
    }

    #[test]
    fn external_result_is_normalized_and_stored() {
        let order_line = line("AL-9", dec!(2), dec!(50));
        let h = harness_with(Ok(ExternalTaxResponse::Calculated(ExternalTaxResult {
            per_line_tax: vec![ExternalLineTax {
                id: order_line.line_id.to_string(),
                tax: dec!(7.25),
            }],
            shipping_tax: dec!(0),
            combined_rate: dec!(0.0725),
            has_nexus: true,
            taxable_amount: dec!(100),
            total_tax: dec!(7.25),
        })));

        let order = h
            .service
            .create(&h.sales, new_order(address("CA", "US"), vec![order_line]))
            .unwrap();
        let order = h.service.compute_tax(&h.sales, order.id_typed(), rev(&order)).unwrap();

        let breakdown = h.reload(&order).tax_breakdown().cloned().unwrap();
        assert_eq!(breakdown.source, BreakdownSource::External);
        assert_eq!(breakdown.total_tax(), dec!(7.25));
        assert_eq!(breakdown.grand_total(), dec!(107.25));
    }

    #[test]
    fn stale_revision_is_a_conflict() {
        let h = harness();
        let order = h.draft();
        let id = order.id_typed();
        h.service.compute_tax(&h.sales, id, rev(&order)).unwrap();

        let err = h
            .service
            .cancel(&h.sales, id, rev(&order), "duplicate".to_string())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(h.reload(&order).status(), Some(SalesOrderStatus::Draft));
    }

    #[test]
    fn sales_role_cannot_approve_or_release() {
        let h = harness();
        h.stock("CU-1", dec!(500));
        let order = h.pending_approval();

        let err = h.service.approve(&h.sales, order.id_typed(), rev(&order)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let order = h.service.approve(&h.manager, order.id_typed(), rev(&order)).unwrap();
        let err = h.service.release(&h.sales, order.id_typed(), rev(&order)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn other_tenant_sees_nothing() {
        let h = harness();
        let order = h.draft();
        let outsider = SessionContext::new(TenantId::new(), UserId::new(), Role::ADMIN);

        let err = h.service.get(&outsider, order.id_typed()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = h
            .service
            .cancel(&outsider, order.id_typed(), ExpectedVersion::Any, "mine now".to_string())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn replacing_lines_deletes_removed_records() {
        let h = harness();
        let order = h
            .service
            .create(
                &h.sales,
                new_order(
                    address("ON", "CA"),
                    vec![line("CU-1", dec!(1), dec!(1)), line("BR-2", dec!(1), dec!(1))],
                ),
            )
            .unwrap();
        assert_eq!(h.store.len(h.sales.tenant_id, Collection::SalesOrderLines), 2);

        h.service
            .update(
                &h.sales,
                order.id_typed(),
                rev(&order),
                OrderUpdate {
                    header: None,
                    lines: Some(vec![line("AL-3", dec!(4), dec!(2))]),
                },
            )
            .unwrap();

        assert_eq!(h.store.len(h.sales.tenant_id, Collection::SalesOrderLines), 1);
        assert_eq!(h.reload(&order).lines()[0].sku_id.as_str(), "AL-3");
    }

    #[test]
    fn line_ids_reused_across_orders_stay_separate() {
        let h = harness();
        let shared = line("CU-1", dec!(5), dec!(10));
        let first = h
            .service
            .create(&h.sales, new_order(address("ON", "CA"), vec![shared.clone()]))
            .unwrap();

        let mut copy = shared.clone();
        copy.sku_id = SkuId::new("BR-2").unwrap();
        let second = h
            .service
            .create(&h.sales, new_order(address("ON", "CA"), vec![copy]))
            .unwrap();

        assert_eq!(h.store.len(h.sales.tenant_id, Collection::SalesOrderLines), 2);
        assert_eq!(h.reload(&first).lines()[0].sku_id.as_str(), "CU-1");
        assert_eq!(h.reload(&second).lines()[0].sku_id.as_str(), "BR-2");

        h.service
            .update(
                &h.sales,
                second.id_typed(),
                rev(&second),
                OrderUpdate {
                    header: None,
                    lines: Some(vec![line("AL-3", dec!(1), dec!(1))]),
                },
            )
            .unwrap();

        let first = h.reload(&first);
        assert_eq!(first.lines().len(), 1);
        assert_eq!(first.lines()[0].line_id, shared.line_id);
        assert_eq!(first.lines()[0].sku_id.as_str(), "CU-1");
        assert_eq!(h.reload(&second).lines()[0].sku_id.as_str(), "AL-3");
    }

    #[test]
    fn delete_removes_header_and_lines() {
        let h = harness();
        let order = h.draft();

        h.service.delete(&h.sales, order.id_typed(), rev(&order)).unwrap();

        assert_eq!(h.store.len(h.sales.tenant_id, Collection::SalesOrders), 0);
        assert_eq!(h.store.len(h.sales.tenant_id, Collection::SalesOrderLines), 0);
        assert_eq!(
            h.service.get(&h.sales, order.id_typed()).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn cancellation_requires_reason_and_is_final() {
        let h = harness();
        let order = h.draft();
        let id = order.id_typed();

        let err = h.service.cancel(&h.sales, id, rev(&order), " ".to_string()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), "cancellation_reason_missing");

        let order = h.service.cancel(&h.sales, id, rev(&order), "customer withdrew".to_string()).unwrap();
        let err = h
            .service
            .cancel(&h.sales, id, rev(&order), "again".to_string())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn committed_events_are_published_in_revision_order() {
        let h = harness();
        let order = h.pending_approval();

        let events = h.drain_events();
        let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "sales.order.created",
                "sales.order.converted_to_draft",
                "sales.order.tax_computed",
                "sales.order.confirmation_printed"
            ]
        );
        let revisions: Vec<u64> = events.iter().map(|e| e.revision()).collect();
        assert_eq!(revisions, vec![1, 2, 3, 4]);
        assert_eq!(order.version(), 4);
        assert!(events.iter().all(|e| e.tenant_id() == h.sales.tenant_id));
    }
}

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use reclaim_auth::Role;
use reclaim_core::id::CustomerId;
use reclaim_core::{AggregateId, AggregateRoot, ExpectedVersion, PostalAddress, TenantId, UserId};
use reclaim_events::{EventEnvelope, InMemoryEventBus};
use reclaim_infra::{
    InMemoryRecordStore, InventoryRepository, NewOrder, OrderService, RecordingSignatureService, SessionContext,
    UnconfiguredExternalTax,
};
use reclaim_inventory::{InventoryLot, InventoryLotId, LotStatus, SkuId};
use reclaim_sales::{HeaderDraft, LineDraft, SalesOrderLineId};
use reclaim_tax::TaxCategory;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

type Service = OrderService<
    Arc<InMemoryRecordStore>,
    UnconfiguredExternalTax,
    RecordingSignatureService,
    InMemoryEventBus<EventEnvelope<JsonValue>>,
>;

fn service() -> (Service, Arc<InMemoryRecordStore>) {
    let store = Arc::new(InMemoryRecordStore::new());
    let service = OrderService::new(
        store.clone(),
        UnconfiguredExternalTax,
        RecordingSignatureService::new(),
        InMemoryEventBus::new(),
    );
    (service, store)
}

fn ontario() -> PostalAddress {
    PostalAddress {
        line1: "400 Scrap Yard Rd".to_string(),
        city: "Hamilton".to_string(),
        region: "ON".to_string(),
        postal_code: "L8L 4X1".to_string(),
        country: "CA".to_string(),
        ..PostalAddress::default()
    }
}

fn order_with_lines(count: usize) -> NewOrder {
    let lines = (0..count)
        .map(|i| LineDraft {
            line_id: SalesOrderLineId::new(AggregateId::new()),
            sku_id: SkuId::new(format!("SKU-{}", i % 8)).unwrap(),
            description: String::new(),
            category: String::new(),
            sub_category: String::new(),
            tax_category: TaxCategory::TangibleGoods,
            quantity_ordered: Decimal::from(10 + i as i64),
            unit_price: Decimal::new(1999, 2),
            discount: Decimal::ZERO,
            unit_of_measure: "t".to_string(),
            external_tax_code: None,
        })
        .collect();

    NewOrder {
        header: HeaderDraft {
            customer_id: CustomerId::new(),
            bill_to: ontario(),
            ship_to: ontario(),
            shipping_amount: Decimal::new(4500, 2),
            currency: "CAD".to_string(),
            customer_tax_exempt: false,
            exemption_type: None,
        },
        lines,
    }
}

/// create → convert → compute tax → confirm → approve, per order size.
fn bench_approval_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("approval_pipeline");

    for line_count in [1usize, 10, 50] {
        group.throughput(Throughput::Elements(line_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(line_count), &line_count, |b, &n| {
            let (service, store) = service();
            let session = SessionContext::new(TenantId::new(), UserId::new(), Role::MANAGER);
            let lots: Vec<InventoryLot> = (0..8)
                .map(|i| InventoryLot {
                    lot_id: InventoryLotId::new(),
                    tenant_id: session.tenant_id,
                    sku_id: SkuId::new(format!("SKU-{i}")).unwrap(),
                    location: "Yard A".to_string(),
                    on_hand: Decimal::from(100),
                    status: LotStatus::Available,
                })
                .collect();
            InventoryRepository::new(store.as_ref())
                .put(session.tenant_id, &lots)
                .unwrap();

            b.iter(|| {
                let order = service.create(&session, order_with_lines(n)).unwrap();
                let id = order.id_typed();
                let rev = |o: &reclaim_sales::SalesOrder| ExpectedVersion::Exact(o.version());
                let order = service.convert_to_draft(&session, id, rev(&order)).unwrap();
                let order = service.compute_tax(&session, id, rev(&order)).unwrap();
                let order = service.confirm_manually(&session, id, rev(&order)).unwrap();
                black_box(service.approve(&session, id, rev(&order)).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_approval_pipeline);
criterion_main!(benches);

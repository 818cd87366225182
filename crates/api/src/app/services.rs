use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::info;

use reclaim_events::{EventEnvelope, InMemoryEventBus};
use reclaim_infra::{
    EngineConfig, InMemoryRecordStore, OrderService, RecordingSignatureService, SignatureService,
    UnconfiguredExternalTax,
};
use reclaim_tax::ExternalTaxCalculator;

pub type SharedStore = Arc<InMemoryRecordStore>;
pub type SharedExternalTax = Arc<dyn ExternalTaxCalculator>;
pub type SharedSignatures = Arc<dyn SignatureService>;
pub type SharedBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

pub type AppOrderService = OrderService<SharedStore, SharedExternalTax, SharedSignatures, SharedBus>;

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub orders: AppOrderService,
}

impl AppServices {
    pub fn new(
        store: SharedStore,
        external_tax: SharedExternalTax,
        signatures: SharedSignatures,
        bus: SharedBus,
        config: &EngineConfig,
    ) -> Self {
        Self {
            orders: OrderService::new(store, external_tax, signatures, bus).with_ship_from(config.ship_from.clone()),
        }
    }
}

/// Single-process wiring: in-memory store and bus, no external tax service
/// and a signature service that records requests instead of sending them.
pub fn build_services(config: &EngineConfig) -> Arc<AppServices> {
    info!(
        environment = config.environment.as_str(),
        origin_configured = config.ship_from.is_some(),
        "wiring in-memory services"
    );

    Arc::new(AppServices::new(
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(UnconfiguredExternalTax),
        Arc::new(RecordingSignatureService::new()),
        Arc::new(InMemoryEventBus::new()),
        config,
    ))
}

//! Infrastructure layer: persistence, collaborators, configuration and the
//! `OrderService` that drives the sales order aggregate.

pub mod config;
pub mod error;
pub mod external_tax;
pub mod repository;
pub mod service;
pub mod signature;
pub mod store;

mod integration_tests;

pub use config::{EngineConfig, Environment};
pub use error::{ErrorKind, OrderServiceError};
pub use external_tax::UnconfiguredExternalTax;
pub use repository::{InventoryRepository, OrderRepository};
pub use service::{NewOrder, OrderService, OrderUpdate, SessionContext, SignatureCallback, Signer};
pub use signature::{RecordingSignatureService, SignatureDispatch, SignatureError, SignatureService};
pub use store::{InMemoryRecordStore, RecordStore, StoreError};

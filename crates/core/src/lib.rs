//! `reclaim-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the tax, inventory and
//! sales crates (no infrastructure concerns).

pub mod address;
pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use address::PostalAddress;
pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, CustomerId, TenantId, UserId};
pub use money::{round_money, MONEY_DECIMAL_PLACES};
pub use value_object::ValueObject;

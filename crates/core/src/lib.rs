//! `invoicer-core`: shared domain building blocks.
//!
//! Pure types only: errors, identifiers and the `Entity` trait used by the
//! ledger collections. No IO lives here.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{InvoiceId, ItemId, PublicTemplateId, TemplateId, UserId};

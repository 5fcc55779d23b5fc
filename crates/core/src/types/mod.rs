//! Shared type definitions.
//!
//! Newtype wrappers and small value types used across the workspace.

mod email;
mod id;
mod price;
mod role;

pub use email::{Email, EmailError};
pub use id::{OrderId, ProductId, UserId};
pub use price::{CurrencyCode, Price};
pub use role::UserRole;

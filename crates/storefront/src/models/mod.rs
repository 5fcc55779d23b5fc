//! Wire and domain types for the backend API.

pub mod auth;
pub mod order;
pub mod product;
pub mod user;

pub use auth::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
pub use order::{CheckoutRequest, Order, OrderStatus};
pub use product::{Collection, Product};
pub use user::User;

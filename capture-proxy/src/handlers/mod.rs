//! HTTP handlers for the capture proxy.

pub mod analyze;
pub mod health;

pub use analyze::{analyze, method_not_allowed};
pub use health::{health_check, metrics};

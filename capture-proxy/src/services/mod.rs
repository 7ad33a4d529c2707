pub mod providers;

pub use providers::{ImageAnalyzer, ProviderError};

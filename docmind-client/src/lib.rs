pub mod client;
pub mod error;
pub mod wire;

pub use client::ApiClient;
pub use error::ClientError;
pub use wire::{ScanResponse, UrlGroup, WidgetSettings};

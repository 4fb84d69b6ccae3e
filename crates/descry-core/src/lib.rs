pub mod error;
pub mod provider;
pub mod session;
pub mod state;

// Re-export common error type
pub use error::DescryError;
pub use provider::{DescriptionProvider, ProviderError};

pub mod document;
pub mod resolver;

pub use document::{ConfigDocument, ProviderEntry, Settings};
pub use resolver::{resolve, ConfigOverrides, ProviderConfig, ProviderId};

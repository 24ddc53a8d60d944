//! Domain models for storefront.

pub mod session;

pub use session::{BrowserId, keys as session_keys};

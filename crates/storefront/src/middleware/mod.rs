//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (tag span and Sentry scope)
//! 4. Security headers
//! 5. Session layer (tower-sessions, in-memory store)
//!
//! Handlers then pull the [`BrowserId`](crate::models::BrowserId) out of the
//! session through its extractor in [`browser`].

pub mod browser;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;

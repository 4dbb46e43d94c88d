//! Helpdesk Backend Integration
//!
//! Abstracted access to the helpdesk REST service through a common trait.
//!
//! # Usage
//!
//! ```ignore
//! use copilot_core::backend::{HelpdeskBackend, HttpBackend};
//! use copilot_core::config::ClientConfig;
//!
//! let backend = HttpBackend::new(&ClientConfig::default())?;
//! let healthy = backend.health_check().await;
//! ```

mod http;
mod traits;

pub use http::HttpBackend;
pub use traits::{BackendError, HelpdeskBackend};

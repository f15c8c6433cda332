//! Domain layer for pixview-viewer.
//!
//! Pure configuration types with no dependency on sockets or the async
//! runtime.  The pixel surface and contact counter live one level further
//! in, in `pixview-core`.

pub mod config;

pub use config::{ConfigError, Endpoint, Scheme, ViewerConfig};

//! Viewer configuration types.
//!
//! [`ViewerConfig`] holds every runtime setting: where the pixel server
//! lives, the framebuffer size, and the two fixed timer periods.  It can be
//! built from defaults or parsed from TOML; the collaborator owns any
//! persistence.
//!
//! ```toml
//! host = "192.168.1.40"
//! port = 8080
//! secure = false
//! reconnect_delay_ms = 1000
//! render_interval_ms = 100
//! ```
//!
//! Fields missing from the TOML fall back to the same values as
//! [`ViewerConfig::default`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pixview_core::domain::framebuffer::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Upper bound on `width * height` (a 4096 x 4096 surface).
pub const MAX_PIXELS: u64 = 4096 * 4096;

/// Error type for configuration parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port 0 cannot be connected to.
    #[error("invalid port {0}: must be in 1..=65535")]
    InvalidPort(u16),

    /// The host string is empty or only whitespace.
    #[error("host must not be empty")]
    EmptyHost,

    /// A size or interval that must be positive is zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// The framebuffer would hold more than [`MAX_PIXELS`] pixels.
    #[error("framebuffer {width}x{height} exceeds {max} pixels", max = MAX_PIXELS)]
    TooLarge { width: u32, height: u32 },

    /// The TOML content could not be parsed.
    #[error("failed to parse viewer config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// URL scheme used to reach the pixel server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain `ws://`.
    #[default]
    Ws,
    /// TLS `wss://`.
    Wss,
}

impl Scheme {
    fn as_str(self) -> &'static str {
        match self {
            Scheme::Ws => "ws",
            Scheme::Wss => "wss",
        }
    }
}

/// Where the pixel server lives.
///
/// The session controller reads its endpoint every time it opens a socket,
/// so an edit made while disconnected applies to the very next attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    scheme: Scheme,
}

impl Endpoint {
    /// Creates a validated endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyHost`] or [`ConfigError::InvalidPort`].
    pub fn new(host: impl Into<String>, port: u16, scheme: Scheme) -> Result<Self, ConfigError> {
        let host = validate_host(host.into())?;
        let port = validate_port(port)?;
        Ok(Self { host, port, scheme })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Replaces the host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyHost`]; the endpoint is left unchanged.
    pub fn set_host(&mut self, host: impl Into<String>) -> Result<(), ConfigError> {
        self.host = validate_host(host.into())?;
        Ok(())
    }

    /// Replaces the port.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] for port 0; the endpoint is left
    /// unchanged.
    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        self.port = validate_port(port)?;
        Ok(())
    }

    /// The WebSocket URL, e.g. `ws://127.0.0.1:8080`.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}

fn validate_host(host: String) -> Result<String, ConfigError> {
    let trimmed = host.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyHost);
    }
    Ok(trimmed.to_string())
}

fn validate_port(port: u16) -> Result<u16, ConfigError> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(port)
}

// ── ViewerConfig ──────────────────────────────────────────────────────────────

/// All runtime configuration for one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Pixel server hostname or IP address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Pixel server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Use `wss://` instead of `ws://`.
    #[serde(default)]
    pub secure: bool,
    /// Framebuffer width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Framebuffer height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Fixed delay before each reconnect attempt, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Render tick period in milliseconds.
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,
    /// Capacity of the per-connection outbound command queue.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
    /// Set the connection intent as soon as the viewer starts.
    #[serde(default)]
    pub autoconnect: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_reconnect_delay_ms() -> u64 {
    1000
}
fn default_render_interval_ms() -> u64 {
    100
}
fn default_outbound_queue() -> usize {
    64
}

impl Default for ViewerConfig {
    /// | Field              | Default       |
    /// |--------------------|---------------|
    /// | host               | `127.0.0.1`   |
    /// | port               | `8080`        |
    /// | secure             | `false`       |
    /// | width x height     | `320 x 240`   |
    /// | reconnect_delay_ms | `1000`        |
    /// | render_interval_ms | `100`         |
    /// | outbound_queue     | `64`          |
    /// | autoconnect        | `false`       |
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secure: false,
            width: default_width(),
            height: default_height(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            render_interval_ms: default_render_interval_ms(),
            outbound_queue: default_outbound_queue(),
            autoconnect: false,
        }
    }
}

impl ViewerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and the
    /// [`validate`](Self::validate) errors for out-of-range values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks every field that has a restricted range.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;
        if self.width == 0 {
            return Err(ConfigError::Zero("width"));
        }
        if self.height == 0 {
            return Err(ConfigError::Zero("height"));
        }
        if u64::from(self.width) * u64::from(self.height) > MAX_PIXELS {
            return Err(ConfigError::TooLarge {
                width: self.width,
                height: self.height,
            });
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::Zero("reconnect_delay_ms"));
        }
        if self.render_interval_ms == 0 {
            return Err(ConfigError::Zero("render_interval_ms"));
        }
        if self.outbound_queue == 0 {
            return Err(ConfigError::Zero("outbound_queue"));
        }
        Ok(())
    }

    /// Builds the initial [`Endpoint`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyHost`] or [`ConfigError::InvalidPort`].
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        let scheme = if self.secure { Scheme::Wss } else { Scheme::Ws };
        Endpoint::new(self.host.clone(), self.port, scheme)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ViewerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_timers_match_fixed_policy() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.reconnect_delay(), Duration::from_millis(1000));
        assert_eq!(cfg.render_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_default_surface_is_320_by_240() {
        let cfg = ViewerConfig::default();
        assert_eq!((cfg.width, cfg.height), (320, 240));
    }

    #[test]
    fn test_endpoint_url_plain_and_secure() {
        let ws = Endpoint::new("example.org", 9000, Scheme::Ws).unwrap();
        let wss = Endpoint::new("example.org", 443, Scheme::Wss).unwrap();

        assert_eq!(ws.url(), "ws://example.org:9000");
        assert_eq!(wss.url(), "wss://example.org:443");
    }

    #[test]
    fn test_endpoint_rejects_port_zero() {
        assert!(matches!(
            Endpoint::new("h", 0, Scheme::Ws),
            Err(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_endpoint_rejects_blank_host() {
        assert!(matches!(
            Endpoint::new("   ", 80, Scheme::Ws),
            Err(ConfigError::EmptyHost)
        ));
    }

    #[test]
    fn test_failed_edit_leaves_endpoint_unchanged() {
        // Arrange
        let mut ep = Endpoint::new("a", 1, Scheme::Ws).unwrap();

        // Act
        let host = ep.set_host("");
        let port = ep.set_port(0);

        // Assert
        assert!(host.is_err());
        assert!(port.is_err());
        assert_eq!(ep.url(), "ws://a:1");
    }

    #[test]
    fn test_host_is_trimmed() {
        let ep = Endpoint::new("  10.0.0.2 ", 80, Scheme::Ws).unwrap();
        assert_eq!(ep.host(), "10.0.0.2");
    }

    #[test]
    fn test_from_toml_partial_uses_defaults() {
        // Arrange
        let toml = r#"
            host = "10.1.2.3"
            secure = true
        "#;

        // Act
        let cfg = ViewerConfig::from_toml_str(toml).unwrap();

        // Assert
        assert_eq!(cfg.host, "10.1.2.3");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.endpoint().unwrap().url(), "wss://10.1.2.3:8080");
        assert_eq!(cfg.reconnect_delay_ms, 1000);
    }

    #[test]
    fn test_from_toml_empty_document_is_default() {
        assert_eq!(ViewerConfig::from_toml_str("").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_zero_interval() {
        let err = ViewerConfig::from_toml_str("render_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Zero("render_interval_ms")));
    }

    #[test]
    fn test_oversized_framebuffer_is_rejected() {
        // Arrange
        let at_limit = ViewerConfig {
            width: 4096,
            height: 4096,
            ..ViewerConfig::default()
        };
        let over = ViewerConfig {
            width: u32::MAX,
            height: u32::MAX,
            ..ViewerConfig::default()
        };

        // Act / Assert
        assert!(at_limit.validate().is_ok());
        assert!(matches!(
            over.validate(),
            Err(ConfigError::TooLarge { width: u32::MAX, height: u32::MAX })
        ));
        assert!(matches!(
            ViewerConfig::from_toml_str("width = 4097\nheight = 4096"),
            Err(ConfigError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        let err = ViewerConfig::from_toml_str("port = \"eighty\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let cfg = ViewerConfig {
            autoconnect: true,
            port: 5900,
            ..ViewerConfig::default()
        };

        let text = toml::to_string(&cfg).unwrap();

        assert_eq!(ViewerConfig::from_toml_str(&text).unwrap(), cfg);
    }
}

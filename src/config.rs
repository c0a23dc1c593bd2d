//! Configuration types for the leaf diagnosis service.
//!
//! All service behaviour is controlled through [`ServiceConfig`], built via
//! its [`ServiceConfigBuilder`]. The config is constructed once at start-up
//! and shared read-only with every request handler.
//!
//! The provider credential is deliberately absent: the LLM provider factory
//! reads it from the environment (`GEMINI_API_KEY`, `OPENAI_API_KEY`, …).

use crate::error::LeafScanError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the diagnosis service.
///
/// Built via [`ServiceConfig::builder()`] or using
/// [`ServiceConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_leafscan::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .port(8080)
///     .model("gemini-2.5-flash")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Interface to bind. Default: "0.0.0.0".
    pub host: String,

    /// TCP port to listen on. Default: 8000.
    pub port: u16,

    /// LLM provider name passed to the provider factory. Default: "gemini".
    pub provider_name: String,

    /// Vision model identifier. Default: "gemini-2.5-flash".
    pub model: String,

    /// Sampling temperature. Default: 0.1.
    ///
    /// A diagnosis should be repeatable for the same photo; low temperature
    /// also keeps the model from drifting away from the JSON-only format.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 1024.
    ///
    /// The three-field answer is short, but treatment advice can run to a
    /// few sentences. Too low a cap truncates the JSON mid-string.
    pub max_tokens: usize,

    /// Per-inference-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Maximum accepted request body in bytes. Default: 10 MiB.
    pub max_upload_bytes: usize,

    /// Longest image side forwarded to the model, in pixels. Default: 2048.
    ///
    /// Phone photos are often 4000+ px wide. Downscaling keeps the base64
    /// payload well under provider inline-image limits without losing the
    /// lesion detail a diagnosis needs.
    pub max_image_dimension: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            provider_name: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.1,
            max_tokens: 1024,
            api_timeout_secs: 60,
            max_upload_bytes: 10 * 1024 * 1024,
            max_image_dimension: 2048,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn max_image_dimension(mut self, px: u32) -> Self {
        self.config.max_image_dimension = px.max(64);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, LeafScanError> {
        let c = &self.config;
        if c.host.trim().is_empty() {
            return Err(LeafScanError::InvalidConfig("Host must not be empty".into()));
        }
        if c.provider_name.trim().is_empty() {
            return Err(LeafScanError::InvalidConfig(
                "Provider name must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(LeafScanError::InvalidConfig("Model must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(LeafScanError::InvalidConfig("Max tokens must be ≥ 1".into()));
        }
        if c.max_upload_bytes == 0 {
            return Err(LeafScanError::InvalidConfig(
                "Max upload size must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

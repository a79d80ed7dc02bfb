//! Session configuration.
//!
//! [`SessionConfig`] can be built fluently through [`SessionConfigBuilder`]
//! or deserialized from JSON; missing fields take their defaults either way.
//!
//! ```rust
//! use kensaku::SessionConfig;
//! use std::time::Duration;
//!
//! let config = SessionConfig::builder()
//!     .debounce_ms(150u64)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.debounce(), Duration::from_millis(150));
//! assert_eq!(config.page_size, 17);
//! assert_eq!(config.max_page, 10);
//!
//! let config = SessionConfig::from_json(r#"{ "max_page": 3 }"#).unwrap();
//! assert_eq!(config.max_page, 3);
//! assert_eq!(config.debounce_ms, 0);
//! ```

use derive_builder::{Builder, UninitializedFieldError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{MAX_PAGE, PAGE_SIZE};

/// Site name used for window titles.
pub const DEFAULT_SITE_NAME: &str = "Miruro";

/// Tunables for one [`SearchSession`](crate::SearchSession).
///
/// # Fields
///
/// * `debounce_ms` - Quiet period after the last change before a request is
///   issued. Zero still coalesces changes made without yielding to the runtime.
/// * `page_size` - Results requested per page
/// * `max_page` - Highest page the session will request
/// * `site_name` - Suffix of the window title
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate", error = "Error"))]
#[serde(default)]
pub struct SessionConfig {
    #[builder(default)]
    pub debounce_ms: u64,
    #[builder(default = "PAGE_SIZE")]
    pub page_size: u32,
    #[builder(default = "MAX_PAGE")]
    pub max_page: u32,
    #[builder(default = "DEFAULT_SITE_NAME.to_string()")]
    pub site_name: String,
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Parses a JSON document and validates the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        check_limits(self.page_size, self.max_page)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 0,
            page_size: PAGE_SIZE,
            max_page: MAX_PAGE,
            site_name: DEFAULT_SITE_NAME.to_string(),
        }
    }
}

impl SessionConfigBuilder {
    fn validate(&self) -> Result<()> {
        check_limits(
            self.page_size.unwrap_or(PAGE_SIZE),
            self.max_page.unwrap_or(MAX_PAGE),
        )
    }
}

impl From<UninitializedFieldError> for Error {
    fn from(e: UninitializedFieldError) -> Self {
        Error::config(e.to_string())
    }
}

fn check_limits(page_size: u32, max_page: u32) -> Result<()> {
    if page_size == 0 {
        return Err(Error::config("page_size must be at least 1"));
    }
    if max_page == 0 {
        return Err(Error::config("max_page must be at least 1"));
    }
    Ok(())
}

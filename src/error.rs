//! Error types and result handling for kensaku operations.
//!
//! All fallible operations return a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! - **Network Errors**: connection issues, timeouts, HTTP transport errors
//! - **Parse Errors**: payloads that do not have the expected shape
//! - **Catalog Errors**: non-success answers from a catalog endpoint
//! - **Rate Limiting**: when the catalog throttles requests
//! - **Invalid Options**: filter values that are not part of a dimension's vocabulary
//! - **Configuration**: session settings that cannot be honoured
//!
//! Errors never reach the rendering layer through a [`SearchSession`](crate::SearchSession):
//! the session logs catalog failures and records them in
//! [`ResultSet::error`](crate::ResultSet::error) instead.
//!
//! # Examples
//!
//! ```rust
//! use kensaku::{Error, Genre};
//!
//! match "Isekai".parse::<Genre>() {
//!     Ok(genre) => println!("genre: {}", genre),
//!     Err(Error::InvalidOption { dimension, value }) => {
//!         println!("{} is not a known {}", value, dimension)
//!     }
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// Type alias for Results with kensaku errors.
///
/// ```rust
/// use kensaku::{Result, Error};
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::parse("Something went wrong"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all kensaku operations.
///
/// # Variants
///
/// * [`Network`](Error::Network) - HTTP client and connection errors
/// * [`Parse`](Error::Parse) - Payload format errors
/// * [`Catalog`](Error::Catalog) - Endpoint errors with context
/// * [`RateLimit`](Error::RateLimit) - Rate limiting responses
/// * [`InvalidOption`](Error::InvalidOption) - Unknown filter values
/// * [`Config`](Error::Config) - Invalid session configuration
/// * [`Json`](Error::Json) - JSON deserialization errors
/// * [`Other`](Error::Other) - Generic error messages
#[derive(Error, Debug)]
pub enum Error {
    /// Network-related errors from HTTP operations.
    ///
    /// Wraps errors from the underlying HTTP client (reqwest): connection
    /// timeouts, DNS resolution failures, TLS errors and transport failures.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The received data cannot be interpreted as expected.
    ///
    /// ```rust
    /// use kensaku::Error;
    ///
    /// let error = Error::parse("Missing results field in response");
    /// ```
    #[error("Parse error: {0}")]
    Parse(String),

    /// A catalog endpoint answered with something other than a search page.
    ///
    /// # Fields
    ///
    /// * `endpoint` - The catalog endpoint that produced the error
    /// * `message` - What went wrong
    ///
    /// ```rust
    /// use kensaku::Error;
    ///
    /// let error = Error::catalog("anilist", "HTTP 502 Bad Gateway");
    /// ```
    #[error("Catalog error [{endpoint}]: {message}")]
    Catalog { endpoint: String, message: String },

    /// The catalog throttled the request.
    ///
    /// `retry_after` carries the value of the `Retry-After` header, in seconds,
    /// when the endpoint provided one.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimit { retry_after: Option<u64> },

    /// A filter value is not part of its dimension's vocabulary.
    ///
    /// Raised by the `FromStr` implementations of the filter types. The query
    /// string decoder treats this as an absent parameter.
    ///
    /// ```rust
    /// use kensaku::Error;
    ///
    /// let error = Error::invalid_option("season", "MONSOON");
    /// assert_eq!(error.to_string(), "Invalid season value: MONSOON");
    /// ```
    #[error("Invalid {dimension} value: {value}")]
    InvalidOption {
        dimension: &'static str,
        value: String,
    },

    /// Session configuration that cannot be honoured.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON deserialization errors from catalog payloads.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors that don't fit into other categories.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a parse error with the given message.
    ///
    /// ```rust
    /// use kensaku::Error;
    ///
    /// let error = Error::parse(format!("Expected {} results, found {}", 17, 3));
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a catalog error for the given endpoint.
    pub fn catalog(endpoint: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Catalog {
            endpoint: endpoint.into(),
            message: msg.into(),
        }
    }

    /// Creates a rate limit error with optional retry-after time.
    ///
    /// ```rust
    /// use kensaku::Error;
    ///
    /// let error = Error::rate_limit(Some(60));
    /// let error = Error::rate_limit(None);
    /// ```
    pub fn rate_limit(retry_after: Option<u64>) -> Self {
        Error::RateLimit { retry_after }
    }

    /// Creates an invalid option error for a filter dimension.
    pub fn invalid_option(dimension: &'static str, value: impl Into<String>) -> Self {
        Error::InvalidOption {
            dimension,
            value: value.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

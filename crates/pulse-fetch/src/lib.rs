//! Rate-limited, retrying signal sources for Pulse.
//!
//! This crate defines the [`SignalSource`] provider contract and the
//! machinery that keeps provider traffic within budget:
//!
//! - [`RateLimiter`]: at most N calls per rolling 60 seconds per provider,
//!   queuing excess calls in arrival order
//! - [`RetryingFetcher`]: exponential backoff on rate-limit and network
//!   failures
//! - [`GatedSource`]: wraps any source with a limiter, retries and a
//!   [`pulse_cache::TieredCache`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pulse_fetch::{GatedSource, HttpSource, RateLimiter, RetryingFetcher, SignalSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = HttpSource::from_env("market-data", "https://api.example.com")?;
//!     let gated = GatedSource::new(
//!         Arc::new(http),
//!         Arc::new(RateLimiter::new(30)),
//!         RetryingFetcher::default(),
//!         cache,
//!         std::time::Duration::from_secs(300),
//!     );
//!
//!     let vix = gated.fetch(pulse_traits::SignalKey::VixLevel).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Environment Variables
//!
//! Set `PULSE_API_KEY` in your environment or `.env` file:
//!
//! ```bash
//! PULSE_API_KEY=your_api_key_here
//! ```

mod client;
mod error;
mod rate_limiter;
mod retry;
mod source;

pub use client::{API_KEY_VAR, HttpSource, decode_payload};
pub use error::ProviderError;
pub use rate_limiter::{RateLimiter, RateLimiterState, WINDOW};
pub use retry::{RetryPolicy, RetryingFetcher};
pub use source::{FetchFuture, GatedSource, SignalSource, StaticSource};

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

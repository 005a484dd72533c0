//! # HamQTH XML Callbook Client
//!
//! A small async Rust client for the HamQTH.com XML callbook, used to enrich
//! logged QSOs with the other station's name and location.
//!
//! ## Features
//!
//! - **Session caching**: one login per hour, reused across lookups
//! - **Self-healing**: an expired or rejected session is replaced and the
//!   lookup retried exactly once
//! - **Typed errors**: callers branch on the failure cause, not on message text
//! - **Flat results**: [`LookupResult`] serializes straight into a JSONL log record
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hamqth_xml::HamQthClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads HAMQTH_USER and HAMQTH_PASS
//!     let client = HamQthClient::from_env()?;
//!
//!     let station = client.callbook_lookup("ok7an").await?;
//!     println!("{} - {}", station.call_sign, station.name.unwrap_or_default());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Authentication
//!
//! Any registered HamQTH.com account can use the XML interface. Credentials
//! are read from the `HAMQTH_USER` and `HAMQTH_PASS` environment variables.

pub mod client;
pub mod credentials;
pub mod error;
pub mod response;
pub mod session;
pub mod transport;
pub mod types;
pub mod xml;

pub use client::{HamQthClient, HamQthClientConfig};
pub use credentials::Credentials;
pub use error::{HamQthError, Result};
pub use response::ErrorMatchers;
pub use types::LookupResult;

/// HamQTH's XML endpoint, used for both login and lookups
pub const DEFAULT_BASE_URL: &str = "https://www.hamqth.com/xml.php";

/// Program name reported to HamQTH with each lookup
pub const DEFAULT_PROGRAM_NAME: &str = "hamqth-xml-rs";

/// Default user agent string for requests
pub const DEFAULT_USER_AGENT: &str = concat!("hamqth-xml-rs/", env!("CARGO_PKG_VERSION"));

/// Seconds to wait for any single HTTP request
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// Seconds a HamQTH session id stays valid
pub const DEFAULT_SESSION_LIFETIME_SECONDS: i64 = 3600;

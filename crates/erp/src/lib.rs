//! `storefront-erp` — rate-limited client for the backing ERP.
//!
//! The ERP exposes two API surfaces: a high-rate-limit ledger API (items,
//! price lists, orders, invoices) and a low-rate-limit inventory API that
//! alone knows per-warehouse stock breakdowns. This crate owns everything
//! about talking to them responsibly:
//! - OAuth token acquisition with a process-local memo, a shared cached
//!   copy, and a cross-instance refresh debounce
//! - a sliding-window request governor
//! - bounded retry with exponential backoff on rate-limit responses only
//! - a distinguishable error taxonomy (`RateLimited` vs `Upstream`) so
//!   callers can choose different user-facing degradations

pub mod client;
pub mod error;
pub mod governor;
pub mod retry;
pub mod token;
pub mod types;

pub use client::ErpClient;
pub use error::{ErpError, ErpResult};
pub use governor::RequestGovernor;
pub use retry::RetryPolicy;
pub use token::{HttpTokenExchanger, OAuthToken, TokenExchanger, TokenProvider};

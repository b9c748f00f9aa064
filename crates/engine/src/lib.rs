//! Client-side core of FinanceFlow.
//!
//! [`FinanceStore`] mirrors the signed-in user's rows and proxies every write
//! to a [`RemoteService`]. The [`aggregate`] functions derive the dashboard
//! totals from that mirror.

pub use aggregate::{CategoryTotal, Totals};
pub use auth::{AuthChange, AuthEvent, AuthService, AuthSubscription};
pub use error::{RemoteError, StoreError};
pub use remote::RemoteService;
pub use store::{FinanceState, FinanceStore};
pub use toast::{Toast, ToastLevel};

pub mod aggregate;
mod auth;
mod error;
mod remote;
mod store;
mod toast;

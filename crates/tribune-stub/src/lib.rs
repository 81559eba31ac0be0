// SPDX-License-Identifier: BUSL-1.1
//! # tribune-stub -- In-memory Tribune backend
//!
//! A contract double for the REST backend that the admin console talks to.
//! It answers the same paths with the same shapes, holds everything in
//! DashMaps, and loses all data on restart.
//!
//! Besides plain CRUD it implements the verification ticket store:
//! - one live domain-email OTP per community, reissue invalidates the prior
//!   code, ten-minute expiry, consumed on success;
//! - one invite per (community, email), reissue overwrites the code unless
//!   the invite is already approved;
//! - a Multi community activates at its second approval.
//!
//! OTPs are echoed in the issuance response so that a console can relay
//! them by hand. Codes are never logged.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod store;

pub use config::{StubConfig, StubConfigError};
pub use error::StubError;
pub use routes::router;
pub use store::AppState;

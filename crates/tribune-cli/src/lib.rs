// SPDX-License-Identifier: BUSL-1.1
//! # tribune-cli -- Admin console for the Tribune stack
//!
//! Provides the `tribune` command-line interface over `tribune-client`.
//!
//! ## Subcommands
//!
//! - `tribune login` / `logout` / `status`: session management.
//! - `tribune community`: list, show and discard communities, and decide
//!   join requests.
//! - `tribune wizard`: the interactive onboarding wizard (single or multi).
//! - `tribune verify`: out-of-band domain-email verification.
//! - `tribune invite`: out-of-band authorized-person invites and approvals.
//! - `tribune post`: list, create, like and share community posts.
//!
//! The session persists between invocations in a JSON file. Every
//! administrative command runs the route guard first and exits with code 2
//! when the operator has to log in again.
//!
//! ```bash
//! tribune login --email admin@tribune.local --password admin
//! tribune wizard single --name "Tech Daily" --domain-email ed@tech.com
//! tribune community list --type multi --status pending
//! ```

pub mod auth;
pub mod community;
pub mod console;
pub mod invite;
pub mod post;
pub mod session_file;
pub mod verify;
pub mod wizard;

pub use console::{Console, EXIT_FAILURE, EXIT_LOGIN_REQUIRED, EXIT_OK};
pub use session_file::FileSessionStore;

// SPDX-License-Identifier: BUSL-1.1
//! # Session Subcommands
//!
//! - `login`: authenticate, cache the session, then run the route guard so
//!   that a non-admin account is rejected immediately.
//! - `logout`: drop the cached session. No request is made.
//! - `status`: run the route guard and show who is logged in.

use anyhow::Result;
use clap::Args;
use zeroize::Zeroizing;

use tribune_core::Email;

use crate::console::{api_failure, Console, EXIT_FAILURE, EXIT_LOGIN_REQUIRED, EXIT_OK};

/// Arguments for `tribune login`.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email.
    #[arg(long)]
    pub email: String,

    /// Account password.
    #[arg(long, env = "TRIBUNE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Execute `tribune login`.
pub async fn run_login(args: &LoginArgs, console: &Console) -> Result<u8> {
    let email = Email::new(&args.email)?;
    let password = Zeroizing::new(args.password.clone());

    match console.client().auth().login(&email, &password).await {
        Ok(_) => {}
        Err(e) if e.status() == Some(400) => {
            eprintln!("Login failed: {}", e.user_message());
            return Ok(EXIT_FAILURE);
        }
        Err(e) => return api_failure(e),
    }

    let Some(session) = console.require_admin() else {
        return Ok(EXIT_LOGIN_REQUIRED);
    };
    println!("Logged in as {}.", session.display_name());
    Ok(EXIT_OK)
}

/// Execute `tribune logout`.
pub fn run_logout(console: &Console) -> Result<u8> {
    console.client().auth().logout();
    println!("Logged out.");
    Ok(EXIT_OK)
}

/// Execute `tribune status`.
pub fn run_status(console: &Console) -> Result<u8> {
    let Some(session) = console.require_admin() else {
        return Ok(EXIT_LOGIN_REQUIRED);
    };
    let user = session.user();
    println!("Logged in as {}", session.display_name());
    if let Some(email) = &user.email {
        println!("  email: {email}");
    }
    match &user.id {
        Some(id) => println!("  id:    {id}"),
        None => println!("  id:    (none; community creation will be refused)"),
    }
    println!("  role:  {:?}", user.role);
    println!("  session file: {}", console.session().path().display());
    Ok(EXIT_OK)
}

// SPDX-License-Identifier: BUSL-1.1
//! # Verify Subcommand
//!
//! Out-of-band domain-email verification for a Single community that an
//! earlier wizard run left Pending.
//!
//! - `send`: issue a code. Any code issued before stops working.
//! - `confirm`: redeem a code. Success activates the community.

use anyhow::Result;
use clap::{Args, Subcommand};

use tribune_core::{CommunityId, Email, OtpInput};

use crate::console::{api_failure, Console, EXIT_FAILURE, EXIT_LOGIN_REQUIRED, EXIT_OK};

/// Arguments for the `tribune verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(subcommand)]
    pub command: VerifyCommand,
}

/// Verify subcommands.
#[derive(Subcommand, Debug)]
pub enum VerifyCommand {
    /// Issue a domain-email code.
    Send {
        /// Community identifier.
        #[arg(long)]
        community: String,
        /// The community's domain email.
        #[arg(long)]
        domain_email: String,
    },

    /// Confirm a domain-email code.
    Confirm {
        /// Community identifier.
        #[arg(long)]
        community: String,
        /// The six-digit code. Non-digits are ignored.
        #[arg(long)]
        otp: String,
    },
}

/// Execute the verify subcommand.
pub async fn run_verify(args: &VerifyArgs, console: &Console) -> Result<u8> {
    if console.require_admin().is_none() {
        return Ok(EXIT_LOGIN_REQUIRED);
    }
    let communities = console.client().communities();

    match &args.command {
        VerifyCommand::Send {
            community,
            domain_email,
        } => {
            let id = CommunityId::new(community.as_str())?;
            let email = Email::new(domain_email.as_str())?;
            match communities.send_email_otp(&id, &email).await {
                Ok(issued) => {
                    match issued.otp {
                        Some(code) => println!("Verification code issued: {code}"),
                        None => println!("Verification code sent to {email}."),
                    }
                    Ok(EXIT_OK)
                }
                Err(e) if e.is_client_error() && e.status() != Some(401) => {
                    eprintln!("Could not issue a code: {}", e.user_message());
                    Ok(EXIT_FAILURE)
                }
                Err(e) => api_failure(e),
            }
        }

        VerifyCommand::Confirm { community, otp } => {
            let id = CommunityId::new(community.as_str())?;
            let mut input = OtpInput::new();
            input.set(otp);
            let Some(code) = input.to_code() else {
                eprintln!("The code must be exactly 6 digits.");
                return Ok(EXIT_FAILURE);
            };
            match communities.confirm_email_otp(&id, &code).await {
                Ok(_) => {
                    println!("Community {id} verified and active.");
                    Ok(EXIT_OK)
                }
                Err(e) if e.is_client_error() && e.status() != Some(401) => {
                    eprintln!("{}", e.user_message());
                    Ok(EXIT_FAILURE)
                }
                Err(e) => api_failure(e),
            }
        }
    }
}

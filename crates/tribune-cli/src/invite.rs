// SPDX-License-Identifier: BUSL-1.1
//! # Invite Subcommand
//!
//! Out-of-band authorized-person invites for a Multi community.
//!
//! - `send` / `resend`: issue one invite. Re-issuing replaces the code.
//! - `approve`: redeem an invite code on behalf of an authorized person,
//!   through [`OnboardingWizard::approve_invite`].

use anyhow::Result;
use clap::{Args, Subcommand};

use tribune_client::{Acknowledgement, OnboardingError, OnboardingWizard};
use tribune_core::{CommunityId, CommunityStatus, Email, OtpInput};
use tribune_state::REQUIRED_APPROVALS;

use crate::console::{api_failure, Console, EXIT_FAILURE, EXIT_LOGIN_REQUIRED, EXIT_OK};

/// Arguments for the `tribune invite` subcommand.
#[derive(Args, Debug)]
pub struct InviteArgs {
    #[command(subcommand)]
    pub command: InviteCommand,
}

/// Invite subcommands.
#[derive(Subcommand, Debug)]
pub enum InviteCommand {
    /// Issue an invite.
    Send(InviteTarget),

    /// Re-issue an invite. The previous code stops working.
    Resend(InviteTarget),

    /// Approve an invite.
    Approve {
        #[command(flatten)]
        target: InviteTarget,
        /// The six-digit invite code. Non-digits are ignored.
        #[arg(long)]
        otp: String,
    },
}

/// A (community, email) pair.
#[derive(Args, Debug, Clone)]
pub struct InviteTarget {
    /// Community identifier.
    #[arg(long)]
    pub community: String,
    /// Authorized person email.
    #[arg(long)]
    pub email: String,
}

impl InviteTarget {
    fn parse(&self) -> Result<(CommunityId, Email)> {
        Ok((
            CommunityId::new(self.community.as_str())?,
            Email::new(self.email.as_str())?,
        ))
    }
}

/// Execute the invite subcommand.
pub async fn run_invite(args: &InviteArgs, console: &Console) -> Result<u8> {
    let Some(session) = console.require_admin() else {
        return Ok(EXIT_LOGIN_REQUIRED);
    };

    match &args.command {
        InviteCommand::Send(target) | InviteCommand::Resend(target) => {
            let (id, email) = target.parse()?;
            match console.client().communities().invite_authorized(&id, &email).await {
                Ok(issued) => {
                    match issued.otp {
                        Some(code) => println!("Invite code for {email}: {code}"),
                        None => println!("Invite sent to {email}."),
                    }
                    Ok(EXIT_OK)
                }
                Err(e) if e.is_client_error() && e.status() != Some(401) => {
                    eprintln!("Could not invite {email}: {}", e.user_message());
                    Ok(EXIT_FAILURE)
                }
                Err(e) => api_failure(e),
            }
        }

        InviteCommand::Approve { target, otp } => {
            let (id, email) = target.parse()?;
            let mut input = OtpInput::new();
            input.set(otp);
            let Some(code) = input.to_code() else {
                eprintln!("The code must be exactly 6 digits.");
                return Ok(EXIT_FAILURE);
            };

            let mut wizard = OnboardingWizard::new(console.client().clone(), session);
            match wizard.approve_invite(&id, &email, &code).await {
                Ok(ack) => {
                    println!("{}", approval_summary(&email, &ack));
                    if ack.status == Some(CommunityStatus::Active) {
                        println!("Community {id} is now active.");
                    }
                    Ok(EXIT_OK)
                }
                Err(OnboardingError::Unauthorized) => {
                    eprintln!("Session expired. Run `tribune login`.");
                    Ok(EXIT_LOGIN_REQUIRED)
                }
                Err(
                    OnboardingError::InvalidOtp { message }
                    | OnboardingError::NetworkOrServer { message },
                ) => {
                    eprintln!("Approval failed: {message}");
                    Ok(EXIT_FAILURE)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

fn approval_summary(email: &Email, ack: &Acknowledgement) -> String {
    let approvals = ack
        .approvals
        .map_or_else(|| "?".to_string(), |n| n.to_string());
    format!("Approved by {email} ({approvals}/{REQUIRED_APPROVALS} approvals).")
}

// SPDX-License-Identifier: BUSL-1.1
//! # Community Subcommand
//!
//! - `list`: all communities, optionally filtered by type and status.
//! - `show`: one community as JSON, members and join requests included.
//! - `discard`: delete a community left Pending by an unfinished wizard.
//!   An Active community is never deleted.
//! - `approve-join` / `reject-join`: decide a pending join request.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use tribune_client::{Community, CommunityFilter, DiscardOutcome, JoinDecision};
use tribune_core::{CommunityId, CommunityStatus, CommunityType, UserId};
use tribune_state::REQUIRED_APPROVALS;

use crate::console::{api_failure, Console, EXIT_FAILURE, EXIT_LOGIN_REQUIRED, EXIT_OK};

/// Arguments for the `tribune community` subcommand.
#[derive(Args, Debug)]
pub struct CommunityArgs {
    #[command(subcommand)]
    pub command: CommunityCommand,
}

/// Community subcommands.
#[derive(Subcommand, Debug)]
pub enum CommunityCommand {
    /// List communities.
    List {
        /// Keep only this type.
        #[arg(long = "type", value_enum)]
        community_type: Option<TypeArg>,
        /// Keep only this status.
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Show one community.
    Show {
        /// Community identifier.
        id: String,
    },

    /// Delete a Pending community.
    Discard {
        /// Community identifier.
        id: String,
    },

    /// Accept a pending join request.
    ApproveJoin(JoinTarget),

    /// Decline a pending join request.
    RejectJoin(JoinTarget),
}

/// The request a join decision applies to.
#[derive(Args, Debug)]
pub struct JoinTarget {
    /// Community identifier.
    #[arg(long)]
    pub community: String,
    /// Requesting user's identifier.
    #[arg(long)]
    pub user: String,
}

/// Community type as a flag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    Single,
    Multi,
}

impl From<TypeArg> for CommunityType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Single => Self::Single,
            TypeArg::Multi => Self::Multi,
        }
    }
}

/// Community status as a flag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Active,
}

impl From<StatusArg> for CommunityStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Self::Pending,
            StatusArg::Active => Self::Active,
        }
    }
}

/// Execute the community subcommand.
pub async fn run_community(args: &CommunityArgs, console: &Console) -> Result<u8> {
    if console.require_admin().is_none() {
        return Ok(EXIT_LOGIN_REQUIRED);
    }
    let communities = console.client().communities();

    match &args.command {
        CommunityCommand::List {
            community_type,
            status,
        } => {
            let filter = CommunityFilter {
                community_type: community_type.map(Into::into),
                status: status.map(Into::into),
            };
            let listing = match communities.list().await {
                Ok(listing) => filter.apply(listing),
                Err(e) => return api_failure(e),
            };
            if listing.is_empty() {
                println!("No communities.");
            }
            for community in &listing {
                println!("{}", render_row(community));
            }
            Ok(EXIT_OK)
        }

        CommunityCommand::Show { id } => {
            let id = CommunityId::new(id.as_str())?;
            match communities.get(&id).await {
                Ok(Some(community)) => {
                    println!("{}", serde_json::to_string_pretty(&community)?);
                    Ok(EXIT_OK)
                }
                Ok(None) => {
                    eprintln!("Community {id} not found.");
                    Ok(EXIT_FAILURE)
                }
                Err(e) => api_failure(e),
            }
        }

        CommunityCommand::Discard { id } => {
            let id = CommunityId::new(id.as_str())?;
            match communities.discard_pending(&id).await {
                Ok(DiscardOutcome::Deleted) => {
                    println!("Discarded pending community {id}.");
                    Ok(EXIT_OK)
                }
                Ok(DiscardOutcome::KeptActive) => {
                    eprintln!("Community {id} is active and was not deleted.");
                    Ok(EXIT_FAILURE)
                }
                Ok(DiscardOutcome::NotFound) => {
                    eprintln!("Community {id} not found.");
                    Ok(EXIT_FAILURE)
                }
                Err(e) => api_failure(e),
            }
        }

        CommunityCommand::ApproveJoin(target) => {
            decide(console, target, JoinDecision::Approve).await
        }
        CommunityCommand::RejectJoin(target) => decide(console, target, JoinDecision::Reject).await,
    }
}

async fn decide(console: &Console, target: &JoinTarget, decision: JoinDecision) -> Result<u8> {
    let community = CommunityId::new(target.community.as_str())?;
    let user = UserId::new(target.user.as_str())?;
    match console
        .client()
        .communities()
        .decide_join_request(&community, &user, decision)
        .await
    {
        Ok(ack) => {
            let verb = match decision {
                JoinDecision::Approve => "approved",
                JoinDecision::Reject => "rejected",
            };
            println!(
                "{}",
                ack.message
                    .unwrap_or_else(|| format!("Join request of {user} {verb}."))
            );
            Ok(EXIT_OK)
        }
        Err(e) => api_failure(e),
    }
}

/// One listing line: id, type, status, approvals, name.
pub fn render_row(community: &Community) -> String {
    let approvals = match community.community_type {
        CommunityType::Multi => format!("{}/{REQUIRED_APPROVALS}", community.approvals),
        CommunityType::Single => "-".to_string(),
    };
    format!(
        "{:<26} {:<7} {:<8} {:<4} {}",
        community.id.as_str(),
        community.community_type.as_str(),
        community.status.as_str(),
        approvals,
        community.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn community(ty: &str, status: &str, approvals: u32) -> Community {
        serde_json::from_value(serde_json::json!({
            "_id": "c-1", "name": "Makers", "type": ty, "status": status,
            "approvals": approvals
        }))
        .unwrap()
    }

    #[test]
    fn row_shows_approval_progress_for_multi() {
        let row = render_row(&community("Multi", "Pending", 1));
        assert!(row.starts_with("c-1"));
        assert!(row.contains("Multi"));
        assert!(row.contains("Pending"));
        assert!(row.contains(&format!("1/{REQUIRED_APPROVALS}")));
        assert!(row.ends_with("Makers"));
    }

    #[test]
    fn row_has_no_approvals_for_single() {
        let row = render_row(&community("Single", "Active", 0));
        assert!(!row.contains('/'));
        assert!(row.contains("Active"));
    }

    #[test]
    fn flag_values_map_to_domain_enums() {
        assert_eq!(CommunityType::from(TypeArg::Multi), CommunityType::Multi);
        assert_eq!(CommunityStatus::from(StatusArg::Pending), CommunityStatus::Pending);
    }
}

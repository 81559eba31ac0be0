// SPDX-License-Identifier: BUSL-1.1
//! # tribune CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Exit codes: 0 success, 1 failure, 2 login required.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tribune_cli::auth::{run_login, run_logout, run_status, LoginArgs};
use tribune_cli::community::{run_community, CommunityArgs};
use tribune_cli::invite::{run_invite, InviteArgs};
use tribune_cli::post::{run_post, PostArgs};
use tribune_cli::verify::{run_verify, VerifyArgs};
use tribune_cli::wizard::{run_wizard, WizardArgs};
use tribune_cli::{Console, EXIT_FAILURE};

/// Tribune admin console.
///
/// Logs in against the Tribune backend, lists communities and runs the
/// community onboarding wizard.
#[derive(Parser, Debug)]
#[command(name = "tribune", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Backend base URL. Overrides TRIBUNE_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file. Defaults to the platform config directory.
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and cache the session.
    Login(LoginArgs),

    /// Drop the cached session.
    Logout,

    /// Show the cached session, if it passes the route guard.
    Status,

    /// List, show and discard communities; decide join requests.
    Community(CommunityArgs),

    /// Interactive community onboarding.
    Wizard(WizardArgs),

    /// Out-of-band domain-email verification.
    Verify(VerifyArgs),

    /// Out-of-band authorized-person invites and approvals.
    Invite(InviteArgs),

    /// Community posts.
    Post(PostArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("tribune CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let console = Console::open(cli.api_url.as_deref(), cli.session_file)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let outcome = runtime.block_on(async {
        match &cli.command {
            Commands::Login(args) => run_login(args, &console).await,
            Commands::Logout => run_logout(&console),
            Commands::Status => run_status(&console),
            Commands::Community(args) => run_community(args, &console).await,
            Commands::Wizard(args) => run_wizard(args, &console).await,
            Commands::Verify(args) => run_verify(args, &console).await,
            Commands::Invite(args) => run_invite(args, &console).await,
            Commands::Post(args) => run_post(args, &console).await,
        }
    });
    console.sync_session()?;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribune_cli::community::{CommunityCommand, StatusArg, TypeArg};
    use tribune_cli::invite::InviteCommand;
    use tribune_cli::post::{PostCommand, PostTypeArg};
    use tribune_cli::verify::VerifyCommand;
    use tribune_cli::wizard::WizardCommand;

    #[test]
    fn cli_parse_login() {
        let cli = Cli::try_parse_from([
            "tribune", "login", "--email", "admin@tribune.local", "--password", "pw",
        ])
        .unwrap();
        match cli.command {
            Commands::Login(args) => {
                assert_eq!(args.email, "admin@tribune.local");
                assert_eq!(args.password, "pw");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tribune",
            "status",
            "-vv",
            "--api-url",
            "http://10.0.0.2:8090",
            "--session-file",
            "/tmp/s.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.api_url.as_deref(), Some("http://10.0.0.2:8090"));
        assert_eq!(cli.session_file, Some(PathBuf::from("/tmp/s.json")));
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn cli_parse_community_list_filters() {
        let cli = Cli::try_parse_from([
            "tribune", "community", "list", "--type", "multi", "--status", "pending",
        ])
        .unwrap();
        let Commands::Community(args) = cli.command else {
            panic!("expected community");
        };
        match args.command {
            CommunityCommand::List {
                community_type,
                status,
            } => {
                assert_eq!(community_type, Some(TypeArg::Multi));
                assert_eq!(status, Some(StatusArg::Pending));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_parse_community_list_rejects_unknown_type() {
        assert!(Cli::try_parse_from(["tribune", "community", "list", "--type", "triple"]).is_err());
    }

    #[test]
    fn cli_parse_wizard_single() {
        let cli = Cli::try_parse_from([
            "tribune",
            "wizard",
            "single",
            "--name",
            "Tech Daily",
            "--domain-email",
            "ed@tech.com",
            "--discard-on-cancel",
        ])
        .unwrap();
        let Commands::Wizard(args) = cli.command else {
            panic!("expected wizard");
        };
        match args.command {
            WizardCommand::Single {
                basic,
                domain_email,
            } => {
                assert_eq!(basic.name, "Tech Daily");
                assert_eq!(basic.description, "");
                assert!(basic.discard_on_cancel);
                assert_eq!(domain_email, "ed@tech.com");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_parse_wizard_multi_collects_authorized() {
        let cli = Cli::try_parse_from([
            "tribune",
            "wizard",
            "multi",
            "--name",
            "Makers",
            "--authorized",
            "a@x.com",
            "--authorized",
            "b@x.com",
        ])
        .unwrap();
        let Commands::Wizard(args) = cli.command else {
            panic!("expected wizard");
        };
        match args.command {
            WizardCommand::Multi { basic, authorized } => {
                assert_eq!(basic.name, "Makers");
                assert!(!basic.discard_on_cancel);
                assert_eq!(authorized, vec!["a@x.com", "b@x.com"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_parse_wizard_multi_requires_authorized() {
        assert!(Cli::try_parse_from(["tribune", "wizard", "multi", "--name", "Makers"]).is_err());
    }

    #[test]
    fn cli_parse_verify_confirm() {
        let cli = Cli::try_parse_from([
            "tribune", "verify", "confirm", "--community", "c1", "--otp", "482913",
        ])
        .unwrap();
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert!(matches!(
            args.command,
            VerifyCommand::Confirm { ref community, ref otp } if community == "c1" && otp == "482913"
        ));
    }

    #[test]
    fn cli_parse_invite_approve() {
        let cli = Cli::try_parse_from([
            "tribune", "invite", "approve", "--community", "c1", "--email", "a@x.com", "--otp",
            "111222",
        ])
        .unwrap();
        let Commands::Invite(args) = cli.command else {
            panic!("expected invite");
        };
        match args.command {
            InviteCommand::Approve { target, otp } => {
                assert_eq!(target.community, "c1");
                assert_eq!(target.email, "a@x.com");
                assert_eq!(otp, "111222");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_parse_community_join_decisions() {
        let cli = Cli::try_parse_from([
            "tribune", "community", "approve-join", "--community", "c1", "--user", "u7",
        ])
        .unwrap();
        let Commands::Community(args) = cli.command else {
            panic!("expected community");
        };
        match args.command {
            CommunityCommand::ApproveJoin(target) => {
                assert_eq!(target.community, "c1");
                assert_eq!(target.user, "u7");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["tribune", "community", "reject-join", "--community", "c1"]).is_err());
    }

    #[test]
    fn cli_parse_post_create_defaults_to_public() {
        let cli = Cli::try_parse_from([
            "tribune", "post", "create", "--community", "c1", "--content", "Hello",
        ])
        .unwrap();
        let Commands::Post(args) = cli.command else {
            panic!("expected post");
        };
        match args.command {
            PostCommand::Create {
                community,
                content,
                post_type,
            } => {
                assert_eq!(community, "c1");
                assert_eq!(content, "Hello");
                assert_eq!(post_type, PostTypeArg::Public);
            }
            other => panic!("unexpected {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "tribune", "post", "create", "--community", "c1", "--content", "x", "--type", "event",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Post(PostArgs { command: PostCommand::Create { post_type: PostTypeArg::Event, .. } })
        ));
        assert!(Cli::try_parse_from(["tribune", "post", "like"]).is_err());
    }

    #[test]
    fn cli_parse_missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["tribune"]).is_err());
    }
}

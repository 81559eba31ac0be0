// SPDX-License-Identifier: BUSL-1.1
//! # Wizard Subcommand
//!
//! Interactive onboarding. Fields come from flags; anything the flow asks
//! for afterwards (OTP codes, retry decisions) is read line by line from
//! stdin, so the loop can also be scripted.
//!
//! - `single`: create, issue the domain-email OTP, read codes until one
//!   verifies. `resend` re-issues the code. A blank line or EOF cancels.
//! - `multi`: create, invite every authorized person in order, print the
//!   per-email report. After a failed pass `retry` re-sends the failed and
//!   untouched invites only. A blank line or EOF cancels.
//!
//! Cancelling leaves a created community Pending. `--discard-on-cancel`
//! deletes it instead.

use std::io::{BufRead, Write};

use anyhow::Result;
use clap::{Args, Subcommand};

use tribune_client::{OnboardingApi, OnboardingError, OnboardingWizard};
use tribune_core::{CommunityId, CommunityType, Email, OtpCode};
use tribune_state::{InviteReport, WizardStep};

use crate::console::{Console, EXIT_FAILURE, EXIT_LOGIN_REQUIRED, EXIT_OK};

/// Arguments for the `tribune wizard` subcommand.
#[derive(Args, Debug)]
pub struct WizardArgs {
    #[command(subcommand)]
    pub command: WizardCommand,
}

/// Wizard flavours.
#[derive(Subcommand, Debug)]
pub enum WizardCommand {
    /// Onboard a Single community verified by domain-email OTP.
    Single {
        #[command(flatten)]
        basic: BasicInfoArgs,
        /// Address that receives the verification code.
        #[arg(long)]
        domain_email: String,
    },

    /// Onboard a Multi community approved by authorized persons.
    Multi {
        #[command(flatten)]
        basic: BasicInfoArgs,
        /// Authorized person email. Repeat for each person (at least two).
        #[arg(long = "authorized", required = true)]
        authorized: Vec<String>,
    },
}

/// Step-0 fields shared by both flavours.
#[derive(Args, Debug, Clone)]
pub struct BasicInfoArgs {
    /// Community name.
    #[arg(long)]
    pub name: String,
    /// Free-text description.
    #[arg(long, default_value = "")]
    pub description: String,
    /// Image URL or upload handle.
    #[arg(long, default_value = "")]
    pub image: String,
    /// Delete the community if the wizard is cancelled after creation.
    #[arg(long)]
    pub discard_on_cancel: bool,
}

/// How an interactive run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardRun {
    /// Process exit code.
    pub exit_code: u8,
    /// The community created by this run, when the run did not finish.
    pub orphaned: Option<CommunityId>,
}

impl WizardRun {
    fn done(exit_code: u8) -> Self {
        Self {
            exit_code,
            orphaned: None,
        }
    }
}

/// Execute the wizard subcommand against the console's backend, reading
/// from stdin and writing to stdout.
pub async fn run_wizard(args: &WizardArgs, console: &Console) -> Result<u8> {
    let Some(session) = console.require_admin() else {
        return Ok(EXIT_LOGIN_REQUIRED);
    };
    let mut wizard = OnboardingWizard::new(console.client().clone(), session);

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();

    let (basic, run) = match &args.command {
        WizardCommand::Single {
            basic,
            domain_email,
        } => {
            fill_basic(&mut wizard, basic, CommunityType::Single)?;
            wizard.draft_mut()?.domain_email = domain_email.clone();
            (basic, drive_single(&mut wizard, &mut input, &mut out).await?)
        }
        WizardCommand::Multi { basic, authorized } => {
            fill_basic(&mut wizard, basic, CommunityType::Multi)?;
            wizard.draft_mut()?.authorized_persons = authorized.clone();
            (basic, drive_multi(&mut wizard, &mut input, &mut out).await?)
        }
    };

    if let Some(id) = &run.orphaned {
        if basic.discard_on_cancel {
            discard(console, id, &mut out).await?;
        } else {
            writeln!(
                out,
                "Community {id} was left pending. Remove it with `tribune community discard {id}`."
            )?;
        }
    }
    Ok(run.exit_code)
}

fn fill_basic<A: OnboardingApi>(
    wizard: &mut OnboardingWizard<A>,
    basic: &BasicInfoArgs,
    community_type: CommunityType,
) -> Result<()> {
    let draft = wizard.draft_mut()?;
    draft.name = basic.name.clone();
    draft.description = basic.description.clone();
    draft.image = basic.image.clone();
    draft.community_type = community_type;
    Ok(())
}

async fn discard<W: Write>(console: &Console, id: &CommunityId, out: &mut W) -> Result<()> {
    use tribune_client::DiscardOutcome;

    match console.client().communities().discard_pending(id).await {
        Ok(DiscardOutcome::Deleted) => writeln!(out, "Discarded pending community {id}.")?,
        Ok(DiscardOutcome::KeptActive) => {
            writeln!(out, "Community {id} activated in the meantime and was kept.")?
        }
        Ok(DiscardOutcome::NotFound) => writeln!(out, "Community {id} is already gone.")?,
        Err(e) => {
            tracing::warn!(community_id = %id, error = %e, "discard after cancel failed");
            writeln!(out, "Could not discard community {id}: {}", e.user_message())?;
        }
    }
    Ok(())
}

/// Drive a Single wizard whose draft is filled in.
pub async fn drive_single<A, R, W>(
    wizard: &mut OnboardingWizard<A>,
    input: &mut R,
    out: &mut W,
) -> Result<WizardRun>
where
    A: OnboardingApi,
    R: BufRead,
    W: Write,
{
    if let Some(code) = create(wizard, out).await? {
        return Ok(WizardRun::done(code));
    }
    if let Some(id) = wizard.state().created_community_id() {
        writeln!(out, "Created pending community {id}.")?;
    }

    if let Some(run) = issue_otp(wizard, out).await? {
        return Ok(run);
    }

    loop {
        write!(out, "Verification code (`resend` for a new one, blank to cancel): ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return cancel(wizard, out).await;
        };

        if line.eq_ignore_ascii_case("resend") {
            if let Some(run) = issue_otp(wizard, out).await? {
                return Ok(run);
            }
            continue;
        }

        let typed = wizard.enter_otp(&line)?.len();
        if !wizard.can_verify() {
            writeln!(out, "The code must be exactly 6 digits (got {typed}).")?;
            continue;
        }

        match wizard.verify_otp().await {
            Ok(outcome) => {
                if let Some(id) = &outcome.community_id {
                    writeln!(out, "Community {id} verified and active.")?;
                }
                return Ok(WizardRun::done(EXIT_OK));
            }
            Err(OnboardingError::InvalidOtp { message }) => {
                writeln!(out, "{message}. Try again or type `resend`.")?;
            }
            Err(OnboardingError::Unauthorized) => {
                return abandon(wizard, out, EXIT_LOGIN_REQUIRED).await;
            }
            Err(e) => writeln!(out, "Verification failed: {e}")?,
        }
    }
}

/// Drive a Multi wizard whose draft is filled in.
pub async fn drive_multi<A, R, W>(
    wizard: &mut OnboardingWizard<A>,
    input: &mut R,
    out: &mut W,
) -> Result<WizardRun>
where
    A: OnboardingApi,
    R: BufRead,
    W: Write,
{
    if let Some(code) = create(wizard, out).await? {
        return Ok(WizardRun::done(code));
    }
    if let Some(id) = wizard.state().created_community_id() {
        writeln!(out, "Created pending community {id}.")?;
    }

    let mut result = wizard.send_invites().await;
    loop {
        print_codes(wizard.take_invite_codes(), out)?;
        match result {
            Ok(report) => {
                print_report(&report, out)?;
                writeln!(out, "All invites sent. The community activates at its second approval.")?;
                return Ok(WizardRun::done(EXIT_OK));
            }
            Err(OnboardingError::PartialInviteFailure(report)) => {
                print_report(&report, out)?;
            }
            Err(OnboardingError::NetworkOrServer { message }) => {
                writeln!(out, "No invites were sent: {message}")?;
            }
            Err(OnboardingError::Unauthorized) => {
                return abandon(wizard, out, EXIT_LOGIN_REQUIRED).await;
            }
            Err(e) => {
                writeln!(out, "Invites failed: {e}")?;
                return abandon(wizard, out, EXIT_FAILURE).await;
            }
        }

        loop {
            write!(out, "Type `retry` to resend the failed invites, blank to cancel: ")?;
            out.flush()?;
            match read_line(input)? {
                None => return cancel(wizard, out).await,
                Some(line) if line.eq_ignore_ascii_case("retry") => break,
                Some(_) => continue,
            }
        }
        result = wizard.retry_failed_invites().await;
    }
}

/// Step 0. Returns an exit code when the flow cannot continue.
async fn create<A: OnboardingApi, W: Write>(
    wizard: &mut OnboardingWizard<A>,
    out: &mut W,
) -> Result<Option<u8>> {
    match wizard.submit_basic_info().await {
        Ok(WizardStep::EmailVerification | WizardStep::AuthorizedInvites) => Ok(None),
        Ok(step) => {
            writeln!(out, "Unexpected wizard step {step} after creation.")?;
            Ok(Some(EXIT_FAILURE))
        }
        Err(e @ (OnboardingError::SessionInvalid | OnboardingError::Unauthorized)) => {
            writeln!(out, "{e}. Run `tribune login`.")?;
            Ok(Some(EXIT_LOGIN_REQUIRED))
        }
        Err(OnboardingError::Validation(v)) => {
            writeln!(out, "{v}")?;
            Ok(Some(EXIT_FAILURE))
        }
        Err(e) => {
            writeln!(out, "Could not create the community: {e}")?;
            Ok(Some(EXIT_FAILURE))
        }
    }
}

/// Step 1 issuance. A failure is reported and the operator may `resend`.
async fn issue_otp<A: OnboardingApi, W: Write>(
    wizard: &mut OnboardingWizard<A>,
    out: &mut W,
) -> Result<Option<WizardRun>> {
    match wizard.request_otp().await {
        Ok(Some(code)) => writeln!(out, "Verification code issued: {code}")?,
        Ok(None) => writeln!(out, "Verification code sent to the domain email.")?,
        Err(OnboardingError::Unauthorized) => {
            return abandon(wizard, out, EXIT_LOGIN_REQUIRED).await.map(Some);
        }
        Err(e) => writeln!(out, "Could not issue a code: {e}")?,
    }
    Ok(None)
}

async fn cancel<A: OnboardingApi, W: Write>(
    wizard: &mut OnboardingWizard<A>,
    out: &mut W,
) -> Result<WizardRun> {
    writeln!(out)?;
    writeln!(out, "Cancelled.")?;
    abandon(wizard, out, EXIT_FAILURE).await
}

async fn abandon<A: OnboardingApi, W: Write>(
    wizard: &mut OnboardingWizard<A>,
    out: &mut W,
    exit_code: u8,
) -> Result<WizardRun> {
    if exit_code == EXIT_LOGIN_REQUIRED {
        writeln!(out, "Session expired. Run `tribune login`.")?;
    }
    let outcome = wizard.close().await;
    wizard.take_invite_codes();
    Ok(WizardRun {
        exit_code,
        orphaned: outcome.orphaned().cloned(),
    })
}

fn print_report<W: Write>(report: &InviteReport, out: &mut W) -> Result<()> {
    for email in &report.issued {
        writeln!(out, "  sent        {email}")?;
    }
    for failed in &report.failed {
        writeln!(out, "  failed      {}: {}", failed.email, failed.reason)?;
    }
    for email in &report.not_attempted {
        writeln!(out, "  not sent    {email}")?;
    }
    Ok(())
}

fn print_codes<W: Write>(codes: Vec<(Email, OtpCode)>, out: &mut W) -> Result<()> {
    for (email, code) in codes {
        writeln!(out, "Invite code for {email}: {code}")?;
    }
    Ok(())
}

/// Next trimmed line, or `None` on EOF or a blank line.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}

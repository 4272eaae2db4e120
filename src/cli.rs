//! Command line front end over the view models.

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use guidebook::guides::{category_label, Audience, Guide, Mobility, NewGuide, Season};
use guidebook::invitations::NewInvitation;
use guidebook::users::NewUser;
use guidebook::views::{AdminView, LoginForm};
use guidebook::AppState;

#[derive(Debug, Parser)]
#[command(
    name = "guidebook",
    about = "Browse and administer travel guides on a guide backend",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and keep the session on disk.
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show who is logged in.
    Status,
    /// Trade the refresh token for a new access token.
    Refresh,
    /// List guides.
    Guides,
    /// Show one guide with its activities by day.
    Guide { id: u64 },
    /// Accept an invitation addressed to you.
    Accept { invitation: u64 },
    /// Admin console; requires an admin account.
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    Users,
    Guides,
    Invitations,
    CreateUser {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
        /// Create an administrator.
        #[arg(long)]
        staff: bool,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    DeleteUser { id: u64 },
    CreateGuide {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long, value_parser = choice::<Mobility>)]
        mobility: Option<Mobility>,
        #[arg(long, value_parser = choice::<Season>)]
        season: Option<Season>,
        #[arg(long, value_parser = choice::<Audience>)]
        audience: Option<Audience>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        price: Option<f64>,
    },
    RenameGuide { id: u64, name: String },
    DeleteGuide { id: u64 },
    /// Invite a user by id or by email to a guide.
    Invite {
        guide: u64,
        #[arg(long, conflicts_with = "email")]
        user: Option<u64>,
        #[arg(long)]
        email: Option<String>,
    },
    DeleteInvitation { id: u64 },
}

/// Accepts the lowercase wire names of an enum and nothing else.
fn choice<T: DeserializeOwned + Serialize>(raw: &str) -> Result<T, String> {
    let wanted = raw.trim().to_lowercase();
    let value: T = serde_json::from_value(serde_json::Value::String(wanted.clone()))
        .map_err(|e| e.to_string())?;
    match serde_json::to_value(&value) {
        Ok(serde_json::Value::String(name)) if name == wanted && name != "unknown" => Ok(value),
        _ => Err(format!("unsupported value {raw:?}")),
    }
}

/// Runs one command, writing its report to `out`. `Ok(false)` means the
/// command was refused or failed on the backend.
pub async fn run(cli: Cli, state: &AppState, out: &mut impl Write) -> anyhow::Result<bool> {
    match cli.command {
        Command::Login { username, password } => {
            let mut home = state.home_view();
            if !home.submit(&LoginForm::new(username, password)).await {
                writeln!(out, "login failed: {}", home.login_error.unwrap_or_default())?;
                return Ok(false);
            }
            let role = if home.is_admin() { "admin" } else { "user" };
            writeln!(out, "logged in as {} ({role})", home.username().unwrap_or_default())?;
            Ok(true)
        }
        Command::Logout => {
            state.home_view().logout();
            writeln!(out, "logged out")?;
            Ok(true)
        }
        Command::Status => {
            if state.auth.is_authenticated() {
                let role = if state.auth.is_admin() { "admin" } else { "user" };
                let who = state.auth.current_username().unwrap_or_else(|| "?".into());
                writeln!(out, "logged in as {who} ({role})")?;
            } else {
                writeln!(out, "not logged in")?;
            }
            Ok(true)
        }
        Command::Refresh => match state.auth.refresh_access_token().await {
            Ok(()) => {
                writeln!(out, "access token refreshed")?;
                Ok(true)
            }
            Err(e) => {
                writeln!(out, "refresh failed: {}", e.user_message())?;
                Ok(false)
            }
        },
        Command::Guides => {
            let mut home = state.home_view();
            home.init().await;
            if !home.connected {
                writeln!(out, "not logged in")?;
                return Ok(false);
            }
            if let Some(error) = home.guides_error {
                writeln!(out, "could not load guides: {error}")?;
                return Ok(false);
            }
            print_guides(out, &home.guides)?;
            Ok(true)
        }
        Command::Guide { id } => {
            let mut detail = state.guide_detail_view();
            detail.load(id).await;
            let Some(guide) = &detail.guide else {
                writeln!(out, "{}", detail.error.unwrap_or_default())?;
                return Ok(false);
            };
            writeln!(out, "{}", guide.display_name())?;
            if let Some(description) = guide.description.as_deref().filter(|d| !d.is_empty()) {
                writeln!(out, "{description}")?;
            }
            for day in detail.days() {
                writeln!(out, "Day {day}")?;
                for activity in detail.activities_on(day) {
                    writeln!(
                        out,
                        "  {}. {} [{}]",
                        activity.order,
                        activity.display_name(),
                        category_label(activity.category.as_deref())
                    )?;
                }
            }
            Ok(true)
        }
        Command::Accept { invitation } => match state.invitations.accept(invitation).await {
            Ok(outcome) => {
                let status = outcome.status.unwrap_or_else(|| "accepted".into());
                writeln!(out, "invitation {invitation}: {status}")?;
                Ok(true)
            }
            Err(e) => {
                writeln!(out, "could not accept invitation: {}", e.user_message())?;
                Ok(false)
            }
        },
        Command::Admin(command) => run_admin(command, state, out).await,
    }
}

async fn run_admin(
    command: AdminCommand,
    state: &AppState,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let mut admin = state.admin_view();
    if !admin.open().await.is_allowed() {
        writeln!(out, "access denied: an admin account is required")?;
        return Ok(false);
    }
    info!(user = ?admin.current_username(), ?command, "admin command");

    let done = match command {
        AdminCommand::Users => {
            for user in &admin.users {
                writeln!(out, "{}\t{}\t{}\t{}", user.id, user.username, user.email, user.role())?;
            }
            true
        }
        AdminCommand::Guides => {
            print_guides(out, &admin.guides)?;
            true
        }
        AdminCommand::Invitations => {
            for invitation in &admin.invitations {
                let guide = invitation
                    .guide
                    .map(|id| admin.guide_name(id))
                    .unwrap_or_default();
                let invitee = match (invitation.invited_user, &invitation.invited_email) {
                    (Some(id), _) => admin.user_name(id),
                    (None, Some(email)) => email.clone(),
                    (None, None) => String::new(),
                };
                writeln!(out, "{}\t{guide}\t{invitee}", invitation.id)?;
            }
            true
        }
        AdminCommand::CreateUser {
            username,
            email,
            password,
            staff,
            first_name,
            last_name,
        } => {
            let user = NewUser {
                username,
                email,
                password,
                first_name,
                last_name,
                is_staff: staff,
            };
            admin.create_user(&user).await
        }
        AdminCommand::DeleteUser { id } => admin.delete_user(id).await,
        AdminCommand::CreateGuide {
            title,
            description,
            city,
            days,
            mobility,
            season,
            audience,
            category,
            price,
        } => {
            let guide = NewGuide {
                description,
                city,
                days,
                mobility,
                season,
                audience,
                category,
                price,
                ..NewGuide::titled(title)
            };
            admin.create_guide(&guide).await
        }
        AdminCommand::RenameGuide { id, name } => {
            let renamed = admin.rename_guide(id, &name).await;
            if !renamed && admin.notice().is_none() {
                writeln!(out, "name unchanged, nothing sent")?;
            }
            renamed
        }
        AdminCommand::DeleteGuide { id } => admin.delete_guide(id).await,
        AdminCommand::Invite { guide, user, email } => {
            let invitation = NewInvitation {
                guide,
                invited_user: user,
                invited_email: email,
            };
            admin.create_invitation(&invitation).await
        }
        AdminCommand::DeleteInvitation { id } => admin.delete_invitation(id).await,
    };

    print_notice(out, &admin)?;
    Ok(done)
}

fn print_guides(out: &mut impl Write, guides: &[Guide]) -> anyhow::Result<()> {
    if guides.is_empty() {
        writeln!(out, "no guides")?;
    }
    for guide in guides {
        let days = guide.days.map(|d| d.to_string()).unwrap_or_default();
        writeln!(out, "{}\t{}\t{days}", guide.id, guide.display_name())?;
    }
    Ok(())
}

fn print_notice(out: &mut impl Write, admin: &AdminView) -> anyhow::Result<()> {
    if let Some(notice) = admin.notice() {
        writeln!(out, "{}", notice.text)?;
    }
    Ok(())
}

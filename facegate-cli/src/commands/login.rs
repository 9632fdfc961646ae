//! Login command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use facegate_core::{Phase, SessionSnapshot};
use tracing::info;

use crate::utils::CliSession;

/// Execute the login command.
pub async fn execute(
    user: String,
    frames: PathBuf,
    quality: u8,
    api_url: Option<String>,
    quiet: bool,
) -> Result<()> {
    let session = CliSession::start(&frames, quality, api_url)?;
    info!(user = %user, frames = %frames.display(), "Starting login");

    let result = login(&session, &user, quiet).await;
    session.close().await?;
    let unlocked = result?;

    if !quiet {
        let identity = unlocked
            .identity
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or(user);

        println!();
        println!("{}", "╔════════════════════════════════════════╗".green());
        println!(
            "{}",
            "║               UNLOCKED                 ║".green().bold()
        );
        println!("{}", "╚════════════════════════════════════════╝".green());
        println!();
        println!("   {} {}", "User ID:".dimmed(), identity);
        if let Some(similarity) = unlocked.similarity {
            println!(
                "   {} {:.1}%",
                "Similarity:".dimmed(),
                similarity * 100.0
            );
        }
    }

    Ok(())
}

async fn login(session: &CliSession, user: &str, quiet: bool) -> Result<SessionSnapshot> {
    let handle = &session.handle;
    handle.choose_login()?;
    handle.set_identity(user)?;
    handle.submit()?;

    session
        .wait(|s| !matches!(s.phase, Phase::Choice | Phase::LoginInput))
        .await?;
    if !quiet {
        println!("   {}", "Scanning face...".dimmed());
    }

    session
        .wait(|s| s.phase == Phase::LoginResult { matched: true } || s.authenticated)
        .await?;
    if !quiet {
        println!("   {}", "Face matched, unlocking...".dimmed());
    }

    let unlocked = session.wait(|s| s.authenticated).await?;
    let signal = handle.auth_signal().borrow().clone();
    info!(
        identity = ?signal.identity.as_ref().map(|id| id.as_str()),
        "Unlocked"
    );
    Ok(unlocked)
}

//! Enroll command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use facegate_core::{Phase, SessionSnapshot, ENROLL_IMAGE_COUNT};
use tracing::info;

use crate::utils::CliSession;

/// Images captured so far in the running enrollment.
fn captured(snapshot: &SessionSnapshot) -> usize {
    match snapshot.phase {
        Phase::EnrollCamera { captured } => captured,
        Phase::EnrollSubmitting | Phase::EnrollSuccess => ENROLL_IMAGE_COUNT,
        _ => 0,
    }
}

/// Execute the enroll command.
pub async fn execute(
    user: String,
    frames: PathBuf,
    quality: u8,
    api_url: Option<String>,
    quiet: bool,
) -> Result<()> {
    let session = CliSession::start(&frames, quality, api_url)?;
    info!(user = %user, frames = %frames.display(), "Starting enrollment");

    let result = enroll(&session, &user, quiet).await;
    let service_url = session.service_url.clone();
    session.close().await?;
    let done = result?;

    if !quiet {
        let identity = done
            .identity
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or(user);

        println!();
        println!("{}", "Face enrolled!".green().bold());
        println!();
        println!("   {} {}", "User ID:".dimmed(), identity);
        println!("   {} {}", "Images:".dimmed(), ENROLL_IMAGE_COUNT);
        println!("   {} {}", "Service:".dimmed(), service_url);
        println!();
        println!(
            "   {}",
            format!("Log in with: facegate login --user {identity} --frames <DIR>").dimmed()
        );
    }

    Ok(())
}

async fn enroll(session: &CliSession, user: &str, quiet: bool) -> Result<SessionSnapshot> {
    let handle = &session.handle;
    handle.choose_enroll()?;
    handle.set_identity(user)?;
    handle.submit()?;

    session
        .wait(|s| matches!(s.phase, Phase::EnrollCamera { .. }))
        .await?;

    for n in 1..=ENROLL_IMAGE_COUNT {
        handle.capture()?;
        session.wait(|s| captured(s) >= n).await?;
        if !quiet {
            println!(
                "   {} {}/{}",
                "Captured image".dimmed(),
                n,
                ENROLL_IMAGE_COUNT
            );
        }
    }

    if !quiet {
        println!("   {}", "Submitting enrollment...".dimmed());
    }
    session.wait(|s| s.phase == Phase::EnrollSuccess).await
}

//! Session management CLI commands: list, show, delete.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use waypost_core::session::repository::SessionRepository;
use waypost_types::error::RepositoryError;
use waypost_types::session::UserSession;

use crate::state::AppState;

/// JSON view of a session with the raw token elided.
fn session_json(session: &UserSession) -> serde_json::Value {
    serde_json::json!({
        "identity": session.identity,
        "has_token": session.access_token.is_some(),
        "conversation_id": session.conversation_id,
        "token_refreshed_at": session.token_refreshed_at,
        "created_at": session.created_at,
        "updated_at": session.updated_at,
    })
}

/// List sessions with identity, conversation, and refresh information.
///
/// # Examples
///
/// ```bash
/// wpost sessions list
/// wpost sessions list --limit 20 --json
/// ```
pub async fn list_sessions(state: &AppState, limit: Option<i64>, json: bool) -> Result<()> {
    let sessions = state.sessions.list(limit).await?;

    if json {
        let views: Vec<_> = sessions.iter().map(session_json).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. They appear after the first inbound message.",
            style("i").blue().bold()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Identity").fg(Color::White),
        Cell::new("Conversation").fg(Color::White),
        Cell::new("Token").fg(Color::White),
        Cell::new("Refreshed").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for session in &sessions {
        let conversation = session
            .conversation_id
            .as_deref()
            .unwrap_or("(none)")
            .to_string();

        let token_cell = if session.access_token.is_some() {
            Cell::new("present").fg(Color::Green)
        } else {
            Cell::new("absent").fg(Color::Red)
        };

        let refreshed = session
            .token_refreshed_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        table.add_row(vec![
            Cell::new(&session.identity).fg(Color::Cyan),
            Cell::new(conversation).fg(Color::White),
            token_cell,
            Cell::new(refreshed).fg(Color::DarkGrey),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string())
                .fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one session by identity.
pub async fn show_session(state: &AppState, identity: &str, json: bool) -> Result<()> {
    let session = state
        .sessions
        .find_by_identity(identity)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No session for '{identity}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session_json(&session))?);
        return Ok(());
    }

    println!();
    println!("  Session for {}", style(&session.identity).cyan().bold());
    println!();
    println!(
        "  Token:        {}",
        if session.access_token.is_some() {
            style("present").green()
        } else {
            style("absent").red()
        }
    );
    println!(
        "  Conversation: {}",
        session.conversation_id.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Refreshed:    {}",
        session
            .token_refreshed_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    );
    println!("  Created:      {}", session.created_at.to_rfc3339());
    println!("  Updated:      {}", session.updated_at.to_rfc3339());
    println!();

    Ok(())
}

/// Delete a session by identity.
pub async fn delete_session(
    state: &AppState,
    identity: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    if !force {
        anyhow::bail!(
            "Deleting a session discards its token and conversation context. \
             Re-run with --force to proceed."
        );
    }

    match state.sessions.delete_by_identity(identity).await {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => {
            anyhow::bail!("No session for '{identity}'");
        }
        Err(err) => return Err(err.into()),
    }

    if json {
        println!(
            "{}",
            serde_json::json!({ "identity": identity, "deleted": true })
        );
    } else {
        println!();
        println!(
            "  {} Session '{}' deleted.",
            style("✓").green(),
            style(identity).cyan()
        );
        println!();
    }

    Ok(())
}

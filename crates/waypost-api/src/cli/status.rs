//! Relay status command.

use anyhow::Result;
use console::style;

use waypost_core::session::repository::SessionRepository;

use crate::state::AppState;

/// Print data directory, database, client mode, and session count.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let session_count = state.sessions.count().await?;
    let db_path = state.data_dir.join("waypost.db");

    if json {
        let status = serde_json::json!({
            "data_dir": state.data_dir,
            "database": db_path,
            "mode": state.config.mode.to_string(),
            "base_url": state.config.base_url,
            "sessions": session_count,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} Waypost status", style("🛰").bold());
    println!();
    println!("  Data dir:  {}", style(state.data_dir.display()).cyan());
    println!("  Database:  {}", style(db_path.display()).cyan());
    println!("  Mode:      {}", style(&state.config.mode).yellow());
    println!("  Base URL:  {}", style(&state.config.base_url).cyan());
    println!(
        "  Sessions:  {}",
        style(session_count).bold()
    );
    println!();

    Ok(())
}

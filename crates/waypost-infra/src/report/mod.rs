//! Tabular report materialization.
//!
//! When an answer carries a table, the webhook flow writes it out as a
//! standalone HTML document under `{data_dir}/reports/` and sends the
//! public link instead of squeezing the table into chat text. Reports are
//! short-lived: a periodic sweep removes files older than the configured
//! TTL, since the provider fetches the media within seconds of the send.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use waypost_types::answer::TableBlock;
use waypost_types::error::ReportError;

/// A materialized report file and its public URL.
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub file_name: String,
    pub public_url: String,
}

/// Writes report files and builds their public URLs.
pub struct ReportStore {
    dir: PathBuf,
    base_url: String,
}

impl ReportStore {
    /// Create a store rooted at `{data_dir}/reports`.
    pub fn new(data_dir: &Path, base_url: &str) -> Self {
        Self {
            dir: data_dir.join("reports"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory report files are written to (served under `/reports`).
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Materialize a table as an HTML document and return its link.
    pub async fn write_table(&self, table: &TableBlock) -> Result<StoredReport, ReportError> {
        if table.headers.is_empty() && table.rows.is_empty() {
            return Err(ReportError::EmptyTable);
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = format!("report_{}.html", Uuid::now_v7());
        tokio::fs::write(self.dir.join(&file_name), render_table_html(table)).await?;

        let public_url = format!("{}/reports/{file_name}", self.base_url);
        Ok(StoredReport {
            file_name,
            public_url,
        })
    }

    /// Delete report files older than `ttl`. Returns how many were removed.
    pub async fn prune_older_than(&self, ttl: Duration) -> std::io::Result<usize> {
        let mut removed = 0;

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err),
        };

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(_) => continue,
            };
            if !metadata.is_file() {
                continue;
            }
            let age = metadata
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .unwrap_or_default();
            if age >= ttl && tokio::fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

/// Periodic cleanup sweep, cancelled on shutdown.
pub async fn run_cleanup(
    store: Arc<ReportStore>,
    period: Duration,
    ttl: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    // The immediate first tick doubles as a startup sweep of leftovers.
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match store.prune_older_than(ttl).await {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "pruned expired report files"),
                    Err(err) => warn!(error = %err, "report cleanup sweep failed"),
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}

fn render_table_html(table: &TableBlock) -> String {
    let title = table.title.as_deref().unwrap_or("Report");

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(title)));
    html.push_str(
        "<style>\n\
         body { font-family: sans-serif; margin: 2rem; }\n\
         table { border-collapse: collapse; width: 100%; }\n\
         th, td { border: 1px solid #ccc; padding: 0.4rem 0.8rem; text-align: left; }\n\
         th { background: #f2f2f2; }\n\
         tr:nth-child(even) { background: #fafafa; }\n\
         </style>\n</head>\n<body>\n",
    );
    html.push_str(&format!("<h1>{}</h1>\n<table>\n", escape(title)));

    if !table.headers.is_empty() {
        html.push_str("<thead><tr>");
        for header in &table.headers {
            html.push_str(&format!("<th>{}</th>", escape(header)));
        }
        html.push_str("</tr></thead>\n");
    }

    html.push_str("<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            let text = match cell {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            html.push_str(&format!("<td>{}</td>", escape(&text)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");

    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TableBlock {
        TableBlock {
            title: Some("Top <SKUs>".to_string()),
            headers: vec!["sku".to_string(), "units".to_string()],
            rows: vec![
                vec![serde_json::json!("A-1"), serde_json::json!(40)],
                vec![serde_json::json!("B-2"), serde_json::json!(12)],
            ],
        }
    }

    #[tokio::test]
    async fn write_table_produces_linked_html() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path(), "https://relay.example.com/");

        let report = store.write_table(&sample_table()).await.unwrap();
        assert!(report.file_name.starts_with("report_"));
        assert_eq!(
            report.public_url,
            format!("https://relay.example.com/reports/{}", report.file_name)
        );

        let html = tokio::fs::read_to_string(store.dir().join(&report.file_name))
            .await
            .unwrap();
        assert!(html.contains("<th>sku</th>"));
        assert!(html.contains("<td>40</td>"));
        // Title is escaped
        assert!(html.contains("Top &lt;SKUs&gt;"));
    }

    #[tokio::test]
    async fn empty_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path(), "http://localhost:3000");

        let err = store.write_table(&TableBlock::default()).await.unwrap_err();
        assert!(matches!(err, ReportError::EmptyTable));
    }

    #[tokio::test]
    async fn prune_removes_only_aged_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path(), "http://localhost:3000");
        store.write_table(&sample_table()).await.unwrap();
        store.write_table(&sample_table()).await.unwrap();

        // Nothing is older than an hour yet.
        assert_eq!(store.prune_older_than(Duration::from_secs(3600)).await.unwrap(), 0);
        // A zero TTL removes everything.
        assert_eq!(store.prune_older_than(Duration::ZERO).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn prune_on_missing_directory_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path(), "http://localhost:3000");
        assert_eq!(store.prune_older_than(Duration::ZERO).await.unwrap(), 0);
    }
}

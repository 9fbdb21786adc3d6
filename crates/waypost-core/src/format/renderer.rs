//! Converts a structured [`AiAnswer`] into WhatsApp-friendly text.
//!
//! Both payload shapes (block-structured and legacy flat) render through
//! the same path. Output is bounded: at most 5 metrics, 3 table rows per
//! table, and 5 chart points make it into a message; the rest is
//! summarized with a remainder marker.

use waypost_types::answer::{AiAnswer, AnswerBlock, ChartBlock, Metric, TableBlock};

/// Divider between rendered sections (and before the suggestions block).
pub const SECTION_DIVIDER: &str = "\n\n────────────────\n\n";

const MAX_METRICS: usize = 5;
const MAX_TABLE_ROWS: usize = 3;
const MAX_CHART_POINTS: usize = 5;
const CHART_BAR_CELLS: usize = 10;

/// A rendered reply: the message body plus any suggested follow-ups the
/// caller may send as a separate message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReply {
    pub body: String,
    pub suggestions: Vec<String>,
}

/// Rendering switches.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Skip table sections (used when the tables ship as a report link).
    pub omit_tables: bool,
}

/// Render an answer into a chat reply.
pub fn render_reply(answer: &AiAnswer, options: &RenderOptions) -> RenderedReply {
    let mut metrics: Vec<&Metric> = Vec::new();
    let mut tables: Vec<&TableBlock> = Vec::new();
    let mut charts: Vec<&ChartBlock> = Vec::new();
    let mut summary: Option<&str> = None;
    let mut suggestions: Vec<String> = Vec::new();

    if let Some(body) = &answer.answer {
        summary = body.summary.as_deref();
        for block in &body.blocks {
            match block {
                AnswerBlock::Metrics { metrics: m } => metrics.extend(m.iter()),
                AnswerBlock::Table(table) => tables.push(table),
                AnswerBlock::Chart(chart) => charts.push(chart),
                AnswerBlock::Suggestions { items } => suggestions.extend(items.iter().cloned()),
                AnswerBlock::Unknown => {}
            }
        }
    } else {
        metrics.extend(answer.metrics.iter());
        tables.extend(answer.tables.iter());
        charts.extend(answer.charts.iter());
        summary = answer.text.as_deref();
        suggestions.extend(answer.suggestions.iter().cloned());
    }

    let mut sections: Vec<String> = Vec::new();

    if !metrics.is_empty() {
        sections.push(render_metrics(&metrics));
    }

    if !options.omit_tables {
        for (index, table) in tables.iter().enumerate() {
            sections.push(render_table(table, index));
        }
    }

    for (index, chart) in charts.iter().enumerate() {
        sections.push(render_chart(chart, index));
    }

    if let Some(summary) = summary.map(str::trim).filter(|s| !s.is_empty()) {
        sections.push(format!("*📝 Overview:*\n{summary}"));
    }

    let body = if sections.is_empty() {
        "No data available.".to_string()
    } else {
        sections.join(SECTION_DIVIDER)
    };

    RenderedReply { body, suggestions }
}

/// Format suggested follow-up questions as a numbered block, or `None`
/// when there are none.
pub fn suggestions_section(suggestions: &[String]) -> Option<String> {
    if suggestions.is_empty() {
        return None;
    }

    let numbered = suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("*{}.* {s}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    Some(format!(
        "*💡 Suggested Questions:*\n_Reply with key words or number:_\n\n{numbered}"
    ))
}

fn render_metrics(metrics: &[&Metric]) -> String {
    let lines = metrics
        .iter()
        .take(MAX_METRICS)
        .map(|m| format!("*{}:* {}", m.display_label(), display_value(&m.value)))
        .collect::<Vec<_>>()
        .join("\n");
    format!("*📊 Key Metrics:*\n{lines}")
}

fn render_table(table: &TableBlock, index: usize) -> String {
    let mut out = match &table.title {
        Some(title) => format!("*📋 Table {}: {title}*", index + 1),
        None => format!("*📋 Table {}*", index + 1),
    };

    if !table.headers.is_empty() {
        out.push_str(&format!("\n_{}_", table.headers.join(" | ")));
    }

    for row in table.rows.iter().take(MAX_TABLE_ROWS) {
        let cells = row.iter().map(display_value).collect::<Vec<_>>().join(" | ");
        out.push_str(&format!("\n{cells}"));
    }
    if table.rows.len() > MAX_TABLE_ROWS {
        out.push_str(&format!("\n_(+{} more rows)_", table.rows.len() - MAX_TABLE_ROWS));
    }

    out
}

fn render_chart(chart: &ChartBlock, index: usize) -> String {
    let mut out = match &chart.title {
        Some(title) => format!("*📈 Chart {}: {title}*", index + 1),
        None => format!("*📈 Chart {}*", index + 1),
    };

    if !chart.data.is_empty() {
        out.push('\n');
        let max = chart
            .data
            .iter()
            .map(|p| numeric_value(&p.value))
            .fold(0.0_f64, f64::max);

        for point in chart.data.iter().take(MAX_CHART_POINTS) {
            let value = numeric_value(&point.value);
            let filled = if max > 0.0 {
                ((value / max) * CHART_BAR_CELLS as f64).round() as usize
            } else {
                0
            };
            let filled = filled.min(CHART_BAR_CELLS);
            let bar = "█".repeat(filled) + &"░".repeat(CHART_BAR_CELLS - filled);
            out.push_str(&format!("{}: {bar} ({})\n", point.label, display_value(&point.value)));
        }
    }

    if let Some(trend) = chart.trend_summary.as_deref().or(chart.description.as_deref()) {
        out.push_str(&format!("_Trend: {trend}_"));
    }

    out
}

/// Value rendering: bare strings print without JSON quotes.
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric_value(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

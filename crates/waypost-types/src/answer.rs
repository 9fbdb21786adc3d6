//! AI backend answer payload.
//!
//! The backend answers in one of two shapes: a block-structured format
//! (`answer.blocks`, each block tagged by `type`) or an older flat format
//! with top-level `text`/`metrics`/`tables`/`charts`/`suggestions` fields.
//! Both are modeled here; the renderer in waypost-core treats them
//! uniformly. Unknown block types deserialize to [`AnswerBlock::Unknown`]
//! and are skipped.

use serde::{Deserialize, Serialize};

/// Structured answer returned by the AI backend for one question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiAnswer {
    /// Dialogue handle for follow-up questions. The relay persists this
    /// when it is present and differs from the stored one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Block-structured answer body (current format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerBody>,

    // Legacy flat format fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ChartBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl AiAnswer {
    /// First table in the payload, regardless of which format carried it.
    /// Used to decide whether a reply ships a rendered report.
    pub fn first_table(&self) -> Option<&TableBlock> {
        if let Some(table) = self.tables.first() {
            return Some(table);
        }
        self.answer.as_ref()?.blocks.iter().find_map(|block| match block {
            AnswerBlock::Table(table) => Some(table),
            _ => None,
        })
    }
}

/// Block-structured answer body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<AnswerBlock>,
}

/// One tagged content block within an answer body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerBlock {
    Metrics {
        #[serde(default)]
        metrics: Vec<Metric>,
    },
    Table(TableBlock),
    Chart(ChartBlock),
    Suggestions {
        #[serde(default)]
        items: Vec<String>,
    },
    /// Block types this relay does not know how to render.
    #[serde(other)]
    Unknown,
}

/// A single key metric (label/value pair).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metric {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Metric {
    /// Display label, preferring `label` over `name`.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("metric")
    }
}

/// Tabular data block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Chart data block, rendered as ASCII bars in chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<ChartPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One labelled data point in a chart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

use std::fmt;

use serde_json::{Map, Value};

/// One backend-supplied row, kept as the raw JSON object.
pub type Row = Map<String, Value>;

/// Field name rendered as the 1-based row position when the row lacks it.
const INDEX_FIELD: &str = "index";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrioritizationKind {
    HundredDollar,
    Wsjf,
    Moscow,
    Kano,
    Ahp,
}

impl PrioritizationKind {
    pub const ALL: [PrioritizationKind; 5] = [
        PrioritizationKind::HundredDollar,
        PrioritizationKind::Wsjf,
        PrioritizationKind::Moscow,
        PrioritizationKind::Kano,
        PrioritizationKind::Ahp,
    ];

    /// Case-insensitive lookup; the backend upper-cases tags, the UI sends `100_Dollar`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "100_DOLLAR" => Some(Self::HundredDollar),
            "WSJF" => Some(Self::Wsjf),
            "MOSCOW" => Some(Self::Moscow),
            "KANO" => Some(Self::Kano),
            "AHP" => Some(Self::Ahp),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::HundredDollar => "100_DOLLAR",
            Self::Wsjf => "WSJF",
            Self::Moscow => "MOSCOW",
            Self::Kano => "KANO",
            Self::Ahp => "AHP",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::HundredDollar => HUNDRED_DOLLAR_COLUMNS,
            Self::Wsjf => WSJF_COLUMNS,
            Self::Moscow => MOSCOW_COLUMNS,
            Self::Kano => KANO_COLUMNS,
            Self::Ahp => AHP_COLUMNS,
        }
    }
}

impl fmt::Display for PrioritizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: &'static str,
    pub title: &'static str,
}

const fn col(field: &'static str, title: &'static str) -> Column {
    Column { field, title }
}

pub const STORY_COLUMNS: &[Column] = &[
    col("index", "No"),
    col("epic", "Epic"),
    col("user_story", "User Stories"),
    col("description", "Description"),
    col("status", "Status"),
];

pub const COMPLIANCE_COLUMNS: &[Column] = &[
    col("index", "No"),
    col("epic", "Epic"),
    col("user_story", "User Stories"),
    col("description", "Description"),
    col("status", "Status"),
    col("compliance", "Compliance"),
    col("issues", "Issues"),
];

const HUNDRED_DOLLAR_COLUMNS: &[Column] = &[
    col("epic", "Epic"),
    col("user_story", "User Story"),
    col("description", "Description"),
    col("number", "Number"),
    col("status", "Status"),
    col("key", "Key"),
    col("dollar_allocation", "Dollar Allocation"),
];

const WSJF_COLUMNS: &[Column] = &[
    col("epic", "Epic"),
    col("user_story", "User Story"),
    col("description", "Description"),
    col("bv", "Business Value (BV)"),
    col("tc", "Time Criticality (TC)"),
    col("oe", "Risk Reduction/Opportunity Enablement (RR/OE)"),
    col("js", "Job Size (JS)"),
    col("wsjf_score", "WSJF Score"),
];

const MOSCOW_COLUMNS: &[Column] = &[
    col("index", "No"),
    col("epic", "Epic"),
    col("user_story", "User Stories"),
    col("description", "Description"),
    col("status", "Status"),
    col("moscow_category", "MoSCoW Priority"),
];

const KANO_COLUMNS: &[Column] = &[
    col("index", "No"),
    col("epic", "Epic"),
    col("user_story", "User Stories"),
    col("description", "Description"),
    col("status", "Status"),
    col("kano_category", "KANO Category"),
];

const AHP_COLUMNS: &[Column] = &[
    col("epic", "Epic"),
    col("user_story", "User Story"),
    col("description", "Description"),
    col("BV", "Business Value (BV)"),
    col("ER", "Effort Required (ER)"),
    col("D", "Dependencies (D)"),
    col("W", "Weight (W)"),
    col("OS", "Overall Score (OS)"),
];

/// Rendering schema for a raw prioritization tag; unknown tags get no columns.
pub fn schema_for(kind: &str) -> &'static [Column] {
    PrioritizationKind::parse(kind)
        .map(PrioritizationKind::columns)
        .unwrap_or(&[])
}

/// Terminal payload of a run. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub rows: Vec<Row>,
    pub kind: String,
}

impl ResultTable {
    pub fn schema(&self) -> &'static [Column] {
        schema_for(&self.kind)
    }
}

/// A story row with the display key the core assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryRow {
    pub key: usize,
    pub fields: Row,
}

impl StoryRow {
    /// Row as sent back to the backend, carrying its display key.
    pub fn to_wire(&self) -> Row {
        let mut row = self.fields.clone();
        row.insert("key".to_string(), Value::from(self.key));
        row
    }
}

/// Keys are the sequential position; backend-supplied keys are overwritten.
pub fn assign_display_keys(rows: Vec<Row>) -> Vec<StoryRow> {
    rows.into_iter()
        .enumerate()
        .map(|(key, fields)| StoryRow { key, fields })
        .collect()
}

pub fn cell_text(row: &Row, position: usize, field: &str) -> String {
    match row.get(field) {
        Some(value) => value_text(value),
        None if field == INDEX_FIELD => (position + 1).to_string(),
        None => String::new(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

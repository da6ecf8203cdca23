//! Renderable description of one page.
//!
//! A [`View`] is what `render` returns for every event. It is plain data:
//! the HTTP server serialises it as JSON or turns it into HTML.

use serde::Serialize;
use serde_json::Value;

use crate::dashboard::table::{display_value, numeric_value, Table};

/// Title shown at the top of every page.
pub const DASHBOARD_TITLE: &str =
    "Analytics Dashboard of World Population Dataset EDA & MAP VISUALIZATION";

/// A whole page: sidebar plus main column.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub title: String,
    pub sidebar: Vec<Block>,
    pub blocks: Vec<Block>,
}

impl View {
    pub fn new(sidebar: Vec<Block>, blocks: Vec<Block>) -> Self {
        Self {
            title: DASHBOARD_TITLE.to_string(),
            sidebar,
            blocks,
        }
    }

    /// Every block of the page, sidebar first, expanders flattened.
    pub fn all_blocks(&self) -> Vec<&Block> {
        fn walk<'a>(blocks: &'a [Block], out: &mut Vec<&'a Block>) {
            for block in blocks {
                out.push(block);
                if let Block::Expander { blocks, .. } = block {
                    walk(blocks, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.sidebar, &mut out);
        walk(&self.blocks, &mut out);
        out
    }

    /// Messages of the given level, in page order.
    pub fn messages(&self, level: MessageLevel) -> Vec<&str> {
        self.all_blocks()
            .into_iter()
            .filter_map(|b| match b {
                Block::Message { level: l, text } if *l == level => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Tables shown on the page, in page order.
    pub fn tables(&self) -> Vec<&Table> {
        self.all_blocks()
            .into_iter()
            .filter_map(|b| match b {
                Block::Table { table, .. } => Some(table),
                _ => None,
            })
            .collect()
    }

    /// Forms on the page, in page order.
    pub fn forms(&self) -> Vec<&Form> {
        self.all_blocks()
            .into_iter()
            .filter_map(|b| match b {
                Block::Form(form) => Some(form),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Info,
    Success,
    Error,
}

/// One element of a page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: String },
    Subheader { text: String },
    Text { text: String },
    Divider,
    Message { level: MessageLevel, text: String },
    Metrics { cards: Vec<MetricCard> },
    Table { table: Table },
    KeyValues { entries: Vec<(String, String)> },
    Chart(Chart),
    Choropleth(Choropleth),
    Form(Form),
    Expander { title: String, blocks: Vec<Block> },
}

impl Block {
    pub fn header(text: impl Into<String>) -> Self {
        Block::Header { text: text.into() }
    }

    pub fn subheader(text: impl Into<String>) -> Self {
        Block::Subheader { text: text.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Block::Text { text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Block::Message {
            level: MessageLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Block::Message {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Block::Message {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    pub fn table(table: Table) -> Self {
        Block::Table { table }
    }
}

/// Summary card: a label over a formatted number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
}

impl MetricCard {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value: format_thousands(value),
        }
    }
}

// ============================================================================
// Charts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: String,
    pub y: f64,
}

/// One colour of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl Chart {
    /// Bar chart with one bar, and one colour, per row.
    /// Rows whose `y` cell is not numeric are left out.
    pub fn bars(table: &Table, x: &str, y: &str, title: impl Into<String>) -> Self {
        let series = (0..table.len())
            .filter_map(|row| {
                let name = display_value(table.cell(row, x)?);
                let value = numeric_value(table.cell(row, y)?)?;
                Some(Series {
                    name: name.clone(),
                    points: vec![Point { x: name, y: value }],
                })
            })
            .collect();
        Self {
            kind: ChartKind::Bar,
            title: title.into(),
            x_label: x.to_string(),
            y_label: y.to_string(),
            series,
        }
    }

    /// Line chart from long-form rows: one line per value of `color`.
    pub fn lines(table: &Table, x: &str, y: &str, color: &str, title: impl Into<String>) -> Self {
        let mut series: Vec<Series> = Vec::new();
        for row in 0..table.len() {
            let (Some(name), Some(px), Some(py)) = (
                table.cell(row, color).map(display_value),
                table.cell(row, x).map(display_value),
                table.cell(row, y).and_then(numeric_value),
            ) else {
                continue;
            };
            let point = Point { x: px, y: py };
            match series.iter_mut().find(|s| s.name == name) {
                Some(s) => s.points.push(point),
                None => series.push(Series {
                    name,
                    points: vec![point],
                }),
            }
        }
        Self {
            kind: ChartKind::Line,
            title: title.into(),
            x_label: x.to_string(),
            y_label: y.to_string(),
            series,
        }
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }
}

/// Country-keyed colour map. Countries are located by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choropleth {
    pub title: String,
    pub value_label: String,
    pub entries: Vec<ChoroplethEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethEntry {
    pub country: String,
    pub value: Option<f64>,
}

impl Choropleth {
    pub fn from_table(table: &Table, location: &str, value: &str, title: impl Into<String>) -> Self {
        let entries = (0..table.len())
            .filter_map(|row| {
                let country = display_value(table.cell(row, location)?);
                let value = table.cell(row, value).and_then(numeric_value);
                Some(ChoroplethEntry { country, value })
            })
            .collect();
        Self {
            title: title.into(),
            value_label: value.to_string(),
            entries,
        }
    }
}

// ============================================================================
// Forms
// ============================================================================

/// A group of inputs submitted together as one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form {
    pub fields: Vec<Field>,
    pub actions: Vec<FormAction>,
}

impl Form {
    /// Form whose single button submits `event`.
    pub fn new(event: &str, submit: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            actions: vec![FormAction {
                name: "event".to_string(),
                value: event.to_string(),
                label: submit.into(),
            }],
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn action(mut self, action: FormAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Event names this form can submit.
    pub fn events(&self) -> Vec<&str> {
        let hidden = self.fields.iter().filter_map(|f| match &f.input {
            Input::Hidden { value } if f.name == "event" => Some(value.as_str()),
            _ => None,
        });
        let buttons = self
            .actions
            .iter()
            .filter(|a| a.name == "event")
            .map(|a| a.value.as_str());
        hidden.chain(buttons).collect()
    }
}

/// Submit button. Its `name=value` pair is sent along with the fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormAction {
    pub name: String,
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub input: Input,
}

impl Field {
    pub fn new(name: &str, label: &str, input: Input) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            input,
        }
    }

    pub fn hidden(name: &str, value: impl Into<String>) -> Self {
        Self::new(name, "", Input::Hidden { value: value.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Input {
    Hidden {
        value: String,
    },
    Text {
        value: String,
    },
    TextArea {
        value: String,
    },
    /// `step` of `None` accepts any decimal.
    Number {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    Select {
        options: Vec<String>,
        selected: String,
    },
    Radio {
        options: Vec<String>,
        selected: String,
    },
    MultiSelect {
        options: Vec<String>,
        selected: Vec<String>,
    },
}

impl Input {
    pub fn integer(value: i64, min: Option<i64>, max: Option<i64>) -> Self {
        Input::Number {
            value: value as f64,
            min: min.map(|v| v as f64),
            max: max.map(|v| v as f64),
            step: Some(1.0),
        }
    }

    pub fn decimal(value: f64, min: Option<f64>, max: Option<f64>) -> Self {
        Input::Number {
            value,
            min,
            max,
            step: None,
        }
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Round to a whole number and group thousands: `1428627663.4` → `1,428,627,663`.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Short human form for axis ticks: `1.43B`, `25.5M`, `12k`.
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e12 {
        (value / 1e12, "T")
    } else if abs >= 1e9 {
        (value / 1e9, "B")
    } else if abs >= 1e6 {
        (value / 1e6, "M")
    } else if abs >= 1e3 {
        (value / 1e3, "k")
    } else {
        (value, "")
    };
    let text = format!("{scaled:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text}{suffix}")
}

/// Key/value lines of a JSON object; any other value becomes one `value` line.
pub fn key_values(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect(),
        other => vec![("value".to_string(), display_value(other))],
    }
}

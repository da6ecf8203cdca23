//! Client-side transforms over an already fetched [`Table`].
//!
//! Nothing here touches the network. Every function takes a table and
//! returns a new one (or a summary), leaving the input untouched.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dashboard::country::PopulationYear;
use crate::dashboard::table::{display_value, numeric_value, Table};

/// Column holding the country name in every per-country listing.
pub const COUNTRY_COLUMN: &str = "country";
pub const PLACE_COLUMN: &str = "place";
pub const DENSITY_COLUMN: &str = "density";
pub const AREA_COLUMN: &str = "area";

/// Long-form column names produced by [`melt`].
pub const YEAR_COLUMN: &str = "Year";
pub const POPULATION_COLUMN: &str = "Population";

/// Values picked in the sidebar filter, as displayed cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub countries: Vec<String>,
    pub places: Vec<String>,
    pub densities: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() && self.places.is_empty() && self.densities.is_empty()
    }
}

fn cell_in(table: &Table, row: usize, column: &str, chosen: &[String]) -> bool {
    table
        .cell(row, column)
        .map(|v| chosen.contains(&display_value(v)))
        .unwrap_or(false)
}

/// Rows whose country is chosen, or whose place AND density are both chosen.
///
/// The combinator is asymmetric: picking only places (or only
/// densities) selects nothing. Row order is kept, so a row matching both
/// branches appears once.
pub fn filter_selection(table: &Table, selection: &Selection) -> Table {
    let indices: Vec<usize> = (0..table.len())
        .filter(|&row| {
            cell_in(table, row, COUNTRY_COLUMN, &selection.countries)
                || (cell_in(table, row, PLACE_COLUMN, &selection.places)
                    && cell_in(table, row, DENSITY_COLUMN, &selection.densities))
        })
        .collect();
    table.take_rows(&indices)
}

/// Distinct displayed values of a column, in first-seen order.
pub fn column_options(table: &Table, column: &str) -> Vec<String> {
    table.unique(column).iter().map(display_value).collect()
}

/// Summary cards of the home page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total: f64,
    pub mode: f64,
    pub mean: f64,
    pub median: f64,
}

/// Sum, first mode, mean and median. All zero for an empty input.
///
/// The first mode is the smallest of the most frequent values. NaN is skipped.
pub fn summary_statistics(values: &[f64]) -> SummaryStats {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return SummaryStats::default();
    }
    sorted.sort_by(f64::total_cmp);

    let total: f64 = sorted.iter().sum();
    let mean = total / sorted.len() as f64;

    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let mut mode = sorted[0];
    let mut best = 0usize;
    let mut run_start = 0usize;
    for i in 1..=sorted.len() {
        if i == sorted.len() || sorted[i] != sorted[run_start] {
            let run = i - run_start;
            if run > best {
                best = run;
                mode = sorted[run_start];
            }
            run_start = i;
        }
    }

    SummaryStats {
        total,
        mode,
        mean,
        median,
    }
}

/// Wide per-country rows to long (`country`, `Year`, `Population`) rows.
///
/// Stacked year by year: all rows for the first year, then the next. `Year`
/// holds the source column name. Missing cells become null.
pub fn melt(table: &Table, years: &[PopulationYear]) -> Table {
    let mut long = Table::new(vec![
        COUNTRY_COLUMN.to_string(),
        YEAR_COLUMN.to_string(),
        POPULATION_COLUMN.to_string(),
    ]);
    for year in years {
        for row in 0..table.len() {
            long.push_row(vec![
                table.cell(row, COUNTRY_COLUMN).cloned().unwrap_or(Value::Null),
                Value::String(year.column().to_string()),
                table.cell(row, year.column()).cloned().unwrap_or(Value::Null),
            ]);
        }
    }
    long
}

/// Clamp a user-supplied row count to `[1, rows]` (0 when there are no rows).
pub fn clamp_count(requested: usize, rows: usize) -> usize {
    requested.clamp(1, rows.max(1)).min(rows)
}

fn descending_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// First `n` rows by descending value of `column`. Stable: ties keep their order.
pub fn top_n(table: &Table, column: &str, n: usize) -> Table {
    let keys: Vec<Option<f64>> = (0..table.len())
        .map(|row| {
            table
                .cell(row, column)
                .and_then(numeric_value)
                .filter(|v| !v.is_nan())
        })
        .collect();
    let mut indices: Vec<usize> = (0..table.len()).collect();
    indices.sort_by(|&a, &b| descending_nulls_last(keys[a], keys[b]));
    indices.truncate(n);
    table.take_rows(&indices)
}

//! Data series and the shapes renderers draw from them.
//!
//! Series come from the remote client already normalized. Nothing here
//! mutates them; charts, tables and the CSV export each derive their own
//! row layout.

use crate::config::CHART_Y_AXIS_LABEL;
use crate::ChartKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Period label, a year for the emissions indicator.
    pub x: String,
    pub y: f64,
}

/// One entity's values over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSeries {
    /// Entity code.
    pub id: String,
    pub label: String,
    pub values: Vec<Point>,
}

impl DataSeries {
    pub fn total(&self) -> f64 {
        self.values.iter().map(|p| p.y).sum()
    }
}

/// A country or region the dashboard can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entity {
    pub code: &'static str,
    pub name: &'static str,
    pub color: &'static str,
}

pub const ENTITIES: [Entity; 6] = [
    Entity { code: "USA", name: "United States", color: "#8884d8" },
    Entity { code: "JPN", name: "Japan", color: "#82ca9d" },
    Entity { code: "CHN", name: "China", color: "#ffc658" },
    Entity { code: "IND", name: "India", color: "#ff8042" },
    Entity { code: "FRA", name: "France", color: "#0088FE" },
    Entity { code: "BRA", name: "Brazil", color: "#FF5733" },
];

const FALLBACK_COLOR: &str = "#888888";

static ENTITY_INDEX: Lazy<HashMap<&'static str, &'static Entity>> =
    Lazy::new(|| ENTITIES.iter().map(|e| (e.code, e)).collect());

pub fn entity(code: &str) -> Option<&'static Entity> {
    ENTITY_INDEX.get(code).copied()
}

pub fn all_entity_codes() -> Vec<String> {
    ENTITIES.iter().map(|e| e.code.to_string()).collect()
}

pub fn entity_color(code: &str) -> &'static str {
    entity(code).map_or(FALLBACK_COLOR, |e| e.color)
}

/// Values of every series for one period, in series order.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRow {
    pub period: String,
    pub values: Vec<Option<f64>>,
}

/// Merge all series into one row per period, sorted by period label.
pub fn period_rows(data: &[DataSeries]) -> Vec<PeriodRow> {
    let mut rows: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
    for (idx, series) in data.iter().enumerate() {
        for point in &series.values {
            let row = rows
                .entry(point.x.as_str())
                .or_insert_with(|| vec![None; data.len()]);
            row[idx] = Some(point.y);
        }
    }

    rows.into_iter()
        .map(|(period, values)| PeriodRow {
            period: period.to_string(),
            values,
        })
        .collect()
}

/// Total of one series and its share of the grand total.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub id: String,
    pub label: String,
    pub value: f64,
    /// Percentage rounded to one decimal, 0 when the grand total is 0.
    pub percentage: f64,
}

/// One row per series, in series order.
pub fn aggregate_rows(data: &[DataSeries]) -> Vec<AggregateRow> {
    let total: f64 = data.iter().map(DataSeries::total).sum();

    data.iter()
        .map(|series| {
            let value = series.total();
            let percentage = if total > 0.0 {
                (value / total * 1000.0).round() / 10.0
            } else {
                0.0
            };
            AggregateRow {
                id: series.id.clone(),
                label: series.label.clone(),
                value,
                percentage,
            }
        })
        .collect()
}

/// Header and formatted cells of a tile's table view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

/// Tabular form of `data` as shown for a tile of `kind`.
///
/// Pie and map tiles show per-entity totals; the others show one row per
/// period with a column per series.
pub fn table_for(kind: ChartKind, data: &[DataSeries]) -> TableView {
    if data.is_empty() {
        return TableView::default();
    }

    if kind.is_aggregate() {
        let rows = aggregate_rows(data)
            .into_iter()
            .map(|row| {
                vec![
                    row.label,
                    format_value(row.value),
                    format!("{:.1}", row.percentage),
                ]
            })
            .collect();
        return TableView {
            columns: vec!["Label".into(), "Value".into(), "Percentage".into()],
            rows,
        };
    }

    let mut columns = vec!["Year/Period".to_string()];
    columns.extend(data.iter().map(|s| s.label.clone()));
    let rows = period_rows(data)
        .into_iter()
        .map(|row| {
            let mut cells = vec![row.period];
            cells.extend(row.values.into_iter().map(|v| v.map(format_value).unwrap_or_default()));
            cells
        })
        .collect();

    TableView { columns, rows }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub colors: Vec<String>,
    pub data: Vec<Option<f64>>,
}

/// What the charting library is handed for one tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPayload {
    pub kind: ChartKind,
    pub y_axis_label: &'static str,
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

pub fn chart_payload(kind: ChartKind, data: &[DataSeries]) -> ChartPayload {
    let (labels, datasets) = if kind.is_aggregate() {
        let rows = aggregate_rows(data);
        let dataset = ChartDataset {
            label: CHART_Y_AXIS_LABEL.to_string(),
            colors: rows.iter().map(|r| entity_color(&r.id).to_string()).collect(),
            data: rows.iter().map(|r| Some(r.value)).collect(),
        };
        let labels = rows.into_iter().map(|r| r.label).collect();
        (labels, vec![dataset])
    } else {
        let rows = period_rows(data);
        let datasets = data
            .iter()
            .enumerate()
            .map(|(idx, series)| ChartDataset {
                label: series.label.clone(),
                colors: vec![entity_color(&series.id).to_string()],
                data: rows.iter().map(|r| r.values[idx]).collect(),
            })
            .collect();
        (rows.into_iter().map(|r| r.period).collect(), datasets)
    };

    ChartPayload {
        kind,
        y_axis_label: CHART_Y_AXIS_LABEL,
        labels,
        datasets,
    }
}

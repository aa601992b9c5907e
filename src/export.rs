//! CSV export of the data behind a tile.

use crate::series::{aggregate_rows, period_rows, DataSeries};
use crate::ChartKind;
use std::cmp::Ordering;

/// Render `data` as CSV the way a tile of `kind` presents it.
///
/// Time-series kinds produce one row per period with one column per series.
/// Pie and map produce one row per entity (`Label,Value,Percentage`),
/// largest value first.
pub fn series_to_csv(
    kind: ChartKind,
    data: &[DataSeries],
) -> Result<String, Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    if kind.is_aggregate() {
        wtr.write_record(["Label", "Value", "Percentage"])?;
        let mut rows = aggregate_rows(data);
        rows.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
        for row in rows {
            wtr.write_record([
                row.label,
                row.value.to_string(),
                row.percentage.to_string(),
            ])?;
        }
    } else {
        let mut header = vec!["Year".to_string()];
        header.extend(data.iter().map(|s| s.label.clone()));
        wtr.write_record(&header)?;
        for row in period_rows(data) {
            let mut record = vec![row.period];
            record.extend(
                row.values
                    .into_iter()
                    .map(|v| v.map(|y| y.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }
    }

    let bytes = wtr.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

/// File name for an export of the tile titled `title`.
pub fn csv_filename(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "chart-data.csv".to_string()
    } else {
        format!("{}.csv", slug)
    }
}

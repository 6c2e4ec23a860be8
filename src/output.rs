use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::aggregate::Heatmap;
use crate::error::Result;
use crate::filter::FilteredView;
use crate::reports::EventSummary;
use crate::types::display_2dp;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// `<prefix>_YYYYmmdd_HHMMSS.<ext>` inside `dir`.
pub fn timestamped_path(dir: &Path, prefix: &str, ext: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.{}", prefix, stamp, ext))
}

/// Dump the filtered rows in the source column layout.
pub fn export_filtered(path: &Path, view: &FilteredView<'_>) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in view.records() {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    tracing::info!(path = %path.display(), rows = view.len(), "exported filtered bookings");
    Ok(())
}

pub fn export_event_summary(path: &Path, summary: &EventSummary) -> Result<()> {
    write_csv(path, &summary.rows)?;
    tracing::info!(path = %path.display(), rows = summary.rows.len(), "exported event list");
    Ok(())
}

fn heatmap_rows(grid: &Heatmap) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(32);
    let mut header = vec!["Day".to_string()];
    header.extend((1..=12).map(|m: u32| m.to_string()));
    rows.push(header);
    for (idx, cells) in grid.cells.iter().enumerate() {
        let mut row = vec![(idx + 1).to_string()];
        row.extend(
            cells
                .iter()
                .map(|c| c.as_ref().map(display_2dp).unwrap_or_default()),
        );
        rows.push(row);
    }
    rows
}

/// Day-of-month rows by month columns; empty cells stay blank.
pub fn write_heatmap_csv(path: &Path, grid: &Heatmap) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in heatmap_rows(grid) {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn preview_heatmap(grid: &Heatmap) {
    if grid.filled_cells() == 0 {
        println!("(no rows)\n");
        return;
    }
    let mut table = Table::from_iter(heatmap_rows(grid));
    table.with(Style::markdown());
    println!("{}\n", table);
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    preview_table_rows(rows, max_rows);
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heatmap_rows_have_blank_cells() {
        let mut cells = [[None; 12]; 31];
        cells[0][6] = Some(55.5);
        let rows = heatmap_rows(&Heatmap { cells });
        assert_eq!(rows.len(), 32);
        assert_eq!(rows[0][0], "Day");
        assert_eq!(rows[0][12], "12");
        assert_eq!(rows[1][7], "55.50");
        assert_eq!(rows[1][1], "");
        assert_eq!(rows[31][0], "31");
    }

    #[test]
    fn timestamped_path_shape() {
        let p = timestamped_path(Path::new("/tmp"), "hotel_data_filtered", "csv");
        let name = p.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("hotel_data_filtered_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "hotel_data_filtered_".len() + 15 + 4);
    }
}

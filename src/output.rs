use crate::error::{DashboardError, Result};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

fn export_err(path: &Path, e: impl std::fmt::Display) -> DashboardError {
    DashboardError::Export {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| export_err(path, e))?;
    for r in rows {
        wtr.serialize(r).map_err(|e| export_err(path, e))?;
    }
    wtr.flush().map_err(|e| export_err(path, e))?;
    Ok(())
}

/// CSV for tables whose columns are only known at runtime.
pub fn write_grid_csv(path: &Path, header: &[String], body: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| export_err(path, e))?;
    wtr.write_record(header).map_err(|e| export_err(path, e))?;
    for row in body {
        wtr.write_record(row).map_err(|e| export_err(path, e))?;
    }
    wtr.flush().map_err(|e| export_err(path, e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|e| export_err(path, e))?;
    Ok(())
}

pub fn render_table_rows<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn render_grid(header: &[String], body: &[Vec<String>]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let mut builder = Builder::default();
    builder.push_record(header.iter().cloned());
    for row in body {
        builder.push_record(row.iter().cloned());
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    Some(table.to_string())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match render_table_rows(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no data)\n"),
    }
}

pub fn preview_grid(header: &[String], body: &[Vec<String>]) {
    match render_grid(header, body) {
        Some(table) => println!("{}\n", table),
        None => println!("(no data)\n"),
    }
}

use anyhow::{Context, Result};
use debt_fraction::DebtFractionRow;
use engine::{FlatTable, RunOutput};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

/// `-` writes to stdout.
fn open(path: &Path) -> Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(Box::new(file))
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Wide layout: the meta columns, then one column per year.
pub fn write_pivoted(table: &FlatTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_writer(open(path)?);
    writer.write_record(table.header())?;
    for row in table.rows() {
        let values = row.values.iter().map(|v| cell(*v));
        writer.write_record(row.meta().into_iter().chain(values))?;
    }
    writer.flush()?;
    info!(rows = table.len(), path = %path.display(), "Wrote pivoted results");
    Ok(())
}

/// Long layout: one record per row and year.
pub fn write_flat(table: &FlatTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_writer(open(path)?);
    let mut records = 0;
    for record in table.long_records() {
        writer.serialize(record)?;
        records += 1;
    }
    writer.flush()?;
    info!(records, path = %path.display(), "Wrote flat results");
    Ok(())
}

/// Classification records of every technology in `outputs`, with a
/// `Tech Name` column. Each technology is written once.
pub fn write_meta(outputs: &[RunOutput], path: &Path) -> Result<()> {
    let mut seen = BTreeSet::new();
    let records: Vec<_> = outputs
        .iter()
        .filter(|o| seen.insert(o.technology.as_str()))
        .flat_map(|o| o.meta.iter().map(move |record| (o.technology.as_str(), record)))
        .collect();

    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|(_, record)| record.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(open(path)?);
    writer.write_record(columns.iter().copied().chain(["Tech Name"]))?;
    for (technology, record) in &records {
        let values = columns.iter().map(|c| record.get(*c).map(String::as_str).unwrap_or(""));
        writer.write_record(values.chain([*technology]))?;
    }
    writer.flush()?;
    info!(records = records.len(), path = %path.display(), "Wrote metadata");
    Ok(())
}

/// One row per technology and case, one column per year.
pub fn write_debt_fractions(rows: &[DebtFractionRow], path: &Path) -> Result<()> {
    let years: BTreeSet<i32> = rows.iter().flat_map(|r| r.years.iter().copied()).collect();

    let mut writer = csv::Writer::from_writer(open(path)?);
    let header = ["Technology".to_string(), "Case".to_string()]
        .into_iter()
        .chain(years.iter().map(|y| y.to_string()));
    writer.write_record(header)?;
    for row in rows {
        let values = years.iter().map(|year| {
            let value = row.years.iter().position(|y| y == year).map(|i| row.fractions[i]);
            cell(value)
        });
        let record = [row.technology.clone(), row.case.to_string()].into_iter().chain(values);
        writer.write_record(record)?;
    }
    writer.flush()?;
    info!(rows = rows.len(), path = %path.display(), "Wrote debt fractions");
    Ok(())
}

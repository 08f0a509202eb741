//! Loading of the two input tables, `input_data` and `parameters`,
//! from a directory of CSV files or from an Excel workbook.
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::config::{InputType, ModelParams};
use crate::error::{PlanningError, PlanningResult};
use crate::planning::{GlobalParameters, PeriodRecord};

/// Rows of a table, as header → trimmed cell text
pub type RawTable = Vec<HashMap<String, String>>;

/// Table of the per-period records
pub const INPUT_TABLE: &str = "input_data";
/// `attribute`/`value` table of the global parameters
pub const PARAMETERS_TABLE: &str = "parameters";

/// Validated input of a planning run
#[derive(Debug, Clone, PartialEq)]
pub struct InputData {
    /// Ordered by period, starting at period 0
    pub periods: Vec<PeriodRecord>,
    /// Global parameters
    pub params: GlobalParameters,
}

/// Load and validate the input tables as configured
pub fn load(params: &ModelParams) -> PlanningResult<InputData> {
    let tables = match params.input_type {
        InputType::Csv => read_csv_dir(&params.data_dir.join("csv"))?,
        InputType::Excel => {
            let files = find_files(&params.data_dir.join("excel"), "xlsx")?;
            if files.len() > 1 {
                warn!(
                    "{} Excel files found, only {} is read",
                    files.len(),
                    files[0].display()
                );
            }
            read_excel(&files[0])?
        }
    };
    let data = parse_tables(&tables)?;
    info!("Data is loaded! {} periods", data.periods.len());
    Ok(data)
}

/// Files of `dir` with the given extension, sorted by name. Fails when there is none.
pub fn find_files(dir: &Path, extension: &str) -> PlanningResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        PlanningError::InvalidInput(format!("cannot read {}: {}", dir.display(), e))
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(PlanningError::InvalidInput(format!(
            "no .{} file was found in {}",
            extension,
            dir.display()
        )));
    }
    files.sort();
    Ok(files)
}

/// Every `.csv` file of `dir`, keyed by file stem
pub fn read_csv_dir(dir: &Path) -> PlanningResult<HashMap<String, RawTable>> {
    let mut tables = HashMap::new();
    for path in find_files(dir, "csv")? {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("reading table {} from {}", name, path.display());
        tables.insert(name, read_csv_table(&path)?);
    }
    Ok(tables)
}

/// Rows of one CSV file with a header line. Blank rows are skipped.
pub fn read_csv_table(path: &Path) -> PlanningResult<RawTable> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.trim().to_string()))
            .collect();
        if row.values().all(|v| v.is_empty()) {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Every sheet of the workbook, keyed by sheet name
pub fn read_excel(path: &Path) -> PlanningResult<HashMap<String, RawTable>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let mut tables = HashMap::new();
    for sheet_name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&sheet_name)?;
        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            None => continue,
        };

        let mut table = Vec::new();
        for data_row in rows {
            let row: HashMap<String, String> = headers
                .iter()
                .cloned()
                .zip(data_row.iter().map(|cell| cell.to_string().trim().to_string()))
                .collect();
            if row.values().all(|v| v.is_empty()) {
                continue;
            }
            table.push(row);
        }
        debug!("read sheet {} with {} rows", sheet_name, table.len());
        tables.insert(sheet_name, table);
    }
    Ok(tables)
}

fn table<'t>(tables: &'t HashMap<String, RawTable>, name: &str) -> PlanningResult<&'t RawTable> {
    tables
        .get(name)
        .ok_or_else(|| PlanningError::InvalidInput(format!("missing table {:?}", name)))
}

fn number(row: &HashMap<String, String>, column: &str, line: usize) -> PlanningResult<f64> {
    let cell = row
        .get(column)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            PlanningError::InvalidInput(format!("row {}: missing {}", line, column))
        })?;
    cell.parse().map_err(|_| {
        PlanningError::InvalidInput(format!(
            "row {}: {} is not a number: {:?}",
            line, column, cell
        ))
    })
}

/// Validate the raw tables into typed records
pub fn parse_tables(tables: &HashMap<String, RawTable>) -> PlanningResult<InputData> {
    Ok(InputData {
        periods: parse_periods(table(tables, INPUT_TABLE)?)?,
        params: parse_parameters(table(tables, PARAMETERS_TABLE)?)?,
    })
}

fn parse_periods(rows: &RawTable) -> PlanningResult<Vec<PeriodRecord>> {
    if rows.is_empty() {
        return Err(PlanningError::InvalidInput(format!(
            "table {} has no row",
            INPUT_TABLE
        )));
    }
    let mut periods = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        // 1-based data line, after the header
        let line = idx + 2;
        let period = number(row, "period", line)?;
        if period != idx as f64 {
            return Err(PlanningError::InvalidInput(format!(
                "row {}: expected period {}, got {}",
                line, idx, period
            )));
        }
        periods.push(PeriodRecord {
            demand: number(row, "demand", line)?,
            production_capacity: number(row, "production_capacity", line)?,
            production_cost: number(row, "production_cost", line)?,
        });
    }
    Ok(periods)
}

fn parse_parameters(rows: &RawTable) -> PlanningResult<GlobalParameters> {
    let mut values: HashMap<&str, f64> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let line = idx + 2;
        let attribute = row
            .get("attribute")
            .map(String::as_str)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                PlanningError::InvalidInput(format!("row {}: missing attribute", line))
            })?;
        let value = number(row, "value", line)?;
        if values.insert(attribute, value).is_some() {
            return Err(PlanningError::InvalidInput(format!(
                "parameter {} is given twice",
                attribute
            )));
        }
    }

    let mut take = |name: &str| {
        values.remove(name).ok_or_else(|| {
            PlanningError::InvalidInput(format!("missing parameter {}", name))
        })
    };
    let params = GlobalParameters {
        initial_inventory: take("initial_inventory")?,
        holding_cost: take("holding_cost")?,
    };
    for attribute in values.keys() {
        debug!("ignoring parameter {}", attribute);
    }
    Ok(params)
}

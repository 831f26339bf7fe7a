//! Price and category enrichment of available domains.
//!
//! This module loads the price and category tables, joins them onto the
//! available rows of the ledger and writes the two derived exports: the
//! available-only CSV and the priced CSV. Both exports are regenerated in
//! full from the ledger every time.

use crate::error::DomainSweepError;
use crate::ledger::LEDGER_HEADERS;
use crate::types::{CategoryEntry, DomainRecord, PriceEntry, PricedRecord};
use crate::utils::{extract_tld, normalize_tld};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Column order of the priced export.
pub const PRICED_HEADERS: [&str; 9] = [
    "domain",
    "available",
    "lookupType",
    "extra_json",
    "tld",
    "category",
    "price",
    "regular",
    "renewal",
];

/// Prices keyed by normalized TLD.
pub type PriceTable = HashMap<String, PriceEntry>;

/// Categories keyed by normalized TLD.
pub type CategoryTable = HashMap<String, CategoryEntry>;

pub fn load_price_table<P: AsRef<Path>>(path: P) -> Result<PriceTable, DomainSweepError> {
    let path = path.as_ref();
    let file = open_table(path, "price table")?;
    let table = parse_price_table(file, &path.to_string_lossy())?;
    debug!(path = %path.display(), tlds = table.len(), "loaded price table");
    Ok(table)
}

pub fn load_category_table<P: AsRef<Path>>(path: P) -> Result<CategoryTable, DomainSweepError> {
    let path = path.as_ref();
    let file = open_table(path, "category table")?;
    let table = parse_category_table(file, &path.to_string_lossy())?;
    debug!(path = %path.display(), tlds = table.len(), "loaded category table");
    Ok(table)
}

fn open_table(path: &Path, what: &str) -> Result<fs::File, DomainSweepError> {
    fs::File::open(path).map_err(|e| {
        DomainSweepError::file_error(path.to_string_lossy(), format!("Could not open {}: {}", what, e))
    })
}

/// Parse a price table with columns `tld, regular, renewal`.
///
/// Malformed rows are logged as join data errors and skipped. A later row
/// for the same TLD replaces an earlier one.
///
/// # Errors
///
/// Returns `FileError` when the header is unreadable or a required column is
/// missing.
pub fn parse_price_table<R: Read>(reader: R, source: &str) -> Result<PriceTable, DomainSweepError> {
    let mut reader = table_reader(reader);
    let columns = locate_columns(&mut reader, source, &["tld", "regular", "renewal"])?;
    let (tld_col, regular_col, renewal_col) = (columns[0], columns[1], columns[2]);

    let mut table = PriceTable::new();
    for (index, row) in reader.records().enumerate() {
        let line = row_line(&row, index);
        let parsed = row
            .map_err(|e| DomainSweepError::join_data(source, line, e.to_string()))
            .and_then(|row| {
                let tld = required_tld(&row, tld_col, source, line)?;
                let regular = parse_price(row.get(regular_col), "regular", source, line)?;
                let renewal = parse_price(row.get(renewal_col), "renewal", source, line)?;
                Ok(PriceEntry {
                    tld,
                    regular,
                    renewal,
                })
            });

        match parsed {
            Ok(entry) => {
                table.insert(entry.tld.clone(), entry);
            }
            Err(e) => warn!(error = %e, "skipping price row"),
        }
    }

    Ok(table)
}

/// Parse a category table with columns `category, tld`.
pub fn parse_category_table<R: Read>(
    reader: R,
    source: &str,
) -> Result<CategoryTable, DomainSweepError> {
    let mut reader = table_reader(reader);
    let columns = locate_columns(&mut reader, source, &["category", "tld"])?;
    let (category_col, tld_col) = (columns[0], columns[1]);

    let mut table = CategoryTable::new();
    for (index, row) in reader.records().enumerate() {
        let line = row_line(&row, index);
        let parsed = row
            .map_err(|e| DomainSweepError::join_data(source, line, e.to_string()))
            .and_then(|row| {
                let tld = required_tld(&row, tld_col, source, line)?;
                let category = row.get(category_col).unwrap_or_default().to_string();
                Ok(CategoryEntry { tld, category })
            });

        match parsed {
            Ok(entry) => {
                table.insert(entry.tld.clone(), entry);
            }
            Err(e) => warn!(error = %e, "skipping category row"),
        }
    }

    Ok(table)
}

fn table_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn locate_columns<R: Read>(
    reader: &mut csv::Reader<R>,
    source: &str,
    names: &[&str],
) -> Result<Vec<usize>, DomainSweepError> {
    let headers = reader
        .headers()
        .map_err(|e| DomainSweepError::file_error(source, format!("Unreadable header: {}", e)))?;

    names
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    DomainSweepError::file_error(source, format!("Table has no '{}' column", name))
                })
        })
        .collect()
}

/// 1-based file line of a data row; header is line 1.
fn row_line(row: &Result<csv::StringRecord, csv::Error>, index: usize) -> u64 {
    let position = match row {
        Ok(record) => record.position(),
        Err(e) => e.position(),
    };
    position.map(|p| p.line()).unwrap_or(index as u64 + 2)
}

fn required_tld(
    row: &csv::StringRecord,
    column: usize,
    source: &str,
    line: u64,
) -> Result<String, DomainSweepError> {
    row.get(column)
        .and_then(normalize_tld)
        .ok_or_else(|| DomainSweepError::join_data(source, line, "empty tld"))
}

fn parse_price(
    cell: Option<&str>,
    column: &str,
    source: &str,
    line: u64,
) -> Result<Decimal, DomainSweepError> {
    let raw = cell.unwrap_or_default();
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    Decimal::from_str(cleaned.trim()).map_err(|e| {
        DomainSweepError::join_data(source, line, format!("invalid {} '{}': {}", column, raw, e))
    })
}

/// Collapse repeated ledger rows for the same domain.
///
/// The last-written row wins and takes the position of the domain's first
/// appearance, so every output row stands for one logical record.
pub fn collapse_duplicates(records: &[DomainRecord]) -> Vec<DomainRecord> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut collapsed: Vec<DomainRecord> = Vec::with_capacity(records.len());

    for record in records {
        match position.get(record.domain.as_str()) {
            Some(&index) => collapsed[index] = record.clone(),
            None => {
                position.insert(record.domain.as_str(), collapsed.len());
                collapsed.push(record.clone());
            }
        }
    }

    collapsed
}

/// Join price and category data onto the available records.
///
/// The known TLD set is the union of both tables' keys.
pub fn join_prices(
    records: &[DomainRecord],
    prices: &PriceTable,
    categories: &CategoryTable,
) -> Vec<PricedRecord> {
    join_prices_with_tlds(records, prices, categories, &[])
}

/// Like [`join_prices`], with extra TLDs added to the known set.
///
/// Passing the run's TLD table keeps a domain such as `acme.co.uk` from
/// being priced as `uk` when only `uk` has a price row.
///
/// Output keeps input order. Unavailable records and records whose TLD has
/// no price are dropped; a missing category becomes an empty string.
pub fn join_prices_with_tlds(
    records: &[DomainRecord],
    prices: &PriceTable,
    categories: &CategoryTable,
    extra_tlds: &[String],
) -> Vec<PricedRecord> {
    let known: HashSet<String> = prices
        .keys()
        .chain(categories.keys())
        .chain(extra_tlds.iter())
        .cloned()
        .collect();

    let mut dropped = 0usize;
    let priced: Vec<PricedRecord> = records
        .iter()
        .filter(|record| record.available)
        .filter_map(|record| {
            let domain = record.domain.to_lowercase();
            let tld = extract_tld(&domain, &known)?;
            let Some(price) = prices.get(tld) else {
                dropped += 1;
                return None;
            };
            Some(PricedRecord {
                record: record.clone(),
                tld: tld.to_string(),
                category: categories
                    .get(tld)
                    .map(|c| c.category.clone())
                    .unwrap_or_default(),
                price: price.regular,
                regular: price.regular,
                renewal: price.renewal,
            })
        })
        .collect();

    if dropped > 0 {
        debug!(dropped, "available domains without a price entry");
    }

    priced
}

/// Write records with the ledger columns, replacing `path`.
pub fn write_records_csv<P: AsRef<Path>>(
    path: P,
    records: &[DomainRecord],
) -> Result<usize, DomainSweepError> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(LEDGER_HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }

    replace_file(path, writer)?;
    Ok(records.len())
}

/// Write the priced export, replacing `path`.
pub fn write_priced_csv<P: AsRef<Path>>(
    path: P,
    rows: &[PricedRecord],
) -> Result<usize, DomainSweepError> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(PRICED_HEADERS)?;
    for row in rows {
        let record = &row.record;
        let (price, regular, renewal) = (
            row.price.to_string(),
            row.regular.to_string(),
            row.renewal.to_string(),
        );
        writer.write_record([
            record.domain.as_str(),
            if record.available { "true" } else { "false" },
            record.lookup_type.as_str(),
            record.extra_json.as_str(),
            row.tld.as_str(),
            row.category.as_str(),
            price.as_str(),
            regular.as_str(),
            renewal.as_str(),
        ])?;
    }

    replace_file(path, writer)?;
    Ok(rows.len())
}

/// Write the buffered CSV next to `path`, then rename it into place.
fn replace_file(path: &Path, writer: csv::Writer<Vec<u8>>) -> Result<(), DomainSweepError> {
    let shown = path.display().to_string();
    let buffer = writer
        .into_inner()
        .map_err(|e| DomainSweepError::internal(format!("CSV buffer error: {}", e)))?;

    let tmp = temp_path(path);
    fs::write(&tmp, &buffer).map_err(|e| DomainSweepError::file_error(&shown, e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        DomainSweepError::file_error(&shown, e.to_string())
    })?;

    debug!(path = %shown, bytes = buffer.len(), "export written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export.csv".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

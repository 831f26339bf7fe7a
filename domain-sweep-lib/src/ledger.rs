//! Append-only CSV ledger and the resume state derived from it.
//!
//! The ledger is both the main output of a sweep and the only record of
//! progress. A base is committed with a single append, so after a crash the
//! file holds either every row of a base or none of them (plus, at worst, one
//! torn trailing row which the resume scan skips).

use crate::error::DomainSweepError;
use crate::types::DomainRecord;
use crate::utils::expand;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Ledger column names, in order.
pub const LEDGER_HEADERS: [&str; 4] = ["domain", "available", "lookupType", "extra_json"];

/// Which candidate domains already have a row in the ledger.
///
/// Computed once at startup by folding over the ledger rows and updated in
/// memory after each committed base. It never looks at the file itself, so
/// the completeness rules can be tested without any I/O.
#[derive(Debug, Clone, Default)]
pub struct ResumeState {
    recorded: HashSet<String>,
}

impl ResumeState {
    /// Build the state from existing ledger rows.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a DomainRecord>,
    {
        let mut state = Self::default();
        state.mark_recorded(records);
        state
    }

    /// Register newly committed rows.
    pub fn mark_recorded<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a DomainRecord>,
    {
        for record in records {
            self.recorded.insert(record.domain.to_lowercase());
        }
    }

    /// Number of distinct candidate domains that already have a row.
    pub fn recorded_count(&self, domains: &[String]) -> usize {
        let distinct: HashSet<String> = domains.iter().map(|d| d.to_lowercase()).collect();
        distinct.iter().filter(|d| self.recorded.contains(*d)).count()
    }

    /// True when every candidate domain already has a row.
    ///
    /// An empty candidate list is trivially complete.
    pub fn is_complete(&self, domains: &[String]) -> bool {
        let distinct: HashSet<String> = domains.iter().map(|d| d.to_lowercase()).collect();
        self.recorded_count(domains) == distinct.len()
    }

    /// Completeness of a base under the current TLD set and mode.
    ///
    /// If the TLD set grew since the rows were written, the base becomes
    /// incomplete again and will be queried from scratch.
    pub fn is_base_complete(&self, base: &str, tlds: &[String], no_tlds: bool) -> bool {
        self.is_complete(&expand(base, tlds, no_tlds))
    }

    /// Number of distinct domains recorded.
    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}

/// Append-only CSV ledger of domain records.
///
/// The ledger is the only writer of its file during a run; the resume scan
/// happens before any append.
#[derive(Debug)]
pub struct OutputLedger {
    path: PathBuf,
}

impl OutputLedger {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the sidecar that receives partial records of timed-out bases.
    ///
    /// `out/status.csv` -> `out/status.partial.csv`.
    pub fn sidecar_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_string());
        self.path.with_file_name(format!("{}.partial.csv", stem))
    }

    /// Read every parseable row of the ledger.
    ///
    /// A missing or empty file yields no rows. Rows that fail to parse are
    /// logged and skipped; a crash during an append can leave one torn row
    /// at the end of the file.
    pub fn read_records(&self) -> Result<Vec<DomainRecord>, DomainSweepError> {
        read_ledger_file(&self.path)
    }

    /// Scan the ledger and derive the resume state.
    pub fn resume_state(&self) -> Result<ResumeState, DomainSweepError> {
        let records = self.read_records()?;
        Ok(ResumeState::from_records(&records))
    }

    /// Commit all records of one base with a single append and flush.
    ///
    /// Creates the file with a header if needed and never truncates
    /// existing content.
    pub fn append_base(
        &mut self,
        base: &str,
        records: &[DomainRecord],
    ) -> Result<(), DomainSweepError> {
        append_rows(&self.path, records)?;
        debug!(base, rows = records.len(), path = %self.path.display(), "committed base");
        Ok(())
    }

    /// Append the partial records of a timed-out base to the sidecar.
    ///
    /// The sidecar is never read back for resume, so the base is still
    /// retried in full on the next run.
    pub fn append_partial(
        &mut self,
        base: &str,
        records: &[DomainRecord],
    ) -> Result<(), DomainSweepError> {
        let sidecar = self.sidecar_path();
        append_rows(&sidecar, records)?;
        debug!(base, rows = records.len(), path = %sidecar.display(), "stored partial base");
        Ok(())
    }
}

/// Read a file with ledger columns (also used for the sidecar and exports).
///
/// Rows never span lines, so each line is parsed on its own: a row torn by a
/// crash cannot swallow the rows appended after it. Torn rows are skipped:
/// an unterminated last line, a short row, or an `extra_json` cell that is
/// not valid JSON.
pub(crate) fn read_ledger_file(path: &Path) -> Result<Vec<DomainRecord>, DomainSweepError> {
    let shown = path.display().to_string();

    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read(path).map_err(|e| DomainSweepError::file_error(&shown, e.to_string()))?;

    // bytes after the last newline were cut mid-write
    let complete_len = content
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |last_newline| last_newline + 1);
    if complete_len < content.len() {
        warn!(
            path = %shown,
            bytes = content.len() - complete_len,
            "ignoring torn last ledger row"
        );
    }

    let mut lines = content[..complete_len]
        .split(|&b| b == b'\n')
        .enumerate()
        .map(|(index, line)| (index as u64 + 1, line.strip_suffix(b"\r").unwrap_or(line)))
        .filter(|(_, line)| !line.is_empty())
        .peekable();

    let Some((_, mut header_line)) = lines.next() else {
        return Ok(Vec::new());
    };
    // a header torn on creation is followed by the header written on first append
    let full_header = LEDGER_HEADERS.join(",");
    if header_line != full_header.as_bytes() {
        if let Some((_, next)) = lines.next_if(|(_, next)| *next == full_header.as_bytes()) {
            header_line = next;
        }
    }
    let headers = parse_line(header_line)
        .map_err(|e| DomainSweepError::file_error(&shown, format!("Unreadable header: {}", e)))?;
    if !headers.iter().any(|h| h.trim() == "domain") {
        return Err(DomainSweepError::file_error(
            &shown,
            "Ledger has no 'domain' column",
        ));
    }
    let extra_column = headers.iter().position(|h| h.trim() == "extra_json");

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (line_number, line) in lines {
        match parse_ledger_row(line, &headers, extra_column) {
            Ok(mut record) => {
                record.domain = record.domain.trim().to_lowercase();
                if record.domain.is_empty() {
                    skipped += 1;
                    continue;
                }
                records.push(record);
            }
            Err(reason) => {
                skipped += 1;
                warn!(path = %shown, line = line_number, %reason, "skipping unreadable ledger row");
            }
        }
    }

    if skipped > 0 {
        debug!(path = %shown, skipped, "ledger rows skipped during scan");
    }

    Ok(records)
}

fn parse_line(line: &[u8]) -> Result<csv::StringRecord, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line);
    let mut record = csv::StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(record)
}

fn parse_ledger_row(
    line: &[u8],
    headers: &csv::StringRecord,
    extra_column: Option<usize>,
) -> Result<DomainRecord, String> {
    let row = parse_line(line).map_err(|e| e.to_string())?;
    if row.len() != headers.len() {
        return Err(format!("expected {} fields, found {}", headers.len(), row.len()));
    }
    if let Some(column) = extra_column {
        let extra = row.get(column).unwrap_or_default();
        if serde_json::from_str::<serde::de::IgnoredAny>(extra).is_err() {
            return Err("extra_json is not valid JSON".to_string());
        }
    }
    row.deserialize::<DomainRecord>(Some(headers))
        .map_err(|e| e.to_string())
}

/// Serialize `records` in memory, then append them with one write.
fn append_rows(path: &Path, records: &[DomainRecord]) -> Result<(), DomainSweepError> {
    let shown = path.display().to_string();
    let io_err = |e: std::io::Error| DomainSweepError::file_error(&shown, e.to_string());

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();

    let mut buffer: Vec<u8> = Vec::new();
    let mut needs_header = len == 0;
    if len > 0 && !ends_with_newline(&mut file, len).map_err(io_err)? {
        buffer.push(b'\n');
        // nothing but a torn header so far
        needs_header = !has_newline(&mut file).map_err(io_err)?;
    }

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut buffer);
        if needs_header {
            writer.write_record(LEDGER_HEADERS)?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(io_err)?;
    }

    file.write_all(&buffer).map_err(io_err)?;
    file.flush().map_err(io_err)?;
    file.sync_data().map_err(io_err)?;

    Ok(())
}

fn has_newline(file: &mut File) -> std::io::Result<bool> {
    let mut existing = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut existing)?;
    Ok(existing.contains(&b'\n'))
}

fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

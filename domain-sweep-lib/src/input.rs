//! Loading of the base list and the TLD table.

use crate::error::DomainSweepError;
use crate::utils::{normalize_base, normalize_tld};
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Load the base list from a text file, one base per line.
///
/// # Errors
///
/// Returns `FileError` if the file cannot be read and `ConfigError` if it
/// contains no bases.
pub fn load_bases<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DomainSweepError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        DomainSweepError::file_error(
            path.to_string_lossy(),
            format!("Could not read base list: {}", e),
        )
    })?;

    let bases = parse_bases(&content);
    if bases.is_empty() {
        return Err(DomainSweepError::config(format!(
            "No bases found in '{}'",
            path.display()
        )));
    }

    debug!(path = %path.display(), bases = bases.len(), "loaded base list");
    Ok(bases)
}

/// Parse base names from text. Blank lines and `#` comments are skipped.
pub fn parse_bases(content: &str) -> Vec<String> {
    content.lines().filter_map(normalize_base).collect()
}

/// Load the TLD table from a CSV file with a `tld` column.
pub fn load_tlds<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DomainSweepError> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|e| {
        DomainSweepError::file_error(
            path.to_string_lossy(),
            format!("Could not open TLD table: {}", e),
        )
    })?;

    let tlds = parse_tlds(file, &path.to_string_lossy())?;
    debug!(path = %path.display(), tlds = tlds.len(), "loaded TLD table");
    Ok(tlds)
}

/// Parse a TLD table, keeping table order and dropping duplicates.
///
/// `source` names the input in error messages.
pub fn parse_tlds<R: Read>(reader: R, source: &str) -> Result<Vec<String>, DomainSweepError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let column = reader
        .headers()
        .map_err(|e| DomainSweepError::file_error(source, format!("Unreadable header: {}", e)))?
        .iter()
        .position(|h| h.eq_ignore_ascii_case("tld"))
        .ok_or_else(|| DomainSweepError::file_error(source, "TLD table has no 'tld' column"))?;

    let mut seen = HashSet::new();
    let mut tlds = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| DomainSweepError::file_error(source, e.to_string()))?;
        let Some(tld) = row.get(column).and_then(normalize_tld) else {
            continue;
        };
        if seen.insert(tld.clone()) {
            tlds.push(tld);
        }
    }

    Ok(tlds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_bases_skips_comments_and_blanks() {
        let bases = parse_bases("# wishlist\nAcme\n\n  rocket  \n#skip\nzeta\n");
        assert_eq!(bases, vec!["acme", "rocket", "zeta"]);
    }

    #[test]
    fn test_load_bases_empty_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();

        let err = load_bases(file.path()).unwrap_err();
        assert!(matches!(err, DomainSweepError::ConfigError { .. }));
    }

    #[test]
    fn test_load_bases_missing_file() {
        let err = load_bases("/nonexistent/bases.txt").unwrap_err();
        assert!(matches!(err, DomainSweepError::FileError { .. }));
    }

    #[test]
    fn test_parse_tlds_normalizes_and_dedupes() {
        let table = "tld,note\ncom,popular\n.NET,\n com ,dup\n,blank\nco.uk,multi\n";
        let tlds = parse_tlds(table.as_bytes(), "tlds.csv").unwrap();
        assert_eq!(tlds, vec!["com", "net", "co.uk"]);
    }

    #[test]
    fn test_parse_tlds_column_can_be_anywhere() {
        let table = "rank,tld\n1,io\n2,ai\n";
        let tlds = parse_tlds(table.as_bytes(), "tlds.csv").unwrap();
        assert_eq!(tlds, vec!["io", "ai"]);
    }

    #[test]
    fn test_parse_tlds_requires_tld_column() {
        let err = parse_tlds("extension\ncom\n".as_bytes(), "tlds.csv").unwrap_err();
        assert!(matches!(err, DomainSweepError::FileError { .. }));
    }

    #[test]
    fn test_load_tlds_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "tld\ncom\nnet\n").unwrap();
        file.flush().unwrap();

        assert_eq!(load_tlds(file.path()).unwrap(), vec!["com", "net"]);
    }
}

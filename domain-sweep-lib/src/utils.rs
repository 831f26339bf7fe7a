//! Utility functions for domain expansion and TLD handling.
//!
//! This module contains the pure helpers shared by the ledger, the batch
//! checker and the price join: turning bases into candidate domains,
//! partitioning candidates into batches and matching TLD suffixes.

use std::collections::HashSet;

/// Expand one base into its candidate domains.
///
/// In no-tlds mode the base is already a full domain and is returned as-is.
/// Otherwise one candidate per TLD is produced, in TLD table order, so the
/// batches sent for a base are reproducible between runs.
///
/// # Arguments
///
/// * `base` - Base name (e.g., "acme") or full domain in no-tlds mode
/// * `tlds` - TLDs in table order (e.g., ["com", "net"])
/// * `no_tlds` - Treat `base` as a complete domain
///
/// # Returns
///
/// Candidate domains. Empty when `tlds` is empty and `no_tlds` is false.
pub fn expand(base: &str, tlds: &[String], no_tlds: bool) -> Vec<String> {
    if no_tlds {
        return vec![base.to_string()];
    }

    tlds.iter().map(|tld| format!("{}.{}", base, tld)).collect()
}

/// Partition candidate domains into consecutive batches of at most `batch_size`.
///
/// A `batch_size` of zero is treated as one.
pub fn partition_batches(domains: &[String], batch_size: usize) -> Vec<&[String]> {
    domains.chunks(batch_size.max(1)).collect()
}

/// Normalize a base name read from user input.
///
/// Returns `None` for blank lines and `#` comments.
pub fn normalize_base(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Normalize a TLD value from a table cell ("  .COM " -> "com").
pub fn normalize_tld(raw: &str) -> Option<String> {
    let tld = raw.trim().trim_start_matches('.').to_lowercase();
    if tld.is_empty() {
        None
    } else {
        Some(tld)
    }
}

/// Find the TLD of `domain` by longest suffix match against `known`.
///
/// Labels are stripped from the left one at a time, so "shop.acme.co.uk"
/// tries "acme.co.uk", then "co.uk", then "uk". The whole domain is never
/// considered its own TLD.
///
/// # Example
///
/// ```rust
/// use domain_sweep_lib::extract_tld;
/// use std::collections::HashSet;
///
/// let known: HashSet<String> = ["uk", "co.uk"].iter().map(|s| s.to_string()).collect();
/// assert_eq!(extract_tld("acme.co.uk", &known), Some("co.uk"));
/// ```
pub fn extract_tld<'a>(domain: &'a str, known: &HashSet<String>) -> Option<&'a str> {
    let mut rest = domain;
    while let Some(dot) = rest.find('.') {
        rest = &rest[dot + 1..];
        if known.contains(rest) {
            return Some(rest);
        }
    }
    None
}

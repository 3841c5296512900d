//! Deterministic identifiers and version ordering for templates.
//!
//! Everything here is a pure function of its inputs: the reconciler looks
//! templates up by these names, so they must not drift between runs.

use semver::Version;

use crate::consts::{NAME_HASH_SUFFIX_LEN, TEMPLATE_NAME_MAX_LEN};
use crate::util::hash::hash_bytes;

/// Template name for a package folder of a catalog.
///
/// Lower-cases `<catalog>-<folder>`, replaces characters outside
/// `[a-z0-9-.]` with `-` and trims non-alphanumeric ends. Names longer than
/// the limit are cut and suffixed with a hash of the untruncated input.
pub fn template_name(catalog: &str, folder: &str) -> String {
  let raw = format!("{}-{}", catalog, folder).to_lowercase();

  let sanitized: String = raw
    .chars()
    .map(|c| {
      if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.' {
        c
      } else {
        '-'
      }
    })
    .collect();
  let name = sanitized.trim_matches(|c: char| !c.is_ascii_alphanumeric());

  if name.len() <= TEMPLATE_NAME_MAX_LEN {
    return name.to_string();
  }

  let hash = hash_bytes(raw.as_bytes());
  let keep = TEMPLATE_NAME_MAX_LEN - NAME_HASH_SUFFIX_LEN - 1;
  let head = name[..keep].trim_end_matches(|c: char| !c.is_ascii_alphanumeric());
  format!("{}-{}", head, hash.prefix(NAME_HASH_SUFFIX_LEN))
}

/// Name of the template-version resource for one version of a template.
pub fn template_version_name(template: &str, version: &str) -> String {
  format!("{}-{}", template, version.to_lowercase())
}

/// Parse a release version leniently.
///
/// Accepts a leading `v` and fills missing minor/patch components with zero
/// (`v1.2` -> `1.2.0`). Returns `None` for anything else that is not semver.
pub fn parse_version(raw: &str) -> Option<Version> {
  let trimmed = raw.trim();
  let s = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

  if let Ok(version) = Version::parse(s) {
    return Some(version);
  }

  let split = s.find(['-', '+']).unwrap_or(s.len());
  let (core, rest) = s.split_at(split);
  let parts: Vec<&str> = core.split('.').collect();
  if parts.len() > 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
    return None;
  }

  let mut padded = parts.join(".");
  for _ in parts.len()..3 {
    padded.push_str(".0");
  }
  Version::parse(&format!("{}{}", padded, rest)).ok()
}

/// Whether a release at `from` can be upgraded in place to `to`.
///
/// True only when both parse and `from` orders strictly before `to`.
pub fn is_upgradeable(from: &str, to: &str) -> bool {
  match (parse_version(from), parse_version(to)) {
    (Some(from), Some(to)) => from < to,
    _ => false,
  }
}

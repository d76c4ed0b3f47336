//! Best-effort parsing of URLs and raw header blocks.
//!
//! Nothing here fails: malformed input yields an empty or partial map.

use std::collections::BTreeMap;

use url::Url;

/// Query parameters of an absolute URL. Relative or unparsable URLs give
/// an empty map; a repeated key keeps its last value.
pub fn parse_query(url: &str) -> BTreeMap<String, String> {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        Err(_) => BTreeMap::new(),
    }
}

/// Parses a raw `name: value` header block (one header per line).
///
/// Lines are split on the first `": "`; a line without one maps to an empty
/// value. Blank lines and empty names are skipped.
pub fn parse_header_blob(raw: &str) -> BTreeMap<String, String> {
    raw.trim()
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (name, value) = line.split_once(": ").unwrap_or((line, ""));
            (!name.is_empty()).then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}

//! Header label normalization for schema-safe column names

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// How space characters in header labels are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceMode {
    /// Turn each space into an underscore
    Replace,
    /// Delete spaces entirely
    Remove,
}

impl FromStr for SpaceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("replace") {
            Ok(SpaceMode::Replace)
        } else if s.eq_ignore_ascii_case("remove") {
            Ok(SpaceMode::Remove)
        } else {
            Err(format!(
                "Header Row Spaces value must be either 'Replace' or 'Remove', got '{}'",
                s
            ))
        }
    }
}

impl std::fmt::Display for SpaceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpaceMode::Replace => write!(f, "Replace"),
            SpaceMode::Remove => write!(f, "Remove"),
        }
    }
}

/// Format a raw header label so it is usable as a target property name.
///
/// Spaces are handled per `mode`; everything that is punctuation or a symbol
/// other than underscore and hyphen is stripped, as are CR / LF characters.
pub fn format_column_name(name: &str, mode: SpaceMode) -> String {
    if name.trim().is_empty() {
        return String::new();
    }

    let spaced = match mode {
        SpaceMode::Replace => name.replace(' ', "_"),
        SpaceMode::Remove => name.replace(' ', ""),
    };

    invalid_chars().replace_all(&spaced, "").into_owned()
}

fn invalid_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[[\r\n\p{P}\p{S}]--[\-_]]").expect("column name pattern")
    })
}

/// Header-scan bookkeeping for one logical spreadsheet column.
///
/// Holds every sheet column whose header normalizes to the same name, so
/// duplicate header labels merge into a single output column.
#[derive(Debug, Clone)]
pub(crate) struct ColumnDefinition {
    pub name: String,
    pub source_columns: Vec<usize>,
}

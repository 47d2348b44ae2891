//! Work code resolution and display naming.
//!
//! A unit of work is identified either by a catalog (standard) code or by a
//! free-form "other work" code. The two are mutually exclusive on every
//! planning, report, addition and removal record.

use serde::{Deserialize, Serialize};

/// Grouping key used when a record carries no code at all.
pub const UNKNOWN_WORK_CODE: &str = "unknown";

/// Placeholder for an absent order reference.
pub const NOT_AVAILABLE: &str = "N/A";

/// Separator placed between a work name and its type description.
pub const NAME_SEPARATOR: &str = " - ";

/// A resolved work code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum WorkCode {
    /// Catalog code derived from the standard work master.
    Standard(String),
    /// Non-standard code entered for one-off work.
    Other(String),
}

impl WorkCode {
    /// Resolve a code from the two mutually exclusive record columns.
    ///
    /// Blank strings count as absent. Returns `Ok(None)` when neither is set.
    pub fn from_parts(
        derived_code: Option<&str>,
        other_code: Option<&str>,
    ) -> Result<Option<Self>, String> {
        match (non_blank(derived_code), non_blank(other_code)) {
            (Some(_), Some(_)) => Err(
                "A work item cannot have both a standard code and an other-work code".to_string(),
            ),
            (Some(code), None) => Ok(Some(Self::Standard(code.to_string()))),
            (None, Some(code)) => Ok(Some(Self::Other(code.to_string()))),
            (None, None) => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard(code) | Self::Other(code) => code,
        }
    }

    pub fn is_standard(&self) -> bool {
        matches!(self, Self::Standard(_))
    }
}

impl std::fmt::Display for WorkCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the grouping key for a record.
///
/// Precedence: other-work code, derived standard code, raw standard code,
/// then [`UNKNOWN_WORK_CODE`].
pub fn grouping_key(
    other_code: Option<&str>,
    derived_code: Option<&str>,
    raw_standard_code: Option<&str>,
) -> String {
    non_blank(other_code)
        .or_else(|| non_blank(derived_code))
        .or_else(|| non_blank(raw_standard_code))
        .unwrap_or(UNKNOWN_WORK_CODE)
        .to_string()
}

/// Build the display name of a work item.
///
/// Non-standard work uses its description, falling back to the code itself.
/// Standard work uses the catalog name. A non-blank type description is
/// appended only when a base name exists.
pub fn work_name(
    other_code: Option<&str>,
    other_description: Option<&str>,
    standard_name: Option<&str>,
    type_description: Option<&str>,
) -> Option<String> {
    let base = match non_blank(other_code) {
        Some(code) => Some(non_blank(other_description).unwrap_or(code)),
        None => non_blank(standard_name),
    }?;

    Some(match non_blank(type_description) {
        Some(kind) => format!("{base}{NAME_SEPARATOR}{kind}"),
        None => base.to_string(),
    })
}

/// Render an optional order reference, substituting [`NOT_AVAILABLE`].
pub fn order_ref(reference: Option<&str>) -> String {
    non_blank(reference).unwrap_or(NOT_AVAILABLE).to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

//! Type definitions for HamQTH lookup results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Callbook details for one station, flattened for QSO logging.
///
/// Optional fields are left out entirely when HamQTH has nothing for them,
/// both here and in the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    /// Normalized (trimmed, upper-case) call sign that was queried
    pub call_sign: String,

    /// Operator name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// City or QTH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// State (USA only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Country name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// CQ zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cq_zone: Option<String>,

    /// ITU zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itu_zone: Option<String>,

    /// Maidenhead grid locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<String>,
}

impl LookupResult {
    /// Build a result from the raw `<search>` fields of a lookup response.
    ///
    /// Postal address fields are preferred over the free-form ones
    /// (`adr_name` over `nick`, `adr_city` over `qth`).
    pub fn from_fields(call_sign: impl Into<String>, fields: &BTreeMap<String, String>) -> Self {
        let pick = |names: &[&str]| names.iter().find_map(|n| fields.get(*n).cloned());

        Self {
            call_sign: call_sign.into(),
            name: pick(&["adr_name", "nick"]),
            city: pick(&["adr_city", "qth"]),
            state: pick(&["us_state"]),
            country: pick(&["country", "adr_country"]),
            cq_zone: pick(&["cq"]),
            itu_zone: pick(&["itu"]),
            grid: pick(&["grid"]),
        }
    }

    /// City, state and country joined with commas, skipping missing parts
    pub fn location(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

//! Interpretation of decoded HamQTH responses.
//!
//! HamQTH signals every problem in-band: the HTTP status is 200 and the body
//! carries `<session><error>...</error></session>`. The helpers here pull the
//! interesting pieces out of the tree and sort error text into the handful of
//! cases the client reacts to differently.

use crate::error::{HamQthError, Result};
use crate::xml::XmlNode;
use std::collections::BTreeMap;

/// Wrapper element for session status and errors
pub const SESSION_ELEMENT: &str = "session";
/// Session identifier inside a login response
pub const SESSION_ID_ELEMENT: &str = "session_id";
/// Error message element
pub const ERROR_ELEMENT: &str = "error";
/// Wrapper element for lookup results
pub const SEARCH_ELEMENT: &str = "search";

/// `<search>` children copied out of a lookup response
///
/// The queried call sign is not among them: results always carry the
/// normalized input instead of HamQTH's lower-cased echo.
pub const LOOKUP_FIELDS: &[&str] = &[
    "nick",
    "qth",
    "country",
    "adr_name",
    "adr_city",
    "adr_country",
    "us_state",
    "grid",
    "cq",
    "itu",
];

/// How the client should react to an error message from HamQTH
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// The session id is unknown or expired; log in again and retry
    SessionExpired,
    /// No record exists for the call sign
    NotFound,
    /// Anything else, passed through verbatim
    Other(String),
}

/// Case-insensitive phrase lists used to classify error messages.
///
/// HamQTH does not document its error wording, so the defaults cover the
/// messages it is known to send and callers may extend either list.
#[derive(Debug, Clone)]
pub struct ErrorMatchers {
    /// Phrases meaning the session id is invalid or expired
    pub session_expired: Vec<String>,
    /// Phrases meaning the call sign has no record
    pub not_found: Vec<String>,
}

impl Default for ErrorMatchers {
    fn default() -> Self {
        Self {
            session_expired: vec![
                "session does not exist".to_string(),
                "session expired".to_string(),
                "or expired".to_string(),
                "invalid session".to_string(),
                "session timeout".to_string(),
            ],
            not_found: vec![
                "not found".to_string(),
                "no data".to_string(),
                "no record".to_string(),
            ],
        }
    }
}

impl ErrorMatchers {
    /// Add a phrase that marks a session error
    pub fn with_session_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.session_expired.push(phrase.into());
        self
    }

    /// Add a phrase that marks a not-found error
    pub fn with_not_found_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.not_found.push(phrase.into());
        self
    }

    /// True if the message reports an invalid or expired session
    pub fn is_session_error(&self, message: &str) -> bool {
        contains_any(message, &self.session_expired)
    }

    /// True if the message reports that the call sign has no record
    pub fn is_not_found_error(&self, message: &str) -> bool {
        contains_any(message, &self.not_found)
    }

    /// Sort a message into an [`ErrorClass`]; session errors win over not-found
    pub fn classify(&self, message: &str) -> ErrorClass {
        if self.is_session_error(message) {
            ErrorClass::SessionExpired
        } else if self.is_not_found_error(message) {
            ErrorClass::NotFound
        } else {
            ErrorClass::Other(message.to_string())
        }
    }
}

fn contains_any(message: &str, phrases: &[String]) -> bool {
    let message = message.to_lowercase();
    phrases
        .iter()
        .any(|phrase| message.contains(&phrase.to_lowercase()))
}

/// Trim `value`, failing with a validation error naming `field_label` when
/// it is absent or blank.
pub fn require_nonblank_text(value: Option<&str>, field_label: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(HamQthError::validation(field_label)),
    }
}

fn nonblank(value: &str) -> Option<String> {
    require_nonblank_text(Some(value), "").ok()
}

/// The trimmed error message, if the response carries a non-blank one.
///
/// Looks at `session/error` first and falls back to any `error` element.
pub fn extract_error_message(root: &XmlNode) -> Option<String> {
    let path = format!("{}/{}", SESSION_ELEMENT, ERROR_ELEMENT);
    root.find(&path)
        .or_else(|| root.descendant(ERROR_ELEMENT))
        .and_then(|node| nonblank(node.text()))
}

/// The session id from a login response, if present and non-blank
pub fn extract_session_token(root: &XmlNode) -> Option<String> {
    let path = format!("{}/{}", SESSION_ELEMENT, SESSION_ID_ELEMENT);
    root.find(&path)
        .or_else(|| root.descendant(SESSION_ID_ELEMENT))
        .and_then(|node| nonblank(node.text()))
}

/// Known `<search>` fields with non-blank text, keyed by element name.
///
/// Returns `None` when the response has no `<search>` element at all.
pub fn extract_lookup_fields(root: &XmlNode) -> Option<BTreeMap<String, String>> {
    let search = root
        .child(SEARCH_ELEMENT)
        .or_else(|| root.descendant(SEARCH_ELEMENT))?;

    let fields: BTreeMap<String, String> = LOOKUP_FIELDS
        .iter()
        .filter_map(|name| {
            let value = nonblank(search.child_text(name)?)?;
            Some((name.to_string(), value))
        })
        .collect();

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_xml;

    #[test]
    fn test_require_nonblank_text() {
        assert_eq!(require_nonblank_text(Some("AG5XY"), "call sign").unwrap(), "AG5XY");
        assert_eq!(
            require_nonblank_text(Some("    AG5XY   "), "call sign").unwrap(),
            "AG5XY"
        );

        let err = require_nonblank_text(Some("      "), "call sign").unwrap_err();
        assert!(err.to_string().to_lowercase().contains("call sign"));

        let err = require_nonblank_text(None, "call sign").unwrap_err();
        assert!(matches!(err, HamQthError::Validation { .. }));
        assert!(err.to_string().to_lowercase().contains("call sign"));
    }

    #[test]
    fn test_extract_error_message() {
        let root = parse_xml("<HamQTH><session><error>...  </error></session></HamQTH>").unwrap();
        assert_eq!(extract_error_message(&root), Some("...".to_string()));

        let root = parse_xml("<HamQTH><session></session></HamQTH>").unwrap();
        assert_eq!(extract_error_message(&root), None);

        let root = parse_xml("<HamQTH><session><error></error></session></HamQTH>").unwrap();
        assert_eq!(extract_error_message(&root), None);

        let root = parse_xml("<HamQTH><session><error>  \n </error></session></HamQTH>").unwrap();
        assert_eq!(extract_error_message(&root), None);
    }

    #[test]
    fn test_extract_error_outside_session() {
        let root = parse_xml("<HamQTH><error>Callsign not found</error></HamQTH>").unwrap();
        assert_eq!(
            extract_error_message(&root),
            Some("Callsign not found".to_string())
        );
    }

    #[test]
    fn test_extract_session_token() {
        let root = parse_xml(
            "<HamQTH><session><session_id> 09b0ae90050be03c452ad235a1f2915ad684393c </session_id></session></HamQTH>",
        )
        .unwrap();
        assert_eq!(
            extract_session_token(&root),
            Some("09b0ae90050be03c452ad235a1f2915ad684393c".to_string())
        );

        let root = parse_xml("<HamQTH><session><session_id/></session></HamQTH>").unwrap();
        assert_eq!(extract_session_token(&root), None);
    }

    #[test]
    fn test_extract_lookup_fields_omits_absent_and_blank() {
        let root = parse_xml(
            "<HamQTH><search><callsign>ok7an</callsign><nick>Petr</nick><qth> </qth><cq>15</cq><web>x</web></search></HamQTH>",
        )
        .unwrap();
        let fields = extract_lookup_fields(&root).unwrap();
        assert!(!fields.contains_key("callsign"));
        assert_eq!(fields.get("nick").map(String::as_str), Some("Petr"));
        assert_eq!(fields.get("cq").map(String::as_str), Some("15"));
        assert!(!fields.contains_key("qth"));
        assert!(!fields.contains_key("itu"));
        assert!(!fields.contains_key("web"));

        let root = parse_xml("<HamQTH><session/></HamQTH>").unwrap();
        assert!(extract_lookup_fields(&root).is_none());
    }

    #[test]
    fn test_classification() {
        let matchers = ErrorMatchers::default();
        assert_eq!(
            matchers.classify("Session does not exist or expired"),
            ErrorClass::SessionExpired
        );
        assert_eq!(matchers.classify("Callsign not found"), ErrorClass::NotFound);
        assert_eq!(
            matchers.classify("Wrong user name or password"),
            ErrorClass::Other("Wrong user name or password".to_string())
        );
        assert!(matchers.is_session_error("INVALID SESSION"));
        assert!(!matchers.is_not_found_error("Session does not exist or expired"));
    }

    #[test]
    fn test_matchers_are_extendable() {
        let matchers = ErrorMatchers::default()
            .with_session_phrase("please log in")
            .with_not_found_phrase("unknown callsign");
        assert_eq!(matchers.classify("Please log in"), ErrorClass::SessionExpired);
        assert_eq!(matchers.classify("Unknown callsign"), ErrorClass::NotFound);
    }
}

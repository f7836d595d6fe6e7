use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::FetchError;

/// Status recorded when no HTTP exchange completed.
pub const HTTP_CODE_UNAVAILABLE: u16 = 100;

/// Header carrying the shared secret expected by the retention system.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// One outbound alert lookup, built per render and never stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRequest {
    pub user_name: String,
    pub api_token: String,
}

impl AlertRequest {
    pub fn new(user_name: &str, api_token: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            api_token: api_token.to_string(),
        }
    }

    /// Headers sent with every lookup
    pub fn headers(&self) -> Result<HeaderMap, FetchError> {
        let api_key = HeaderValue::from_str(&self.api_token)
            .map_err(|e| FetchError::Request(format!("invalid API token header: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static("x-api-key"), api_key);
        Ok(headers)
    }
}

/// Unread alert count for one course section
///
/// Expected on the wire as:
///
/// ```json
/// {
///   "title": "Intro Website Design",
///   "short_name": "ART.152.M02",
///   "url": "https://retention.midmich.edu/instructor/course_sections/55134",
///   "unread_count": 0
/// }
/// ```
///
/// Loosely typed values are coerced: `null` strings become `""`, numeric
/// strings are parsed, and negative counts clamp to `0`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CourseSectionAlert {
    #[serde(deserialize_with = "lenient_string")]
    pub short_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_count")]
    pub unread_count: u64,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!("expected a string, found {}", other))),
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => Ok(n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(|count| count.max(0) as u64)
            .map_err(|_| de::Error::custom(format!("expected a count, found \"{}\"", s))),
        other => Err(de::Error::custom(format!("expected a count, found {}", other))),
    }
}

/// Parse `course_sections` entry by entry, dropping entries that still do not
/// fit instead of failing the whole body.
fn lenient_sections<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<CourseSectionAlert>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(de::Error::custom(format!(
                "course_sections must be an array, found {}",
                other
            )));
        }
    };

    let sections = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(section) => Some(section),
            Err(e) => {
                log::warn!("Skipping course section #{}: {}", index, e);
                None
            }
        })
        .collect();

    Ok(Some(sections))
}

impl CourseSectionAlert {
    /// `"<short_name> <title> (<unread_count>)"`
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.short_name, self.title, self.unread_count)
    }

    pub fn has_unread(&self) -> bool {
        self.unread_count != 0
    }
}

/// Outcome of one lookup. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertResult {
    pub sections: Vec<CourseSectionAlert>,
    pub http_code: u16,
    /// Empty means the data branch is authoritative.
    pub error_message: String,
}

impl AlertResult {
    pub fn is_error(&self) -> bool {
        !self.error_message.is_empty()
    }
}

impl Default for AlertResult {
    fn default() -> Self {
        RawAlerts::default().normalize()
    }
}

/// Partially filled lookup outcome, as assembled while talking to the remote
/// system. `normalize` fills every gap.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawAlerts {
    #[serde(default, deserialize_with = "lenient_sections")]
    pub course_sections: Option<Vec<CourseSectionAlert>>,
    #[serde(skip)]
    pub http_code: Option<u16>,
    #[serde(skip)]
    pub error: Option<String>,
}

impl RawAlerts {
    /// Parse a response body. Fields other than `course_sections` are ignored,
    /// including any `error` the remote side sends.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    pub fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }

    pub fn normalize(self) -> AlertResult {
        AlertResult {
            sections: self.course_sections.unwrap_or_default(),
            http_code: self.http_code.unwrap_or(HTTP_CODE_UNAVAILABLE),
            error_message: self.error.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"course_sections":[{"title":"Intro Website Design",
        "short_name":"ART.152.M02","url":"https://x/55134","unread_count":0}]}"#;

    #[test]
    fn test_parse_sample_body() {
        let raw = RawAlerts::from_json(SAMPLE).unwrap();
        let sections = raw.course_sections.unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].short_name, "ART.152.M02");
        assert_eq!(sections[0].label(), "ART.152.M02 Intro Website Design (0)");
        assert!(!sections[0].has_unread());
    }

    #[test]
    fn test_normalize_fills_missing_fields() {
        let result = RawAlerts::from_json(r#"{"something_else": true}"#)
            .unwrap()
            .normalize();
        assert!(result.sections.is_empty());
        assert_eq!(result.http_code, HTTP_CODE_UNAVAILABLE);
        assert_eq!(result.error_message, "");
        assert!(!result.is_error());
    }

    #[test]
    fn test_remote_error_field_is_ignored() {
        let raw = RawAlerts::from_json(r#"{"error":"user not found"}"#).unwrap();
        assert!(raw.error.is_none());
        assert!(raw.course_sections.is_none());
    }

    #[test]
    fn test_null_sections_treated_as_absent() {
        let result = RawAlerts::from_json(r#"{"course_sections":null}"#)
            .unwrap()
            .normalize();
        assert!(result.sections.is_empty());
    }

    #[test]
    fn test_section_missing_fields_defaults() {
        let raw = RawAlerts::from_json(r#"{"course_sections":[{"title":"Biology"}]}"#).unwrap();
        let section = &raw.course_sections.unwrap()[0];
        assert_eq!(section.title, "Biology");
        assert_eq!(section.short_name, "");
        assert_eq!(section.unread_count, 0);
    }

    #[test]
    fn test_ill_typed_section_does_not_hide_the_others() {
        let body = r#"{"course_sections":[
            {"title":"Biology","short_name":"BIO.101","url":"https://x/1","unread_count":4},
            {"title":null,"short_name":"CHM.110","url":"https://x/2","unread_count":-1},
            {"title":"Algebra","short_name":"MTH.120","url":"https://x/3","unread_count":"3"}
        ]}"#;
        let sections = RawAlerts::from_json(body).unwrap().normalize().sections;

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].unread_count, 4);
        assert_eq!(sections[1].title, "");
        assert_eq!(sections[1].unread_count, 0);
        assert_eq!(sections[2].unread_count, 3);
    }

    #[test]
    fn test_unusable_section_is_skipped() {
        let body = r#"{"course_sections":[
            {"title":"Biology","short_name":"BIO.101","url":"https://x/1","unread_count":4},
            "not a section",
            {"title":["nested"],"short_name":"CHM.110"},
            {"title":"Algebra","unread_count":"many"}
        ]}"#;
        let sections = RawAlerts::from_json(body).unwrap().normalize().sections;

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].short_name, "BIO.101");
    }

    #[test]
    fn test_sections_must_be_an_array() {
        assert!(RawAlerts::from_json(r#"{"course_sections":"none"}"#).is_err());
    }

    #[test]
    fn test_failed_keeps_message() {
        let result = RawAlerts::failed("boom".to_string()).normalize();
        assert!(result.is_error());
        assert_eq!(result.error_message, "boom");
        assert_eq!(result.http_code, HTTP_CODE_UNAVAILABLE);
        assert!(result.sections.is_empty());
    }

    #[test]
    fn test_non_object_bodies_do_not_parse() {
        assert!(RawAlerts::from_json("<html>oops</html>").is_err());
        assert!(RawAlerts::from_json("[1,2]").is_err());
        assert!(RawAlerts::from_json("").is_err());
    }

    #[test]
    fn test_headers() {
        let headers = AlertRequest::new("jdoe", "s3cret").headers().unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "s3cret");
    }

    #[test]
    fn test_headers_reject_control_characters() {
        let err = AlertRequest::new("jdoe", "bad\ntoken").headers().unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }
}

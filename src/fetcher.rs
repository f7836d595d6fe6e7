/// # Alert fetcher
///
/// One synchronous GET per call against the retention system, turned into an
/// always-populated `AlertResult`. Non-2xx statuses count as a completed
/// exchange; only failures to complete the exchange become an error row.
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use std::time::Duration;

use crate::config::RetentionConfig;
use crate::errors::{ConfigError, FetchError, RetentionError};
use crate::types::{AlertRequest, AlertResult, RawAlerts};

/// Placeholder replaced by the (escaped) user name.
pub const USER_NAME_PLACEHOLDER: &str = "{{user_name}}";

/// Endpoint URL with a `{{user_name}}` path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
}

impl UrlTemplate {
    /// Validate a template: it must contain the placeholder and expand to an
    /// absolute http(s) URL.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if !raw.contains(USER_NAME_PLACEHOLDER) {
            return Err(ConfigError::InvalidTemplate(format!(
                "'{}' has no {} placeholder",
                raw, USER_NAME_PLACEHOLDER
            )));
        }

        let template = Self {
            raw: raw.to_string(),
        };
        let sample = template
            .expand("user")
            .map_err(|e| ConfigError::InvalidTemplate(format!("'{}': {}", raw, e)))?;
        if !matches!(sample.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidTemplate(format!(
                "'{}' must use http or https",
                raw
            )));
        }

        Ok(template)
    }

    /// Substitute the user name as a single, percent-encoded path segment
    pub fn expand(&self, user_name: &str) -> Result<Url, FetchError> {
        let segment = encode_path_segment(user_name)?;
        let url = self.raw.replace(USER_NAME_PLACEHOLDER, &segment);
        Url::parse(&url).map_err(|e| FetchError::Request(format!("invalid URL {}: {}", url, e)))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Percent-encode `value` so it stays inside one path segment. `.` and `..`
/// collapse to an empty segment.
fn encode_path_segment(value: &str) -> Result<String, FetchError> {
    let mut scratch = Url::parse("http://localhost/")
        .map_err(|e| FetchError::Request(e.to_string()))?;
    scratch
        .path_segments_mut()
        .map_err(|_| FetchError::Request("URL cannot hold path segments".to_string()))?
        .clear()
        .push(value);
    Ok(scratch.path().trim_start_matches('/').to_string())
}

/// Completed HTTP exchange, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Issues the single GET. Implementations must not treat a non-2xx status as
/// an error.
pub trait Transport {
    fn get(&self, url: &Url, headers: HeaderMap) -> Result<TransportResponse, FetchError>;
}

/// Production transport over a blocking reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// The timeout bounds both connecting and the whole exchange
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &Url, headers: HeaderMap) -> Result<TransportResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

pub struct AlertFetcher<T: Transport = ReqwestTransport> {
    template: UrlTemplate,
    api_token: String,
    reject_malformed_body: bool,
    transport: T,
}

impl AlertFetcher<ReqwestTransport> {
    /// Create a fetcher talking to the configured endpoint over HTTP
    pub fn new(config: &RetentionConfig) -> Result<Self, RetentionError> {
        let transport = ReqwestTransport::new(config.endpoint.timeout())?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> AlertFetcher<T> {
    pub fn with_transport(config: &RetentionConfig, transport: T) -> Result<Self, RetentionError> {
        config.validate()?;
        let template = UrlTemplate::parse(&config.endpoint.url_template)?;

        Ok(Self {
            template,
            api_token: config.endpoint.token.clone(),
            reject_malformed_body: config.response.reject_malformed_body,
            transport,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }

    /// Fetch alerts for `user_name` with the configured API token
    pub fn fetch(&self, user_name: &str) -> AlertResult {
        self.fetch_alerts(user_name, &self.api_token)
    }

    /// Fetch alerts for `user_name`. Never fails: every failure is folded into
    /// `error_message`.
    pub fn fetch_alerts(&self, user_name: &str, api_token: &str) -> AlertResult {
        let request = AlertRequest::new(user_name, api_token);

        let raw = match self.request(&request) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Retention alert lookup for '{}' failed: {}", user_name, e);
                RawAlerts::failed(e.user_message())
            }
        };

        raw.normalize()
    }

    fn request(&self, request: &AlertRequest) -> Result<RawAlerts, FetchError> {
        let url = self.template.expand(&request.user_name)?;
        let headers = request.headers()?;

        log::debug!("Fetching retention alerts from {}", url);
        let response = self.transport.get(&url, headers)?;
        log::debug!(
            "Retention system answered HTTP {} ({} bytes)",
            response.status,
            response.body.len()
        );

        let mut raw = match RawAlerts::from_json(&response.body) {
            Ok(raw) => raw,
            Err(e) if self.reject_malformed_body => return Err(e.into()),
            Err(e) => {
                log::warn!("Ignoring unparseable retention response: {}", e);
                RawAlerts::default()
            }
        };

        raw.http_code = Some(response.status);
        raw.error = Some(String::new());
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::fetch::{MALFORMED_RESPONSE_MESSAGE, TRANSPORT_FAILURE_MESSAGE};
    use crate::types::HTTP_CODE_UNAVAILABLE;
    use std::cell::RefCell;

    /// Replays a fixed outcome and remembers what it was asked for
    struct StubTransport {
        outcome: Result<TransportResponse, String>,
        seen: RefCell<Vec<(String, HeaderMap)>>,
    }

    impl StubTransport {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                outcome: Ok(TransportResponse {
                    status,
                    body: body.to_string(),
                }),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                outcome: Err(reason.to_string()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for StubTransport {
        fn get(&self, url: &Url, headers: HeaderMap) -> Result<TransportResponse, FetchError> {
            self.seen.borrow_mut().push((url.to_string(), headers));
            self.outcome.clone().map_err(FetchError::Transport)
        }
    }

    fn config() -> RetentionConfig {
        let mut config = RetentionConfig::default();
        config.endpoint.token = "s3cret".to_string();
        config
    }

    fn fetcher(transport: StubTransport) -> AlertFetcher<StubTransport> {
        AlertFetcher::with_transport(&config(), transport).unwrap()
    }

    const ONE_SECTION: &str = r#"{"course_sections":[{"title":"Intro Website Design",
        "short_name":"ART.152.M02","url":"https://x/55134","unread_count":0}]}"#;

    #[test]
    fn test_success_records_status_and_sections() {
        let result = fetcher(StubTransport::answering(200, ONE_SECTION)).fetch("jdoe");
        assert_eq!(result.http_code, 200);
        assert_eq!(result.error_message, "");
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].title, "Intro Website Design");
    }

    #[test]
    fn test_request_shape() {
        let fetcher = fetcher(StubTransport::answering(200, ONE_SECTION));
        fetcher.fetch("jdoe");

        let seen = fetcher.transport.seen.borrow();
        assert_eq!(seen.len(), 1);
        let (url, headers) = &seen[0];
        assert_eq!(
            url,
            "https://retention.midmich.edu/instructor/users/jdoe/course_sections.json"
        );
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(headers.get("x-api-key").unwrap(), "s3cret");
    }

    #[test]
    fn test_explicit_token_overrides_configured_one() {
        let fetcher = fetcher(StubTransport::answering(200, ONE_SECTION));
        fetcher.fetch_alerts("jdoe", "other-token");
        let seen = fetcher.transport.seen.borrow();
        assert_eq!(seen[0].1.get("x-api-key").unwrap(), "other-token");
    }

    #[test]
    fn test_transport_failure() {
        let result = fetcher(StubTransport::failing("operation timed out")).fetch("jdoe");
        assert_eq!(result.error_message, TRANSPORT_FAILURE_MESSAGE);
        assert!(result.sections.is_empty());
        assert_eq!(result.http_code, HTTP_CODE_UNAVAILABLE);
    }

    #[test]
    fn test_non_success_status_is_not_an_error() {
        let result =
            fetcher(StubTransport::answering(404, r#"{"error":"no such user"}"#)).fetch("ghost");
        assert!(!result.is_error());
        assert_eq!(result.http_code, 404);
        assert!(result.sections.is_empty());
    }

    #[test]
    fn test_malformed_body_is_silent_by_default() {
        let result =
            fetcher(StubTransport::answering(502, "<html>Bad Gateway</html>")).fetch("jdoe");
        assert!(!result.is_error());
        assert!(result.sections.is_empty());
        assert_eq!(result.http_code, 502);
    }

    #[test]
    fn test_malformed_body_surfaced_when_configured() {
        let mut config = config();
        config.response.reject_malformed_body = true;
        let fetcher = AlertFetcher::with_transport(
            &config,
            StubTransport::answering(200, "not json"),
        )
        .unwrap();

        let result = fetcher.fetch("jdoe");
        assert_eq!(result.error_message, MALFORMED_RESPONSE_MESSAGE);
        assert!(result.sections.is_empty());
        assert_eq!(result.http_code, HTTP_CODE_UNAVAILABLE);
    }

    #[test]
    fn test_bad_token_becomes_request_error_without_a_call() {
        let fetcher = fetcher(StubTransport::answering(200, ONE_SECTION));
        let result = fetcher.fetch_alerts("jdoe", "line\nbreak");
        assert!(result.error_message.starts_with("Remote call failed (request error)"));
        assert!(fetcher.transport.seen.borrow().is_empty());
    }

    #[test]
    fn test_identical_inputs_give_identical_results() {
        let fetcher = fetcher(StubTransport::answering(200, ONE_SECTION));
        assert_eq!(fetcher.fetch("jdoe"), fetcher.fetch("jdoe"));

        let failing = self::fetcher(StubTransport::failing("refused"));
        assert_eq!(failing.fetch("jdoe"), failing.fetch("jdoe"));
    }

    #[test]
    fn test_one_ill_typed_section_keeps_the_rest() {
        let body = r#"{"course_sections":[
            {"title":"Biology","short_name":"BIO.101","url":"https://x/1","unread_count":2},
            {"title":null,"short_name":"CHM.110","url":"https://x/2","unread_count":"5"}
        ]}"#;
        let result = fetcher(StubTransport::answering(200, body)).fetch("jdoe");

        assert!(!result.is_error());
        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.sections[1].unread_count, 5);
    }

    #[test]
    fn test_missing_sections_field_normalized() {
        let result = fetcher(StubTransport::answering(200, "{}")).fetch("jdoe");
        assert!(result.sections.is_empty());
        assert_eq!(result.http_code, 200);
        assert_eq!(result.error_message, "");
    }

    #[test]
    fn test_user_name_is_escaped() {
        let template = UrlTemplate::parse(crate::config::DEFAULT_URL_TEMPLATE).unwrap();
        let url = template.expand("jane doe/../admin").unwrap();
        assert_eq!(
            url.path(),
            "/instructor/users/jane%20doe%2F..%2Fadmin/course_sections.json"
        );
    }

    #[test]
    fn test_dot_segments_collapse() {
        let template = UrlTemplate::parse(crate::config::DEFAULT_URL_TEMPLATE).unwrap();
        let url = template.expand("..").unwrap();
        assert_eq!(url.path(), "/instructor/users//course_sections.json");
    }

    #[test]
    fn test_template_validation() {
        assert!(UrlTemplate::parse("https://h/users/{{user_name}}.json").is_ok());
        assert!(matches!(
            UrlTemplate::parse("https://h/users.json"),
            Err(ConfigError::InvalidTemplate(_))
        ));
        assert!(matches!(
            UrlTemplate::parse("ftp://h/{{user_name}}"),
            Err(ConfigError::InvalidTemplate(_))
        ));
        assert!(matches!(
            UrlTemplate::parse("/relative/{{user_name}}"),
            Err(ConfigError::InvalidTemplate(_))
        ));
    }
}

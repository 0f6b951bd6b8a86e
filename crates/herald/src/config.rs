//! Run configuration for the notification pipeline.
//!
//! Configuration arrives as raw string key/value pairs (from a config file,
//! the environment, or a host's credential store) and is resolved exactly once
//! into a typed [`RunConfiguration`]. Nothing downstream ever looks at the raw
//! strings again.
//!
//! Recognised keys:
//!
//! | key                               | type             | default                  |
//! |-----------------------------------|------------------|--------------------------|
//! | `username`                        | string, required |                          |
//! | `token`                           | secret, required |                          |
//! | `mark_as_read`                    | bool             | `true`                   |
//! | `add_release_details`             | bool             | `true`                   |
//! | `regex_filter_tag`                | regex            | none                     |
//! | `expected_receive_period_in_days` | integer > 0      | required                 |
//! | `dedupe_acknowledgements`         | bool             | `false`                  |
//! | `request_timeout_secs`            | integer > 0      | `30`                     |
//! | `api_base`                        | http(s) URL      | `https://api.github.com` |

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::TagFilter;

/// Raw configuration as handed over by the host.
pub type RawOptions = BTreeMap<String, String>;

/// Configuration key names.
pub mod keys {
    pub const USERNAME: &str = "username";
    pub const TOKEN: &str = "token";
    pub const MARK_AS_READ: &str = "mark_as_read";
    pub const ADD_RELEASE_DETAILS: &str = "add_release_details";
    pub const REGEX_FILTER_TAG: &str = "regex_filter_tag";
    pub const EXPECTED_RECEIVE_PERIOD_IN_DAYS: &str = "expected_receive_period_in_days";
    pub const DEDUPE_ACKNOWLEDGEMENTS: &str = "dedupe_acknowledgements";
    pub const REQUEST_TIMEOUT_SECS: &str = "request_timeout_secs";
    pub const API_BASE: &str = "api_base";

    /// Every recognised key, in documentation order.
    pub const ALL: [&str; 9] = [
        USERNAME,
        TOKEN,
        MARK_AS_READ,
        ADD_RELEASE_DETAILS,
        REGEX_FILTER_TAG,
        EXPECTED_RECEIVE_PERIOD_IN_DAYS,
        DEDUPE_ACKNOWLEDGEMENTS,
        REQUEST_TIMEOUT_SECS,
        API_BASE,
    ];
}

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_EXPECTED_RECEIVE_PERIOD_IN_DAYS: u32 = 2;

/// The options a freshly created instance starts out with.
pub fn default_options() -> RawOptions {
    [
        (keys::USERNAME, String::new()),
        (keys::TOKEN, String::new()),
        (
            keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS,
            DEFAULT_EXPECTED_RECEIVE_PERIOD_IN_DAYS.to_string(),
        ),
        (keys::MARK_AS_READ, "true".to_string()),
        (keys::ADD_RELEASE_DETAILS, "true".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// A credential that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The underlying value, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

/// A single validation failure, always tied to one configuration key.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} is a required field")]
    Missing { field: &'static str },

    #[error("if provided, {field} must be true or false (got {value:?})")]
    InvalidBool { field: &'static str, value: String },

    #[error("{field} must be a positive integer (got {value:?})")]
    InvalidPositiveInteger { field: &'static str, value: String },

    #[error("{field} is not a valid regular expression: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("{field} must be an http(s) URL (got {value:?})")]
    InvalidUrl { field: &'static str, value: String },
}

impl ConfigError {
    /// The configuration key this error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::Missing { field }
            | ConfigError::InvalidBool { field, .. }
            | ConfigError::InvalidPositiveInteger { field, .. }
            | ConfigError::InvalidPattern { field, .. }
            | ConfigError::InvalidUrl { field, .. } => field,
        }
    }
}

/// Validated, immutable parameters for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub username: String,
    pub token: Secret,
    /// Issue a repository-scoped mark-as-read call for every fetched record.
    pub mark_as_read: bool,
    /// Fetch release metadata for `Release` notifications.
    pub add_release_details: bool,
    /// Compiled `regex_filter_tag`, if one was configured.
    pub tag_filter: Option<TagFilter>,
    /// Days that may pass without an emitted event before the instance is
    /// reported as not working.
    pub expected_receive_period_in_days: u32,
    /// Acknowledge each repository at most once per tick.
    pub dedupe_acknowledgements: bool,
    pub request_timeout: Duration,
    /// API root without a trailing slash.
    pub api_base: String,
}

impl RunConfiguration {
    /// Validate raw options.
    ///
    /// Every key is checked independently and all failures are returned
    /// together, one per offending key.
    pub fn resolve(raw: &RawOptions) -> Result<Self, Vec<ConfigError>> {
        let mut errors = Vec::new();

        let username = required(raw, keys::USERNAME, &mut errors);
        let token = required(raw, keys::TOKEN, &mut errors);
        let mark_as_read = optional_bool(raw, keys::MARK_AS_READ, true, &mut errors);
        let add_release_details = optional_bool(raw, keys::ADD_RELEASE_DETAILS, true, &mut errors);
        let dedupe_acknowledgements =
            optional_bool(raw, keys::DEDUPE_ACKNOWLEDGEMENTS, false, &mut errors);

        let tag_filter = match present(raw, keys::REGEX_FILTER_TAG) {
            None => None,
            Some(pattern) => match TagFilter::new(pattern) {
                Ok(filter) => Some(filter),
                Err(source) => {
                    errors.push(ConfigError::InvalidPattern {
                        field: keys::REGEX_FILTER_TAG,
                        source,
                    });
                    None
                }
            },
        };

        let period_key = keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS;
        let expected_receive_period_in_days = match present(raw, period_key) {
            None => {
                errors.push(ConfigError::Missing { field: period_key });
                None
            }
            Some(value) => positive_integer::<u32>(period_key, value, &mut errors),
        };

        let request_timeout_secs = match present(raw, keys::REQUEST_TIMEOUT_SECS) {
            None => Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            Some(value) => positive_integer::<u64>(keys::REQUEST_TIMEOUT_SECS, value, &mut errors),
        };

        let api_base = match present(raw, keys::API_BASE) {
            None => Some(DEFAULT_API_BASE.to_string()),
            Some(value) if value.starts_with("https://") || value.starts_with("http://") => {
                Some(value.trim_end_matches('/').to_string())
            }
            Some(value) => {
                errors.push(ConfigError::InvalidUrl {
                    field: keys::API_BASE,
                    value: value.to_string(),
                });
                None
            }
        };

        match (
            username,
            token,
            mark_as_read,
            add_release_details,
            dedupe_acknowledgements,
            expected_receive_period_in_days,
            request_timeout_secs,
            api_base,
        ) {
            (
                Some(username),
                Some(token),
                Some(mark_as_read),
                Some(add_release_details),
                Some(dedupe_acknowledgements),
                Some(expected_receive_period_in_days),
                Some(request_timeout_secs),
                Some(api_base),
            ) if errors.is_empty() => Ok(Self {
                username: username.to_string(),
                token: Secret::new(token),
                mark_as_read,
                add_release_details,
                tag_filter,
                expected_receive_period_in_days,
                dedupe_acknowledgements,
                request_timeout: Duration::from_secs(request_timeout_secs),
                api_base,
            }),
            _ => Err(errors),
        }
    }

    /// The staleness threshold as a duration.
    pub fn staleness_threshold(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.expected_receive_period_in_days))
    }
}

/// Parse a configuration boolean. Only the exact strings `true` and `false`
/// are accepted.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// A key's value, if it is set to something other than whitespace.
fn present<'a>(raw: &'a RawOptions, key: &str) -> Option<&'a str> {
    raw.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required<'a>(
    raw: &'a RawOptions,
    key: &'static str,
    errors: &mut Vec<ConfigError>,
) -> Option<&'a str> {
    let value = present(raw, key);
    if value.is_none() {
        errors.push(ConfigError::Missing { field: key });
    }
    value
}

/// An absent key takes the default; a present key must parse.
fn optional_bool(
    raw: &RawOptions,
    key: &'static str,
    default: bool,
    errors: &mut Vec<ConfigError>,
) -> Option<bool> {
    let Some(value) = raw.get(key) else {
        return Some(default);
    };
    let parsed = parse_bool(value);
    if parsed.is_none() {
        errors.push(ConfigError::InvalidBool {
            field: key,
            value: value.clone(),
        });
    }
    parsed
}

fn positive_integer<T>(key: &'static str, value: &str, errors: &mut Vec<ConfigError>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    match value.parse::<T>() {
        Ok(n) if n > T::from(0) => Some(n),
        _ => {
            errors.push(ConfigError::InvalidPositiveInteger {
                field: key,
                value: value.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_options() -> RawOptions {
        let mut raw = default_options();
        raw.insert(keys::USERNAME.to_string(), "octocat".to_string());
        raw.insert(keys::TOKEN.to_string(), "ghp_secret".to_string());
        raw
    }

    fn single_error(raw: &RawOptions) -> ConfigError {
        let mut errors = RunConfiguration::resolve(raw).expect_err("options should be rejected");
        assert_eq!(errors.len(), 1, "expected exactly one error: {errors:?}");
        errors.remove(0)
    }

    #[test]
    fn test_defaults_with_credentials_resolve() {
        let config = RunConfiguration::resolve(&valid_options()).expect("valid options");

        assert_eq!(config.username, "octocat");
        assert_eq!(config.token.expose(), "ghp_secret");
        assert!(config.mark_as_read);
        assert!(config.add_release_details);
        assert!(config.tag_filter.is_none());
        assert_eq!(config.expected_receive_period_in_days, 2);
        assert!(!config.dedupe_acknowledgements);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_default_options_alone_are_missing_credentials() {
        let errors = RunConfiguration::resolve(&default_options()).expect_err("no credentials");
        let fields: Vec<_> = errors.iter().map(ConfigError::field).collect();
        assert_eq!(fields, vec![keys::USERNAME, keys::TOKEN]);
    }

    #[test]
    fn test_each_invalid_field_yields_exactly_one_error() {
        let cases: Vec<(&str, Option<&str>)> = vec![
            (keys::USERNAME, None),
            (keys::USERNAME, Some("   ")),
            (keys::TOKEN, None),
            (keys::TOKEN, Some("")),
            (keys::MARK_AS_READ, Some("yes")),
            (keys::ADD_RELEASE_DETAILS, Some("")),
            (keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS, None),
            (keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS, Some("0")),
            (keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS, Some("-3")),
            (keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS, Some("two")),
            (keys::REGEX_FILTER_TAG, Some("^v(")),
            (keys::DEDUPE_ACKNOWLEDGEMENTS, Some("1")),
            (keys::REQUEST_TIMEOUT_SECS, Some("0")),
            (keys::API_BASE, Some("api.github.com")),
        ];

        for (key, value) in cases {
            let mut raw = valid_options();
            match value {
                Some(v) => raw.insert(key.to_string(), v.to_string()),
                None => raw.remove(key),
            };
            let err = single_error(&raw);
            assert_eq!(err.field(), key, "case {key}={value:?} reported {err}");
        }
    }

    #[test]
    fn test_booleans_are_typed_once() {
        let mut raw = valid_options();
        raw.insert(keys::MARK_AS_READ.to_string(), "false".to_string());
        raw.insert(keys::ADD_RELEASE_DETAILS.to_string(), "true".to_string());
        raw.insert(keys::DEDUPE_ACKNOWLEDGEMENTS.to_string(), "true".to_string());

        let config = RunConfiguration::resolve(&raw).expect("valid options");
        assert!(!config.mark_as_read);
        assert!(config.add_release_details);
        assert!(config.dedupe_acknowledgements);
    }

    #[test]
    fn test_absent_booleans_take_defaults() {
        let mut raw = valid_options();
        raw.remove(keys::MARK_AS_READ);
        raw.remove(keys::ADD_RELEASE_DETAILS);

        let config = RunConfiguration::resolve(&raw).expect("valid options");
        assert!(config.mark_as_read);
        assert!(config.add_release_details);
    }

    #[test]
    fn test_blank_filter_pattern_means_no_filter() {
        let mut raw = valid_options();
        raw.insert(keys::REGEX_FILTER_TAG.to_string(), "  ".to_string());
        let config = RunConfiguration::resolve(&raw).expect("valid options");
        assert!(config.tag_filter.is_none());

        raw.insert(keys::REGEX_FILTER_TAG.to_string(), "^v2".to_string());
        let config = RunConfiguration::resolve(&raw).expect("valid options");
        assert_eq!(config.tag_filter.map(|f| f.pattern().to_string()), Some("^v2".to_string()));
    }

    #[test]
    fn test_invalid_pattern_is_reported_as_configuration_error() {
        let mut raw = valid_options();
        raw.insert(keys::REGEX_FILTER_TAG.to_string(), "[unclosed".to_string());

        let err = single_error(&raw);
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        assert!(err.to_string().starts_with("regex_filter_tag is not a valid regular expression"));
    }

    #[test]
    fn test_api_base_is_normalized() {
        let mut raw = valid_options();
        raw.insert(keys::API_BASE.to_string(), "http://127.0.0.1:8080//".to_string());
        let config = RunConfiguration::resolve(&raw).expect("valid options");
        assert_eq!(config.api_base, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_multiple_errors_are_reported_together() {
        let mut raw = RawOptions::new();
        raw.insert(keys::MARK_AS_READ.to_string(), "maybe".to_string());

        let errors = RunConfiguration::resolve(&raw).expect_err("invalid");
        let fields: Vec<_> = errors.iter().map(ConfigError::field).collect();
        assert_eq!(
            fields,
            vec![
                keys::USERNAME,
                keys::TOKEN,
                keys::MARK_AS_READ,
                keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS
            ]
        );
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("ghp_secret");
        assert_eq!(format!("{secret}"), "[redacted]");
        assert!(!format!("{secret:?}").contains("ghp_secret"));

        let config = RunConfiguration::resolve(&valid_options()).expect("valid options");
        assert!(!format!("{config:?}").contains("ghp_secret"));
    }

    #[test]
    fn test_staleness_threshold_in_days() {
        let mut raw = valid_options();
        raw.insert(keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS.to_string(), "7".to_string());
        let config = RunConfiguration::resolve(&raw).expect("valid options");
        assert_eq!(config.staleness_threshold(), chrono::Duration::days(7));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("1"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_booleans_must_be_exact() {
        for value in ["TRUE", "False", " true", "false "] {
            let mut raw = valid_options();
            raw.insert(keys::MARK_AS_READ.to_string(), value.to_string());

            let errors = RunConfiguration::resolve(&raw).expect_err("should be rejected");
            assert_eq!(errors.len(), 1, "value {value:?}");
            assert!(
                matches!(&errors[0], ConfigError::InvalidBool { field, .. } if *field == keys::MARK_AS_READ),
                "value {value:?} reported {}",
                errors[0]
            );
        }
    }
}

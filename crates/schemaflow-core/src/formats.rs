//! Format registry
//!
//! Maps `format` names to string predicates. Caller-supplied formats are
//! consulted first, so they can shadow built-ins. Names that match neither
//! are accepted under [`FormatPolicy::Permissive`] (the default) and
//! rejected under [`FormatPolicy::Strict`].
//!
//! # Example
//!
//! ```rust
//! use schemaflow_core::FormatRegistry;
//!
//! let registry = FormatRegistry::new().with_format("ends-with-42", |s| s.ends_with("42"));
//! assert!(registry.validate("ends-with-42", "answer-42"));
//! assert!(registry.validate("email", "ops@example.com"));
//! assert!(registry.validate("not-a-known-format", "anything"));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// A caller-supplied format predicate
pub type FormatFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Treatment of format names nobody recognizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatPolicy {
    /// Unknown formats always pass
    #[default]
    Permissive,
    /// Unknown formats always fail
    Strict,
}

/// Formats implemented by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFormat {
    Email,
    IdnEmail,
    Uri,
    UriReference,
    Iri,
    IriReference,
    /// Any UUID, or one with the given version nibble
    Uuid(Option<u8>),
    Date,
    DateTime,
    Time,
    Duration,
    Ipv4,
    Ipv6,
    Hostname,
    IdnHostname,
    JsonPointer,
    RelativeJsonPointer,
    UriTemplate,
    Regex,
}

impl BuiltinFormat {
    /// Look up a built-in by its schema name
    pub fn from_name(name: &str) -> Option<Self> {
        let format = match name {
            "email" => BuiltinFormat::Email,
            "idn-email" => BuiltinFormat::IdnEmail,
            "uri" | "url" => BuiltinFormat::Uri,
            "uri-reference" => BuiltinFormat::UriReference,
            "iri" => BuiltinFormat::Iri,
            "iri-reference" => BuiltinFormat::IriReference,
            "uuid" => BuiltinFormat::Uuid(None),
            "date" => BuiltinFormat::Date,
            "date-time" => BuiltinFormat::DateTime,
            "time" => BuiltinFormat::Time,
            "duration" => BuiltinFormat::Duration,
            "ipv4" => BuiltinFormat::Ipv4,
            "ipv6" => BuiltinFormat::Ipv6,
            "hostname" => BuiltinFormat::Hostname,
            "idn-hostname" => BuiltinFormat::IdnHostname,
            "json-pointer" => BuiltinFormat::JsonPointer,
            "relative-json-pointer" => BuiltinFormat::RelativeJsonPointer,
            "uri-template" => BuiltinFormat::UriTemplate,
            "regex" => BuiltinFormat::Regex,
            other => {
                let version = other.strip_prefix("uuid-v")?.parse::<u8>().ok()?;
                if !(1..=8).contains(&version) {
                    return None;
                }
                BuiltinFormat::Uuid(Some(version))
            }
        };
        Some(format)
    }

    /// Check a string against this format
    pub fn check(&self, value: &str) -> bool {
        match self {
            BuiltinFormat::Email => is_email(value, false),
            BuiltinFormat::IdnEmail => is_email(value, true),
            BuiltinFormat::Uri => is_uri(value, false),
            BuiltinFormat::UriReference => is_uri_reference(value, false),
            BuiltinFormat::Iri => is_uri(value, true),
            BuiltinFormat::IriReference => is_uri_reference(value, true),
            BuiltinFormat::Uuid(version) => is_uuid(value, *version),
            BuiltinFormat::Date => is_date(value),
            BuiltinFormat::DateTime => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
            BuiltinFormat::Time => is_time(value),
            BuiltinFormat::Duration => is_duration(value),
            BuiltinFormat::Ipv4 => value.parse::<Ipv4Addr>().is_ok(),
            BuiltinFormat::Ipv6 => is_ipv6(value),
            BuiltinFormat::Hostname => is_hostname(value, false),
            BuiltinFormat::IdnHostname => is_hostname(value, true),
            BuiltinFormat::JsonPointer => is_json_pointer(value),
            BuiltinFormat::RelativeJsonPointer => is_relative_json_pointer(value),
            BuiltinFormat::UriTemplate => is_uri_template(value),
            BuiltinFormat::Regex => Regex::new(value).is_ok(),
        }
    }
}

/// Result of looking a format name up in a registry
pub enum FormatLookup<'a> {
    Custom(&'a FormatFn),
    Builtin(BuiltinFormat),
    Unknown,
}

/// Built-in formats plus caller overrides
#[derive(Clone, Default)]
pub struct FormatRegistry {
    custom: HashMap<String, FormatFn>,
    policy: FormatPolicy,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FormatRegistry")
            .field("custom", &names)
            .field("policy", &self.policy)
            .finish()
    }
}

impl FormatRegistry {
    /// Create a registry with only the built-in formats
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom format (builder pattern)
    pub fn with_format<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    /// Register a custom format, replacing any previous one of that name
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.custom.insert(name.into(), Arc::new(predicate));
    }

    /// Set the unknown-format policy
    pub fn with_policy(mut self, policy: FormatPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The unknown-format policy
    pub fn policy(&self) -> FormatPolicy {
        self.policy
    }

    /// Find what would check `name`: custom entries win over built-ins
    pub fn lookup(&self, name: &str) -> FormatLookup<'_> {
        if let Some(predicate) = self.custom.get(name) {
            return FormatLookup::Custom(predicate);
        }
        match BuiltinFormat::from_name(name) {
            Some(builtin) => FormatLookup::Builtin(builtin),
            None => FormatLookup::Unknown,
        }
    }

    /// Check a string against a named format
    pub fn validate(&self, name: &str, value: &str) -> bool {
        match self.lookup(name) {
            FormatLookup::Custom(predicate) => predicate(value),
            FormatLookup::Builtin(builtin) => builtin.check(value),
            FormatLookup::Unknown => match self.policy {
                FormatPolicy::Permissive => {
                    tracing::debug!(format = %name, "Unknown format, accepting value");
                    true
                }
                FormatPolicy::Strict => false,
            },
        }
    }
}

/// Check `value` against `name`, consulting `custom` before the built-ins
pub fn validate_format(name: &str, value: &str, custom: Option<&FormatRegistry>) -> bool {
    match custom {
        Some(registry) => registry.validate(name, value),
        None => DEFAULT_REGISTRY.validate(name, value),
    }
}

pub(crate) static DEFAULT_REGISTRY: Lazy<FormatRegistry> = Lazy::new(FormatRegistry::new);

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?(?:([Zz])|([+-])(\d{2}):(\d{2}))?$").expect("valid time regex")
});

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .expect("valid duration regex")
});

fn is_email(value: &str, allow_unicode: bool) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.is_empty() {
        return false;
    }

    let local_ok = if local.len() >= 2 && local.starts_with('"') && local.ends_with('"') {
        !local[1..local.len() - 1].contains('"')
    } else {
        !local.starts_with('.')
            && !local.ends_with('.')
            && !local.contains("..")
            && local.chars().all(|c| {
                c.is_ascii_alphanumeric()
                    || "!#$%&'*+-/=?^_`{|}~.".contains(c)
                    || (allow_unicode && !c.is_ascii() && !c.is_whitespace())
            })
    };
    if !local_ok {
        return false;
    }

    match domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        Some(literal) => match literal.strip_prefix("IPv6:") {
            Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
            None => literal.parse::<Ipv4Addr>().is_ok(),
        },
        None => is_hostname(domain, allow_unicode),
    }
}

fn is_hostname(value: &str, allow_unicode: bool) -> bool {
    let host = value.strip_suffix('.').unwrap_or(value);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| {
                c.is_ascii_alphanumeric() || c == '-' || (allow_unicode && !c.is_ascii() && c.is_alphanumeric())
            })
    })
}

fn is_uri(value: &str, allow_unicode: bool) -> bool {
    if value.chars().any(char::is_whitespace) || (!allow_unicode && !value.is_ascii()) {
        return false;
    }
    url::Url::parse(value).is_ok()
}

fn is_uri_reference(value: &str, allow_unicode: bool) -> bool {
    if value.chars().any(|c| c.is_whitespace() || c == '\\') || (!allow_unicode && !value.is_ascii()) {
        return false;
    }
    if url::Url::parse(value).is_ok() {
        return true;
    }
    url::Url::parse("http://reference.invalid/")
        .and_then(|base| base.join(value))
        .is_ok()
}

fn is_uuid(value: &str, version: Option<u8>) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 36 || [8, 13, 18, 23].iter().any(|&i| bytes[i] != b'-') {
        return false;
    }
    match uuid::Uuid::try_parse(value) {
        Ok(parsed) => version.map_or(true, |v| parsed.get_version_num() == v as usize),
        Err(_) => false,
    }
}

fn is_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
        && chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_time(value: &str) -> bool {
    let Some(caps) = TIME_RE.captures(value) else {
        return false;
    };
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let (Some(hour), Some(minute), Some(second)) = (field(1), field(2), field(3)) else {
        return false;
    };
    if hour > 23 || minute > 59 || second > 60 {
        return false;
    }
    match (field(7), field(8)) {
        (Some(offset_hour), Some(offset_minute)) => offset_hour <= 23 && offset_minute <= 59,
        _ => true,
    }
}

fn is_duration(value: &str) -> bool {
    let Some(caps) = DURATION_RE.captures(value) else {
        return false;
    };
    let has = |i: usize| caps.get(i).is_some();
    let date_parts = [1, 2, 4].iter().filter(|&&i| has(i)).count();
    let time_parts = [6, 7, 8].iter().filter(|&&i| has(i)).count();

    if has(5) && time_parts == 0 {
        return false;
    }
    if has(3) {
        return date_parts == 0 && !has(5);
    }
    date_parts + time_parts > 0
}

fn is_ipv6(value: &str) -> bool {
    match value.split_once('%') {
        Some((address, zone)) => {
            !zone.is_empty()
                && !zone.chars().any(|c| c.is_whitespace() || c == '%')
                && address.parse::<Ipv6Addr>().is_ok()
        }
        None => value.parse::<Ipv6Addr>().is_ok(),
    }
}

fn has_valid_escapes(pointer: &str) -> bool {
    let mut chars = pointer.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
            return false;
        }
    }
    true
}

fn is_json_pointer(value: &str) -> bool {
    value.is_empty() || (value.starts_with('/') && has_valid_escapes(value))
}

fn is_relative_json_pointer(value: &str) -> bool {
    let digits = value.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || (digits > 1 && value.starts_with('0')) {
        return false;
    }
    let rest = &value[digits..];
    rest == "#" || is_json_pointer(rest)
}

fn is_uri_template(value: &str) -> bool {
    let mut open = false;
    let mut expression_len = 0;
    for c in value.chars() {
        match c {
            '{' if open => return false,
            '{' => {
                open = true;
                expression_len = 0;
            }
            '}' if !open || expression_len == 0 => return false,
            '}' => open = false,
            _ if open => expression_len += 1,
            _ => {}
        }
    }
    !open
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_order() {
        let registry = FormatRegistry::new().with_format("email", |s| s == "override");
        assert!(matches!(registry.lookup("email"), FormatLookup::Custom(_)));
        assert!(registry.validate("email", "override"));
        assert!(!registry.validate("email", "ops@example.com"));
        assert!(matches!(registry.lookup("date"), FormatLookup::Builtin(BuiltinFormat::Date)));
        assert!(matches!(registry.lookup("zip-code"), FormatLookup::Unknown));
    }

    #[test]
    fn test_unknown_format_policy() {
        assert!(FormatRegistry::new().validate("zip-code", "nope"));
        let strict = FormatRegistry::new().with_policy(FormatPolicy::Strict);
        assert!(!strict.validate("zip-code", "nope"));
        assert!(strict.validate("ipv4", "10.0.0.1"));
    }

    #[test]
    fn test_validate_format_without_registry() {
        assert!(validate_format("uuid", "550e8400-e29b-41d4-a716-446655440000", None));
        assert!(!validate_format("uuid", "550e8400e29b41d4a716446655440000", None));
        assert!(validate_format("whatever", "x", None));
    }

    #[test]
    fn test_email() {
        assert!(is_email("joe.bloggs@example.com", false));
        assert!(is_email("\"joe bloggs\"@example.com", false));
        assert!(is_email("joe@[127.0.0.1]", false));
        assert!(!is_email("joe..bloggs@example.com", false));
        assert!(!is_email(".joe@example.com", false));
        assert!(!is_email("no-at-sign", false));
        assert!(!is_email("joe@-example.com", false));
        assert!(is_email("实例@实例.测试", true));
        assert!(!is_email("实例@实例.测试", false));
    }

    #[test]
    fn test_uri() {
        assert!(is_uri("https://example.com/path?q=1#frag", false));
        assert!(is_uri("urn:isbn:0451450523", false));
        assert!(!is_uri("//example.com", false));
        assert!(!is_uri("http://exa mple.com", false));
        assert!(is_uri_reference("/relative/path", false));
        assert!(is_uri_reference("#fragment", false));
        assert!(!is_uri_reference("\\\\WINDOWS\\fileshare", false));
        assert!(is_uri("http://ƒøø.ßår/?∂éœ=πîx#πîüx", true));
        assert!(!is_uri("http://ƒøø.ßår/?∂éœ=πîx#πîüx", false));
    }

    #[test]
    fn test_uuid_versions() {
        let v4 = "2eb8aa08-aa98-11ea-b4aa-73b441d16380";
        assert!(is_uuid(v4, None));
        assert!(is_uuid(v4, Some(1)));
        assert!(!is_uuid(v4, Some(4)));
        assert!(is_uuid("550e8400-e29b-41d4-a716-446655440000", Some(4)));
        assert!(!is_uuid("550e8400-e29b-41d4-a716-44665544000g", None));
        assert_eq!(BuiltinFormat::from_name("uuid-v7"), Some(BuiltinFormat::Uuid(Some(7))));
        assert_eq!(BuiltinFormat::from_name("uuid-v9"), None);
    }

    #[test]
    fn test_date_and_time() {
        assert!(is_date("2024-02-29"));
        assert!(!is_date("2023-02-29"));
        assert!(!is_date("2024-2-09"));
        assert!(BuiltinFormat::DateTime.check("1963-06-19T08:30:06.283185Z"));
        assert!(BuiltinFormat::DateTime.check("1963-06-19T08:30:06+02:00"));
        assert!(!BuiltinFormat::DateTime.check("1963-06-19"));
        assert!(is_time("08:30:06"));
        assert!(is_time("08:30:06.283185Z"));
        assert!(is_time("23:59:60+01:00"));
        assert!(!is_time("24:00:00"));
        assert!(!is_time("08:30"));
        assert!(!is_time("08:30:06+25:00"));
    }

    #[test]
    fn test_duration() {
        assert!(is_duration("P4DT12H30M5S"));
        assert!(is_duration("P1Y"));
        assert!(is_duration("PT0.5S"));
        assert!(is_duration("P2W"));
        assert!(!is_duration("P"));
        assert!(!is_duration("PT"));
        assert!(!is_duration("P1YT"));
        assert!(!is_duration("P1Y2W"));
        assert!(!is_duration("4DT12H"));
    }

    #[test]
    fn test_ip_addresses() {
        assert!(BuiltinFormat::Ipv4.check("192.168.0.1"));
        assert!(!BuiltinFormat::Ipv4.check("256.1.1.1"));
        assert!(!BuiltinFormat::Ipv4.check("1.2.3"));
        assert!(is_ipv6("::1"));
        assert!(is_ipv6("fe80::1%eth0"));
        assert!(!is_ipv6("fe80::1%"));
        assert!(!is_ipv6("12345::"));
    }

    #[test]
    fn test_hostname() {
        assert!(is_hostname("www.example.com", false));
        assert!(is_hostname("example.com.", false));
        assert!(!is_hostname("-example.com", false));
        assert!(!is_hostname("example-.com", false));
        assert!(!is_hostname(&"a".repeat(64), false));
        assert!(!is_hostname(&format!("{}.com", "a.".repeat(126)), false));
        assert!(!is_hostname("under_score.com", false));
    }

    #[test]
    fn test_pointers() {
        assert!(is_json_pointer(""));
        assert!(is_json_pointer("/foo/0/a~1b"));
        assert!(!is_json_pointer("foo"));
        assert!(!is_json_pointer("/foo~2"));
        assert!(is_relative_json_pointer("0"));
        assert!(is_relative_json_pointer("1/foo"));
        assert!(is_relative_json_pointer("2#"));
        assert!(!is_relative_json_pointer("01/foo"));
        assert!(!is_relative_json_pointer("/foo"));
    }

    #[test]
    fn test_uri_template() {
        assert!(is_uri_template("http://example.com/dictionary/{term:1}/{term}"));
        assert!(is_uri_template("no-expressions"));
        assert!(!is_uri_template("http://example.com/{term"));
        assert!(!is_uri_template("http://example.com/{a{b}}"));
        assert!(!is_uri_template("http://example.com/term}"));
        assert!(!is_uri_template("{}"));
    }

    #[test]
    fn test_regex_format() {
        assert!(BuiltinFormat::Regex.check("^[a-z]+$"));
        assert!(!BuiltinFormat::Regex.check("(unclosed"));
    }
}

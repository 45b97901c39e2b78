//! 🎬 *[two buckets walk into a struct. one is the source. one is the destination.]*
//! *["We're basically the same," they said. The struct nodded. "Same eight fields, different vibes."]*
//!
//! 📦 **Endpoint Config**, the shared DNA of both sides of the mirror.
//!
//! 🧠 Knowledge graph:
//! - `AppConfig.source` and `AppConfig.destination` are both an `EndpointConfig`.
//! - Required: `bucket`, `access_key`, `secret_key`, `endpoint`. Blank counts as missing;
//!   `AppConfig::validate` is the bouncer that checks IDs.
//! - Optional: `region` (us-east-1), `use_ssl` (true), `path_style` (true), `prefix` (none).
//! - `endpoint` is either `host[:port]` like the old MinIO tool wanted, or a full URL.
//! - Env providers hand us `123456` as a number and `no` as a string. Text settings take
//!   either, and `use_ssl` / `path_style` are off only for a literal `false`, as the old tool had it.
//!
//! 🦆 The duck has two passports. One for each bucket.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// 🪣 Everything we need to talk to one bucket on one S3-compatible server.
///
/// Secrets live in here, so the `Debug` impl is hand-rolled to keep them out of logs.
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// 🪣 Bucket name. Required.
    #[serde(default, deserialize_with = "string_or_number")]
    pub bucket: String,
    /// 🌎 Region for request signing. MinIO does not care, AWS very much does.
    #[serde(default = "default_region", deserialize_with = "string_or_number")]
    pub region: String,
    /// 🔑 Access key id. Required.
    #[serde(default, deserialize_with = "string_or_number")]
    pub access_key: String,
    /// 🔒 Secret key. Required. Never logged.
    #[serde(default, deserialize_with = "string_or_number")]
    pub secret_key: String,
    /// 📡 `host[:port]` or `scheme://host[:port]`. Required.
    #[serde(default, deserialize_with = "string_or_number")]
    pub endpoint: String,
    /// 🔐 TLS on or off when `endpoint` has no scheme of its own.
    #[serde(default = "default_true", deserialize_with = "anything_but_false")]
    pub use_ssl: bool,
    /// 🛣️ Path-style addressing (`host/bucket/key`). Most self-hosted stores want this.
    #[serde(default = "default_true", deserialize_with = "anything_but_false")]
    pub path_style: bool,
    /// ✂️ Source only: list keys under this prefix. Keys keep their full name on the other side,
    /// so `AppConfig::validate` turns a destination prefix away.
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub prefix: Option<String>,
}

// 🌎 us-east-1 again. If you don't choose a region, the region chooses you.
fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

/// 🔢 Text setting that may arrive as a number. `REMOTE_ACCESS_KEY=123456` is a perfectly good key.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumberVisitor;

    impl Visitor<'_> for StringOrNumberVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_u128<E: de::Error>(self, value: u128) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_i128<E: de::Error>(self, value: i128) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    string_or_number(deserializer).map(Some)
}

/// 🔐 Off only for `false` (the bool or the exact string). `no`, `0`, `FALSE`: still on.
fn anything_but_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct AnythingButFalseVisitor;

    impl Visitor<'_> for AnythingButFalseVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean, or any text where only \"false\" means off")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(value != "false")
        }

        fn visit_u64<E: de::Error>(self, _value: u64) -> Result<Self::Value, E> {
            Ok(true)
        }

        fn visit_i64<E: de::Error>(self, _value: i64) -> Result<Self::Value, E> {
            Ok(true)
        }

        fn visit_f64<E: de::Error>(self, _value: f64) -> Result<Self::Value, E> {
            Ok(true)
        }
    }

    deserializer.deserialize_any(AnythingButFalseVisitor)
}

// -- 🪞 same answers serde gives when a whole section is missing from every layer
impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            access_key: String::new(),
            secret_key: String::new(),
            endpoint: String::new(),
            use_ssl: default_true(),
            path_style: default_true(),
            prefix: None,
        }
    }
}

impl EndpointConfig {
    /// 📡 The URL the SDK should dial.
    ///
    /// A scheme in `endpoint` wins. Otherwise `use_ssl` picks between https and http.
    pub fn endpoint_url(&self) -> String {
        let the_endpoint = self.endpoint.trim().trim_end_matches('/');
        if the_endpoint.contains("://") {
            the_endpoint.to_string()
        } else if self.use_ssl {
            format!("https://{the_endpoint}")
        } else {
            format!("http://{the_endpoint}")
        }
    }

    /// 🌎 Region to sign with. A blank value falls back to the default instead of
    /// producing signatures nobody can verify.
    pub fn effective_region(&self) -> String {
        let the_region = self.region.trim();
        if the_region.is_empty() {
            default_region()
        } else {
            the_region.to_string()
        }
    }

    /// ✂️ The prefix, but only if it actually says something.
    pub fn effective_prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// 🔍 Names of required settings that are missing or blank, as `<side>.<field>`.
    pub(crate) fn missing_settings(&self, side: &str) -> Vec<String> {
        [
            ("bucket", &self.bucket),
            ("access_key", &self.access_key),
            ("secret_key", &self.secret_key),
            ("endpoint", &self.endpoint),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| format!("{side}.{field}"))
        .collect()
    }
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🔒 secret_key stays home. access_key is an id, not a secret, so it gets to come.
        f.debug_struct("EndpointConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("use_ssl", &self.use_ssl)
            .field("path_style", &self.path_style)
            .field("prefix", &self.prefix)
            .finish()
    }
}

//! Record and Transform Documents
//!
//! Typed views of the two human-authored YAML documents:
//!
//! - `records.yml`: `domain -> label -> spec | [spec]`
//! - `transforms.yml`: `domain -> { requestHeaders?, responseHeaders? }`

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};

use crate::error::CompileError;

/// Label denoting the zone apex
pub const APEX: &str = "@";

const RECORD_KINDS: [&str; 4] = ["proxy", "raw", "redirect", "server"];

/// Fully-qualified record name for a label within a domain
pub fn record_name(domain: &str, label: &str) -> String {
    if label == APEX {
        domain.to_string()
    } else {
        format!("{}.{}", label, domain)
    }
}

// ============================================================
// Records
// ============================================================

/// What a single DNS name should resolve or redirect to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordSpec {
    /// Proxies the request through the edge without routing anywhere
    Proxy,

    /// A record passed through to the provider as written
    Raw {
        #[serde(rename = "type")]
        record_type: String,
        #[serde(deserialize_with = "scalar_string")]
        to: String,
        #[serde(default)]
        proxied: Option<bool>,
    },

    /// Forward the name to another URL with a page rule
    Redirect {
        to: String,
        #[serde(default)]
        path: Option<String>,
        #[serde(rename = "type", default)]
        permanence: Permanence,
        #[serde(default)]
        priority: Option<u32>,
    },

    /// Point at a registered server; expands to one A and one AAAA record
    Server { to: String },
}

/// Whether a redirect is cached by clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permanence {
    Permanent,
    #[default]
    Temporary,
}

impl Permanence {
    /// HTTP status code used for the forward
    pub fn status_code(self) -> u16 {
        match self {
            Permanence::Permanent => 301,
            Permanence::Temporary => 302,
        }
    }
}

/// Specs for one domain, keyed by subdomain label
pub type RecordSet = BTreeMap<String, Vec<RecordSpec>>;

/// The parsed records document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDocument {
    pub domains: BTreeMap<String, RecordSet>,
}

impl RecordDocument {
    /// Parse a records document.
    ///
    /// A label may hold one spec or a list of specs. The `kind` discriminant
    /// is checked before the rest of the spec so that an unknown kind is
    /// reported against the record it belongs to.
    pub fn parse(input: &str) -> Result<Self, CompileError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: Option<Mapping> = serde_yaml::from_str(input)?;

        let mut domains = BTreeMap::new();
        for (key, labels) in raw.unwrap_or_default() {
            let domain = key_string(key)?;
            let labels: Option<Mapping> = serde_yaml::from_value(labels)?;
            let mut set = RecordSet::new();

            for (key, value) in labels.unwrap_or_default() {
                let label = key_string(key)?;
                let record = record_name(&domain, &label);

                let values = match value {
                    Value::Sequence(items) => items,
                    other => vec![other],
                };

                let specs = values
                    .into_iter()
                    .map(|v| parse_spec(&record, v))
                    .collect::<Result<Vec<_>, _>>()?;

                set.insert(label, specs);
            }

            domains.insert(domain, set);
        }

        Ok(Self { domains })
    }
}

/// Mapping keys are written as plain scalars; `1:` is a valid label
fn key_string(key: Value) -> Result<String, CompileError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Ok(serde_yaml::from_value::<String>(other)?),
    }
}

fn parse_spec(record: &str, value: Value) -> Result<RecordSpec, CompileError> {
    let kind = value.get("kind").and_then(Value::as_str).map(str::to_owned);

    match kind.as_deref() {
        Some(k) if RECORD_KINDS.contains(&k) => {
            serde_yaml::from_value(value).map_err(|source| CompileError::InvalidSpec {
                record: record.to_string(),
                source,
            })
        }
        _ => Err(CompileError::UnknownRecordKind {
            record: record.to_string(),
            kind,
        }),
    }
}

// ============================================================
// Transforms
// ============================================================

/// Header transforms for one domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainTransform {
    #[serde(default)]
    pub request_headers: Option<Vec<HeaderModification>>,
    #[serde(default)]
    pub response_headers: Option<Vec<HeaderModification>>,
}

/// One header rewrite rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeaderModification {
    /// What the rule does; documentation only
    #[serde(default)]
    pub description: String,
    /// Activation condition, or `always`
    pub when: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dynamic: Vec<DynamicHeader>,
    #[serde(default, rename = "static", deserialize_with = "null_as_default")]
    pub static_headers: Vec<StaticHeader>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remove: Vec<String>,
}

/// A header whose value is computed from an expression
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DynamicHeader {
    pub name: String,
    pub expression: String,
}

/// A header set to a literal value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaticHeader {
    pub name: String,
    pub value: String,
}

/// The parsed transforms document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformDocument {
    pub domains: BTreeMap<String, DomainTransform>,
}

impl TransformDocument {
    /// Parse a transforms document
    pub fn parse(input: &str) -> Result<Self, CompileError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: Option<Mapping> = serde_yaml::from_str(input)?;

        let mut domains = BTreeMap::new();
        for (key, value) in raw.unwrap_or_default() {
            let domain = key_string(key)?;
            let transform: Option<DomainTransform> = serde_yaml::from_value(value)?;
            domains.insert(domain, transform.unwrap_or_default());
        }

        Ok(Self { domains })
    }
}

/// Accept numbers and booleans where a string value is expected
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar value, found {:?}",
            other
        ))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

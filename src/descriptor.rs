//! Resource Descriptors
//!
//! Provider-facing output of the compilers. Every descriptor carries an `id`
//! built from its kind, provider type and name, never from its value, so an
//! unchanged document always yields the same identifiers and a value change
//! updates the resource in place.

use serde::Serialize;

/// TTL value the provider reads as "automatic"
pub const AUTO_TTL: u32 = 1;

/// Canonical address of the IPv6 discard prefix (100::/64)
pub const DISCARD_V6: &str = "100::";

/// A single compiled resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "resource", rename_all = "snake_case")]
pub enum ResourceDescriptor {
    DnsRecord(DnsRecordDescriptor),
    RedirectRule(RedirectDescriptor),
    Ruleset(RulesetDescriptor),
}

impl ResourceDescriptor {
    pub fn id(&self) -> &str {
        match self {
            ResourceDescriptor::DnsRecord(r) => &r.id,
            ResourceDescriptor::RedirectRule(r) => &r.id,
            ResourceDescriptor::Ruleset(r) => &r.id,
        }
    }

    pub fn zone_id(&self) -> &str {
        match self {
            ResourceDescriptor::DnsRecord(r) => &r.zone_id,
            ResourceDescriptor::RedirectRule(r) => &r.zone_id,
            ResourceDescriptor::Ruleset(r) => &r.zone_id,
        }
    }
}

/// A DNS record to create in a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecordDescriptor {
    pub id: String,
    pub zone_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    pub ttl: u32,
    /// Replacement must remove the old record before creating the new one
    pub delete_before_replace: bool,
}

/// A page rule forwarding a URL pattern elsewhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectDescriptor {
    pub id: String,
    pub zone_id: String,
    pub target: String,
    pub destination_url: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

/// HTTP processing phase a ruleset is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Phase {
    #[serde(rename = "http_request_late_transform")]
    Request,
    #[serde(rename = "http_response_headers_transform")]
    Response,
}

impl Phase {
    /// Short name used in resource identifiers
    pub fn label(self) -> &'static str {
        match self {
            Phase::Request => "request",
            Phase::Response => "response",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Request => write!(f, "http_request_late_transform"),
            Phase::Response => write!(f, "http_response_headers_transform"),
        }
    }
}

/// A zone-level ruleset for one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulesetDescriptor {
    pub id: String,
    pub zone_id: String,
    /// Always `zone`
    pub kind: String,
    /// Always `default`; a zone has one entry-point ruleset per phase
    pub name: String,
    pub phase: Phase,
    pub rules: Vec<Rule>,
}

/// A header rewrite rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Always `rewrite`
    pub action: String,
    pub description: String,
    pub expression: String,
    pub enabled: bool,
    pub headers: Vec<HeaderOperation>,
}

/// One step of a header rewrite, applied in list order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum HeaderOperation {
    Set {
        name: String,
        #[serde(flatten)]
        value: HeaderValue,
    },
    Remove {
        name: String,
    },
}

impl HeaderOperation {
    pub fn name(&self) -> &str {
        match self {
            HeaderOperation::Set { name, .. } | HeaderOperation::Remove { name } => name,
        }
    }
}

/// Source of a header's new value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderValue {
    /// Evaluated by the edge per request
    Expression(String),
    /// Literal value
    Value(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_record_serialization() {
        let descriptor = ResourceDescriptor::DnsRecord(DnsRecordDescriptor {
            id: "record-raw-A-example.com".to_string(),
            zone_id: "zid-1".to_string(),
            name: "example.com".to_string(),
            record_type: "A".to_string(),
            value: "1.2.3.4".to_string(),
            proxied: None,
            ttl: AUTO_TTL,
            delete_before_replace: true,
        });

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["resource"], "dns_record");
        assert_eq!(json["type"], "A");
        assert_eq!(json["ttl"], 1);
        assert!(json.get("proxied").is_none());
        assert_eq!(descriptor.id(), "record-raw-A-example.com");
        assert_eq!(descriptor.zone_id(), "zid-1");
    }

    #[test]
    fn test_header_operation_serialization() {
        let set = HeaderOperation::Set {
            name: "X-Id".to_string(),
            value: HeaderValue::Expression("req.id".to_string()),
        };
        let remove = HeaderOperation::Remove {
            name: "X-Debug".to_string(),
        };

        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains("\"operation\":\"set\""));
        assert!(json.contains("\"expression\":\"req.id\""));

        let json = serde_json::to_string(&remove).unwrap();
        assert_eq!(json, r#"{"operation":"remove","name":"X-Debug"}"#);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Request.to_string(), "http_request_late_transform");
        assert_eq!(
            serde_json::to_string(&Phase::Response).unwrap(),
            "\"http_response_headers_transform\""
        );
        assert_eq!(Phase::Response.label(), "response");
    }
}

//! Record Compiler
//!
//! Turns a parsed records document into DNS record and redirect rule
//! descriptors. Compilation is all-or-nothing: the first invalid reference
//! aborts the run and nothing is returned.

use std::collections::BTreeSet;

use tracing::debug;

use crate::descriptor::{
    DnsRecordDescriptor, RedirectDescriptor, ResourceDescriptor, AUTO_TTL, DISCARD_V6,
};
use crate::error::CompileError;
use crate::registry::ServerRegistry;
use crate::spec::{record_name, RecordDocument, RecordSpec};
use crate::zones::ZoneMap;

/// Output of a record compile, in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledRecords {
    pub dns_records: Vec<DnsRecordDescriptor>,
    pub redirects: Vec<RedirectDescriptor>,
}

impl CompiledRecords {
    pub fn len(&self) -> usize {
        self.dns_records.len() + self.redirects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into descriptors: records first, then redirects
    pub fn into_descriptors(self) -> Vec<ResourceDescriptor> {
        self.dns_records
            .into_iter()
            .map(ResourceDescriptor::DnsRecord)
            .chain(self.redirects.into_iter().map(ResourceDescriptor::RedirectRule))
            .collect()
    }
}

/// Accumulates descriptors and rejects a repeated identifier
#[derive(Default)]
struct Collector {
    out: CompiledRecords,
    seen: BTreeSet<String>,
}

impl Collector {
    fn claim(&mut self, id: &str) -> Result<(), CompileError> {
        if self.seen.insert(id.to_string()) {
            Ok(())
        } else {
            Err(CompileError::DuplicateResource { id: id.to_string() })
        }
    }

    fn record(&mut self, record: DnsRecordDescriptor) -> Result<(), CompileError> {
        self.claim(&record.id)?;
        self.out.dns_records.push(record);
        Ok(())
    }

    fn redirect(&mut self, redirect: RedirectDescriptor) -> Result<(), CompileError> {
        self.claim(&redirect.id)?;
        self.out.redirects.push(redirect);
        Ok(())
    }
}

/// Compiles record documents against resolved zones and a server registry
pub struct RecordCompiler<'a> {
    zones: &'a ZoneMap,
    servers: &'a ServerRegistry,
}

impl<'a> RecordCompiler<'a> {
    pub fn new(zones: &'a ZoneMap, servers: &'a ServerRegistry) -> Self {
        Self { zones, servers }
    }

    /// Compile every domain in the document.
    ///
    /// Domains, labels and specs are visited in document order (domains and
    /// labels sorted), so identical input always yields an identical output.
    pub fn compile(&self, document: &RecordDocument) -> Result<CompiledRecords, CompileError> {
        let mut collector = Collector::default();

        for (domain, set) in &document.domains {
            let zone_id = self.zones.require(domain)?;

            for (label, specs) in set {
                let record = record_name(domain, label);

                for spec in specs {
                    self.compile_spec(&mut collector, zone_id, &record, spec)?;
                }
            }

            debug!(domain = %domain, labels = set.len(), "Compiled records");
        }

        Ok(collector.out)
    }

    fn compile_spec(
        &self,
        collector: &mut Collector,
        zone_id: &str,
        record: &str,
        spec: &RecordSpec,
    ) -> Result<(), CompileError> {
        match spec {
            RecordSpec::Proxy => collector.record(dns_record(
                format!("record-proxy-{}", record),
                zone_id,
                record,
                "AAAA",
                DISCARD_V6.to_string(),
                Some(true),
            )),

            // The type is passed through as written; `txt` and `TXT` are distinct ids
            RecordSpec::Raw {
                record_type,
                to,
                proxied,
            } => collector.record(dns_record(
                format!("record-raw-{}-{}", record_type, record),
                zone_id,
                record,
                record_type,
                to.clone(),
                *proxied,
            )),

            RecordSpec::Redirect {
                to,
                path,
                permanence,
                priority,
            } => collector.redirect(RedirectDescriptor {
                id: format!("record-redirect-{}", record),
                zone_id: zone_id.to_string(),
                target: format!("{}{}", record, path.as_deref().unwrap_or_default()),
                destination_url: to.clone(),
                status_code: permanence.status_code(),
                priority: *priority,
            }),

            RecordSpec::Server { to } => {
                let server = self
                    .servers
                    .get(to)
                    .ok_or_else(|| CompileError::UnknownServer {
                        server: to.clone(),
                        record: record.to_string(),
                    })?;

                collector.record(dns_record(
                    format!("record-server-A-{}", record),
                    zone_id,
                    record,
                    "A",
                    server.v4.to_string(),
                    Some(true),
                ))?;
                collector.record(dns_record(
                    format!("record-server-AAAA-{}", record),
                    zone_id,
                    record,
                    "AAAA",
                    server.v6.to_string(),
                    Some(true),
                ))
            }
        }
    }
}

fn dns_record(
    id: String,
    zone_id: &str,
    name: &str,
    record_type: &str,
    value: String,
    proxied: Option<bool>,
) -> DnsRecordDescriptor {
    DnsRecordDescriptor {
        id,
        zone_id: zone_id.to_string(),
        name: name.to_string(),
        record_type: record_type.to_string(),
        value,
        proxied,
        ttl: AUTO_TTL,
        delete_before_replace: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn zones() -> ZoneMap {
        ZoneMap::resolved([("example.com", "zid-1")])
    }

    fn servers() -> ServerRegistry {
        ServerRegistry::new().with_server("web", Ipv4Addr::new(1, 1, 1, 1), Ipv6Addr::LOCALHOST)
    }

    fn compile(yaml: &str) -> Result<Vec<ResourceDescriptor>, CompileError> {
        let document = RecordDocument::parse(yaml).unwrap();
        let (zones, servers) = (zones(), servers());
        RecordCompiler::new(&zones, &servers)
            .compile(&document)
            .map(CompiledRecords::into_descriptors)
    }

    fn dns(descriptor: &ResourceDescriptor) -> &DnsRecordDescriptor {
        match descriptor {
            ResourceDescriptor::DnsRecord(r) => r,
            other => panic!("expected DNS record, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_record_at_apex() {
        let out = compile("example.com:\n  \"@\":\n    kind: raw\n    type: A\n    to: 1.2.3.4\n")
            .unwrap();

        assert_eq!(out.len(), 1);
        let record = dns(&out[0]);
        assert_eq!(record.name, "example.com");
        assert_eq!(record.record_type, "A");
        assert_eq!(record.value, "1.2.3.4");
        assert_eq!(record.zone_id, "zid-1");
        assert_eq!(record.ttl, AUTO_TTL);
        assert_eq!(record.proxied, None);
        assert_eq!(record.id, "record-raw-A-example.com");
    }

    #[test]
    fn test_server_expands_to_a_and_aaaa() {
        let out = compile("example.com:\n  www:\n    kind: server\n    to: web\n").unwrap();

        assert_eq!(out.len(), 2);
        let (a, aaaa) = (dns(&out[0]), dns(&out[1]));
        assert_eq!(a.name, "www.example.com");
        assert_eq!(a.record_type, "A");
        assert_eq!(a.value, "1.1.1.1");
        assert_eq!(a.proxied, Some(true));
        assert_eq!(aaaa.name, "www.example.com");
        assert_eq!(aaaa.record_type, "AAAA");
        assert_eq!(aaaa.value, "::1");
        assert_eq!(aaaa.proxied, Some(true));
        assert_ne!(a.id, aaaa.id);
    }

    #[test]
    fn test_unknown_server_fails() {
        let err = compile("example.com:\n  www:\n    kind: server\n    to: missing\n").unwrap_err();

        match err {
            CompileError::UnknownServer { server, record } => {
                assert_eq!(server, "missing");
                assert_eq!(record, "www.example.com");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_zone_fails_whole_run() {
        // example.com compiles cleanly before zzz.org fails; nothing is returned.
        let err = compile(
            "example.com:\n  www:\n    kind: proxy\nzzz.org:\n  www:\n    kind: proxy\n",
        )
        .unwrap_err();

        assert!(matches!(err, CompileError::UnknownZone { ref domain } if domain == "zzz.org"));
    }

    #[test]
    fn test_proxy_placeholder() {
        let out = compile("example.com:\n  edge:\n    kind: proxy\n").unwrap();

        let record = dns(&out[0]);
        assert_eq!(record.record_type, "AAAA");
        assert_eq!(record.value, "100::");
        assert_eq!(record.proxied, Some(true));
        assert_eq!(record.id, "record-proxy-edge.example.com");
    }

    #[test]
    fn test_proxy_and_txt_share_a_label() {
        let out = compile(
            r#"
example.com:
  "@":
    - kind: proxy
    - kind: raw
      type: txt
      to: v=spf1 -all
"#,
        )
        .unwrap();

        let ids: Vec<&str> = out.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["record-proxy-example.com", "record-raw-txt-example.com"]);
        assert_eq!(dns(&out[1]).record_type, "txt");
    }

    #[test]
    fn test_raw_type_is_kept_verbatim() {
        let out = compile(
            r#"
example.com:
  www:
    - kind: raw
      type: txt
      to: lower
    - kind: raw
      type: TXT
      to: upper
"#,
        )
        .unwrap();

        let ids: Vec<&str> = out.iter().map(|d| d.id()).collect();
        assert_eq!(
            ids,
            vec!["record-raw-txt-www.example.com", "record-raw-TXT-www.example.com"]
        );
    }

    #[test]
    fn test_records_and_redirects_are_split() {
        let document = RecordDocument::parse(
            r#"
example.com:
  go:
    kind: redirect
    to: https://example.org
  www:
    kind: server
    to: web
"#,
        )
        .unwrap();
        let (zones, servers) = (zones(), servers());

        let out = RecordCompiler::new(&zones, &servers).compile(&document).unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out.redirects.len(), 1);
        assert_eq!(out.redirects[0].id, "record-redirect-go.example.com");
        let ids: Vec<&str> = out.dns_records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["record-server-A-www.example.com", "record-server-AAAA-www.example.com"]
        );

        // flattened, records precede redirects regardless of label order
        let flat: Vec<String> = out
            .into_descriptors()
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        assert_eq!(flat[2], "record-redirect-go.example.com");
    }

    #[test]
    fn test_redirects() {
        let out = compile(
            r#"
example.com:
  go:
    kind: redirect
    to: https://example.org/landing
    path: /*
    type: permanent
    priority: 2
  old:
    kind: redirect
    to: https://example.org
"#,
        )
        .unwrap();

        let rules: Vec<&RedirectDescriptor> = out
            .iter()
            .map(|d| match d {
                ResourceDescriptor::RedirectRule(r) => r,
                other => panic!("expected redirect, got {:?}", other),
            })
            .collect();

        assert_eq!(rules[0].target, "go.example.com/*");
        assert_eq!(rules[0].destination_url, "https://example.org/landing");
        assert_eq!(rules[0].status_code, 301);
        assert_eq!(rules[0].priority, Some(2));
        assert_eq!(rules[1].target, "old.example.com");
        assert_eq!(rules[1].status_code, 302);
        assert_eq!(rules[1].priority, None);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let yaml = r#"
example.com:
  www:
    kind: server
    to: web
  "@":
    - kind: proxy
    - kind: raw
      type: MX
      to: mail.example.com
  go:
    kind: redirect
    to: https://example.org
"#;
        assert_eq!(compile(yaml).unwrap(), compile(yaml).unwrap());
    }

    #[test]
    fn test_value_change_keeps_identifier() {
        let before = compile("example.com:\n  api:\n    kind: raw\n    type: CNAME\n    to: a.host\n")
            .unwrap();
        let after = compile("example.com:\n  api:\n    kind: raw\n    type: CNAME\n    to: b.host\n")
            .unwrap();

        assert_eq!(before[0].id(), after[0].id());
        assert_ne!(dns(&before[0]).value, dns(&after[0]).value);
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let err = compile(
            r#"
example.com:
  www:
    - kind: raw
      type: TXT
      to: one
    - kind: raw
      type: TXT
      to: two
"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CompileError::DuplicateResource { ref id } if id == "record-raw-TXT-www.example.com"
        ));
    }

    #[test]
    fn test_domain_without_records_is_fine() {
        let zones = ZoneMap::resolved([("example.com", "zid-1"), ("unused.com", "zid-2")]);
        let servers = servers();
        let document = RecordDocument::parse("example.com:\n  www:\n    kind: proxy\n").unwrap();

        let out = RecordCompiler::new(&zones, &servers).compile(&document).unwrap();
        assert_eq!(out.len(), 1);
    }
}

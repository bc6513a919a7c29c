//! Plan
//!
//! Resolve-then-compile: every zone lookup is awaited into a [`ZoneMap`]
//! first, then both compilers run synchronously over it.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::descriptor::{
    DnsRecordDescriptor, RedirectDescriptor, ResourceDescriptor, RulesetDescriptor,
};
use crate::error::CompileError;
use crate::records::RecordCompiler;
use crate::registry::ServerRegistry;
use crate::spec::{RecordDocument, TransformDocument};
use crate::transforms::TransformCompiler;
use crate::zones::{ZoneLookup, ZoneMap, ZoneResolver};

/// The compiled output of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub zones: ZoneMap,
    pub dns_records: Vec<DnsRecordDescriptor>,
    pub redirects: Vec<RedirectDescriptor>,
    pub rulesets: Vec<RulesetDescriptor>,
}

impl Plan {
    /// Load both documents, resolve the configured domains and compile.
    ///
    /// Documents are parsed before any lookup is issued, so a malformed
    /// document never costs a network round trip.
    pub async fn build(config: &Config, lookup: &dyn ZoneLookup) -> Result<Self> {
        let records = load_records(&config.records_path())?;
        let transforms = load_transforms(&config.transforms_path())?;

        let zones = ZoneResolver::new(lookup).resolve(&config.domains).await;

        let plan = Self::compile(zones, &config.servers, &records, &transforms)
            .context("Compilation failed")?;

        info!(
            dns_records = plan.dns_records.len(),
            redirects = plan.redirects.len(),
            rulesets = plan.rulesets.len(),
            "Compiled plan"
        );

        Ok(plan)
    }

    /// Compile already-loaded documents against a resolved zone map
    pub fn compile(
        zones: ZoneMap,
        servers: &ServerRegistry,
        records: &RecordDocument,
        transforms: &TransformDocument,
    ) -> Result<Self, CompileError> {
        let records = RecordCompiler::new(&zones, servers).compile(records)?;
        let rulesets = TransformCompiler::new(&zones).compile(transforms)?;

        Ok(Self {
            zones,
            dns_records: records.dns_records,
            redirects: records.redirects,
            rulesets,
        })
    }

    /// Every descriptor as one flat list: records, redirects, then rulesets
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        self.dns_records
            .iter()
            .cloned()
            .map(ResourceDescriptor::DnsRecord)
            .chain(self.redirects.iter().cloned().map(ResourceDescriptor::RedirectRule))
            .chain(self.rulesets.iter().cloned().map(ResourceDescriptor::Ruleset))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.dns_records.len() + self.redirects.len() + self.rulesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read and parse the records document
pub fn load_records(path: &Path) -> Result<RecordDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records document {}", path.display()))?;
    RecordDocument::parse(&content)
        .with_context(|| format!("Invalid records document {}", path.display()))
}

/// Read and parse the transforms document; a missing file means no transforms
pub fn load_transforms(path: &Path) -> Result<TransformDocument> {
    if !path.exists() {
        debug!(path = %path.display(), "No transforms document");
        return Ok(TransformDocument::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transforms document {}", path.display()))?;
    TransformDocument::parse(&content)
        .with_context(|| format!("Invalid transforms document {}", path.display()))
}

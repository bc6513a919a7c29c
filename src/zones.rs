//! Zone Resolver
//!
//! Maps domains to provider zone identifiers before any compilation starts.
//! Lookups for distinct domains are independent and run concurrently; the
//! result is a fully-populated [`ZoneMap`] that the compilers only read.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CompileError;

/// Source of zone identifiers
#[async_trait]
pub trait ZoneLookup: Send + Sync {
    /// Look up the zone identifier for an apex domain
    async fn zone_id(&self, domain: &str) -> Result<String>;
}

/// Outcome of a single zone lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "detail")]
pub enum ZoneStatus {
    Resolved(String),
    /// The lookup failed; holds the reason
    Unresolved(String),
}

/// Resolved zones for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ZoneMap {
    zones: BTreeMap<String, ZoneStatus>,
}

impl ZoneMap {
    /// Build a map where every given domain is resolved
    pub fn resolved<I, D, Z>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (D, Z)>,
        D: Into<String>,
        Z: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(d, z)| (d.into(), ZoneStatus::Resolved(z.into())))
            .collect()
    }

    /// Zone identifier for a domain, or `UnknownZone` if it was never
    /// requested or its lookup failed
    pub fn require(&self, domain: &str) -> Result<&str, CompileError> {
        match self.zones.get(domain) {
            Some(ZoneStatus::Resolved(id)) => Ok(id),
            _ => Err(CompileError::UnknownZone {
                domain: domain.to_string(),
            }),
        }
    }

    pub fn get(&self, domain: &str) -> Option<&ZoneStatus> {
        self.zones.get(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ZoneStatus)> {
        self.zones.iter().map(|(d, s)| (d.as_str(), s))
    }

    /// Domains whose lookup failed
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.zones
            .iter()
            .filter(|(_, s)| matches!(s, ZoneStatus::Unresolved(_)))
            .map(|(d, _)| d.as_str())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl FromIterator<(String, ZoneStatus)> for ZoneMap {
    fn from_iter<I: IntoIterator<Item = (String, ZoneStatus)>>(iter: I) -> Self {
        Self {
            zones: iter.into_iter().collect(),
        }
    }
}

/// Resolves a domain list through a [`ZoneLookup`]
pub struct ZoneResolver<'a> {
    lookup: &'a dyn ZoneLookup,
}

impl<'a> ZoneResolver<'a> {
    pub fn new(lookup: &'a dyn ZoneLookup) -> Self {
        Self { lookup }
    }

    /// Look up every domain concurrently and wait for all of them.
    ///
    /// Failed lookups are recorded as [`ZoneStatus::Unresolved`] rather than
    /// returned as errors; compilation turns them into `UnknownZone` for any
    /// domain a document actually references.
    pub async fn resolve(&self, domains: &[String]) -> ZoneMap {
        let unique: BTreeSet<&str> = domains.iter().map(String::as_str).collect();
        info!(count = unique.len(), "Resolving zones");

        let lookups = unique.into_iter().map(|domain| async move {
            let status = match self.lookup.zone_id(domain).await {
                Ok(id) => {
                    debug!(domain, zone_id = %id, "Resolved zone");
                    ZoneStatus::Resolved(id)
                }
                Err(e) => {
                    warn!(domain, error = %e, "Zone lookup failed");
                    ZoneStatus::Unresolved(e.to_string())
                }
            };
            (domain.to_string(), status)
        });

        join_all(lookups).await.into_iter().collect()
    }
}

/// Fixed domain -> zone mapping, used when running offline
#[derive(Debug, Clone, Default)]
pub struct StaticZones {
    zones: BTreeMap<String, String>,
}

impl StaticZones {
    pub fn new(zones: BTreeMap<String, String>) -> Self {
        Self { zones }
    }
}

#[async_trait]
impl ZoneLookup for StaticZones {
    async fn zone_id(&self, domain: &str) -> Result<String> {
        self.zones
            .get(domain)
            .cloned()
            .ok_or_else(|| anyhow!("no static zone configured for '{}'", domain))
    }
}

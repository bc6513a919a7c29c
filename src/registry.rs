//! Server Registry
//!
//! Compute instances that DNS records may target by name. The registry is
//! supplied by the caller, never derived from the records document.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

/// Public addresses of one server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub v4: Ipv4Addr,
    pub v6: Ipv6Addr,
}

/// Name -> address pair lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerRegistry {
    servers: BTreeMap<String, Server>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server, replacing any previous entry with the same name
    pub fn with_server(mut self, name: impl Into<String>, v4: Ipv4Addr, v6: Ipv6Addr) -> Self {
        self.servers.insert(name.into(), Server { v4, v6 });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Server> {
        self.servers.get(name)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl FromIterator<(String, Server)> for ServerRegistry {
    fn from_iter<I: IntoIterator<Item = (String, Server)>>(iter: I) -> Self {
        Self {
            servers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builder() {
        let registry = ServerRegistry::new().with_server(
            "web",
            Ipv4Addr::new(1, 1, 1, 1),
            Ipv6Addr::LOCALHOST,
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("web").unwrap().v6.to_string(), "::1");
        assert!(registry.get("db").is_none());
    }

    #[test]
    fn test_registry_from_yaml() {
        let registry: ServerRegistry = serde_yaml::from_str(
            "waffle-primary:\n  v4: 203.0.113.7\n  v6: 2001:db8::7\n",
        )
        .unwrap();

        let server = registry.get("waffle-primary").unwrap();
        assert_eq!(server.v4, Ipv4Addr::new(203, 0, 113, 7));
        assert_eq!(server.v6.to_string(), "2001:db8::7");
    }
}

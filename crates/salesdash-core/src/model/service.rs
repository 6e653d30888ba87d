//! Managed service definition

use super::port::PortMapping;
use std::collections::BTreeMap;

/// One container managed by the launcher (database or application)
///
/// Built once from [`LaunchConfig`](super::LaunchConfig) and never mutated.
/// Environment variables are kept ordered so the generated command line is
/// stable between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub image: String,
    pub network: String,
    pub environment: BTreeMap<String, String>,
    pub ports: Vec<PortMapping>,
    /// Remove the container once it stops (`--rm`)
    pub auto_remove: bool,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            network: network.into(),
            environment: BTreeMap::new(),
            ports: Vec::new(),
            auto_remove: true,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn port(mut self, mapping: PortMapping) -> Self {
        self.ports.push(mapping);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_env_sorted() {
        let spec = ServiceSpec::new("db", "postgres:15", "net")
            .env("POSTGRES_USER", "postgres")
            .env("POSTGRES_DB", "sales_db")
            .port(PortMapping::new(5432, 5432));

        let keys: Vec<_> = spec.environment.keys().cloned().collect();
        assert_eq!(keys, vec!["POSTGRES_DB", "POSTGRES_USER"]);
        assert_eq!(spec.ports, vec![PortMapping::new(5432, 5432)]);
        assert!(spec.auto_remove);
    }
}

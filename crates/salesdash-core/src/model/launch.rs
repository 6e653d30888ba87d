//! Launch configuration: the fixed names, ports and credentials shared by every stage

use super::port::PortMapping;
use super::retry::RetryPolicy;
use super::service::ServiceSpec;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the launcher needs to know about the topology
///
/// All fields have built-in defaults, so an empty YAML document (or no file
/// at all) yields the standard setup, an excerpt of which is:
///
/// ```yaml
/// network: sales-dashboard-net
/// database:
///   container: sales-postgres
///   host_port: 5432
/// app:
///   image: sales-dashboard:latest
///   host_port: 5000
/// publish:
///   port: 8080
/// row_counts: warn
/// ```
///
/// `app.build_context` is unset by default; set it to build the image first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchConfig {
    /// Container runtime CLI (docker, or a compatible binary such as podman)
    pub runtime: String,
    pub network: String,
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub data: DataConfig,
    pub publish: PublishConfig,
    pub readiness: ReadinessConfig,
    pub row_counts: RowCountPolicy,
    /// Check that every host port can be bound before starting anything
    pub preflight_ports: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub container: String,
    pub image: String,
    pub host_port: u16,
    pub container_port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub container: String,
    pub image: String,
    /// Build the image from this directory before starting the container
    pub build_context: Option<PathBuf>,
    pub host_port: u16,
    pub container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// `product_id,product_name`
    pub products_csv: PathBuf,
    /// `product_id,date,sales`
    pub sales_csv: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    pub dir: PathBuf,
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessConfig {
    pub database: RetryPolicy,
    pub fetch: RetryPolicy,
}

/// What to do when the loaded row count differs from the CSV line count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowCountPolicy {
    /// Report the mismatch and continue
    #[default]
    Warn,
    /// Fail the load stage
    Strict,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            network: "sales-dashboard-net".to_string(),
            database: DatabaseConfig::default(),
            app: AppConfig::default(),
            data: DataConfig::default(),
            publish: PublishConfig::default(),
            readiness: ReadinessConfig::default(),
            row_counts: RowCountPolicy::default(),
            preflight_ports: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            container: "sales-postgres".to_string(),
            image: "postgres:15".to_string(),
            host_port: 5432,
            container_port: 5432,
            name: "sales_db".to_string(),
            user: "postgres".to_string(),
            password: "password".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            container: "sales-dashboard-app".to_string(),
            image: "sales-dashboard:latest".to_string(),
            build_context: None,
            host_port: 5000,
            container_port: 5000,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            products_csv: PathBuf::from("data/products.csv"),
            sales_csv: PathBuf::from("data/sales_data.csv"),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dashboard_static"),
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            database: RetryPolicy::database(),
            fetch: RetryPolicy::fetch(),
        }
    }
}

impl LaunchConfig {
    /// PostgreSQL container bound to the shared network
    pub fn database_service(&self) -> ServiceSpec {
        let db = &self.database;
        ServiceSpec::new(&db.container, &db.image, &self.network)
            .env("POSTGRES_DB", &db.name)
            .env("POSTGRES_USER", &db.user)
            .env("POSTGRES_PASSWORD", &db.password)
            .port(PortMapping::new(db.host_port, db.container_port))
    }

    /// Dashboard application wired to the database by container name
    pub fn app_service(&self) -> ServiceSpec {
        let db = &self.database;
        ServiceSpec::new(&self.app.container, &self.app.image, &self.network)
            .env("DB_HOST", &db.container)
            .env("DB_PORT", db.container_port.to_string())
            .env("DB_NAME", &db.name)
            .env("DB_USER", &db.user)
            .env("DB_PASSWORD", &db.password)
            .port(PortMapping::new(self.app.host_port, self.app.container_port))
    }

    /// Services in start order
    pub fn services(&self) -> Vec<ServiceSpec> {
        vec![self.database_service(), self.app_service()]
    }

    pub fn app_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.app.host_port)
    }

    pub fn publish_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.publish.port)
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgresql://{}@127.0.0.1:{}/{}",
            self.database.user, self.database.host_port, self.database.name
        )
    }

    /// Host ports that must be free before provisioning starts
    pub fn host_ports(&self) -> [u16; 3] {
        [self.database.host_port, self.app.host_port, self.publish.port]
    }

    /// Reject configurations that cannot work regardless of the environment
    pub fn validate(&self) -> Result<()> {
        if self.runtime.trim().is_empty() {
            return Err(ConfigError::Invalid("runtime must not be empty".into()));
        }
        if self.network.trim().is_empty() {
            return Err(ConfigError::Invalid("network must not be empty".into()));
        }
        if self.database.container == self.app.container {
            return Err(ConfigError::Invalid(format!(
                "database and app share the container name '{}'",
                self.app.container
            )));
        }

        let ports = self.host_ports();
        for (i, port) in ports.iter().enumerate() {
            if *port == 0 {
                return Err(ConfigError::Invalid("host ports must be non-zero".into()));
            }
            if ports[i + 1..].contains(port) {
                return Err(ConfigError::Invalid(format!(
                    "host port {} is assigned more than once",
                    port
                )));
            }
        }

        for (name, policy) in [
            ("readiness.database", self.readiness.database),
            ("readiness.fetch", self.readiness.fetch),
        ] {
            if policy.max_attempts == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{}.max_attempts must be at least 1",
                    name
                )));
            }
        }

        Ok(())
    }
}

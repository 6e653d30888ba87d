//! Host to container port mapping

use serde::{Deserialize, Serialize};
use std::fmt;

/// Port published from a container to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl PortMapping {
    pub fn new(host: u16, container: u16) -> Self {
        Self { host, container }
    }
}

/// Rendered the way `docker run -p` expects it
impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_publish_flag() {
        assert_eq!(PortMapping::new(5433, 5432).to_string(), "5433:5432");
    }
}

// Config Revision Domain Model

use crate::domain::error::DomainError;
use std::str::FromStr;

/// Monotonic change counter of one config domain
pub type Revision = u64;

/// Config domain tracked by its own revision row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigDomain {
    QueueDefinition,
    Routing,
}

impl ConfigDomain {
    /// Storage key of the revision row
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigDomain::QueueDefinition => "queue_definition",
            ConfigDomain::Routing => "routing",
        }
    }
}

impl std::fmt::Display for ConfigDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigDomain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queue_definition" => Ok(ConfigDomain::QueueDefinition),
            "routing" => Ok(ConfigDomain::Routing),
            other => Err(DomainError::UnknownConfigDomain(other.to_string())),
        }
    }
}

use core::fmt;
use core::str::FromStr;
use std::borrow::Borrow;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{KernelError, KernelResult};

/// Stable string identifier of an agent (component instance).
///
/// Ordered so it can key `BTreeMap`s, which keeps every iteration that
/// feeds the log deterministic.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create a new agent ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the ID is usable as the agent half of an `"agent.attr"` key.
    pub fn validate(&self) -> KernelResult<()> {
        if self.0.is_empty() {
            return Err(KernelError::InvalidAgentId {
                id: self.0.clone(),
                reason: "must not be empty",
            });
        }
        if self.0.chars().any(char::is_whitespace) {
            return Err(KernelError::InvalidAgentId {
                id: self.0.clone(),
                reason: "must not contain whitespace",
            });
        }
        Ok(())
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Reference to one named attribute of one agent, written `"agentId.attr"`.
///
/// The attribute is everything after the last `.`, so agent ids may carry
/// dots of their own (`"zone.1.level"` is agent `zone.1`, attribute `level`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrRef {
    pub agent: AgentId,
    pub attr: String,
}

impl AttrRef {
    pub fn new(agent: impl Into<AgentId>, attr: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            attr: attr.into(),
        }
    }

    /// Parse `"agentId.attr"`.
    pub fn parse(reference: &str) -> KernelResult<Self> {
        let malformed = || KernelError::MalformedAttrRef {
            reference: reference.to_string(),
        };
        let (agent, attr) = reference.rsplit_once('.').ok_or_else(malformed)?;
        if agent.is_empty() || attr.is_empty() {
            return Err(malformed());
        }
        let agent = AgentId::new(agent);
        agent.validate().map_err(|_| malformed())?;
        Ok(Self::new(agent, attr))
    }

    /// Flat `"agentId.attr"` key used as a log column name.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Debug for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttrRef({}.{})", self.agent, self.attr)
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.agent, self.attr)
    }
}

impl FromStr for AttrRef {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AttrRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AttrRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_simple_reference() {
        let r = AttrRef::parse("tank.level").unwrap();
        assert_eq!(r.agent.as_str(), "tank");
        assert_eq!(r.attr, "level");
        assert_eq!(r.key(), "tank.level");
    }

    #[test]
    fn attribute_is_after_last_dot() {
        let r = AttrRef::parse("zone.1.level").unwrap();
        assert_eq!(r.agent.as_str(), "zone.1");
        assert_eq!(r.attr, "level");
    }

    #[test]
    fn malformed_references_rejected() {
        for bad in ["", "tank", ".level", "tank.", "my tank.level"] {
            assert!(
                matches!(
                    AttrRef::parse(bad),
                    Err(KernelError::MalformedAttrRef { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_agent_id_invalid() {
        assert!(AgentId::new("").validate().is_err());
        assert!(AgentId::new("pump_1").validate().is_ok());
    }

    proptest! {
        #[test]
        fn display_parse_round_trip(agent in "[a-zA-Z_][a-zA-Z0-9_.]{0,12}[a-zA-Z0-9_]", attr in "[a-z_]{1,10}") {
            let r = AttrRef::new(agent.as_str(), attr.as_str());
            let parsed = AttrRef::parse(&r.to_string()).unwrap();
            prop_assert_eq!(parsed, r);
        }
    }
}

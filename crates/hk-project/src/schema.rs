//! Simulation configuration schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    pub simulation_params: SimulationParams,
    #[serde(default)]
    pub components: ComponentMap,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order: Option<Vec<OrderEntryDef>>,
    #[serde(default)]
    pub failure_policy: FailurePolicyDef,
    #[serde(default)]
    pub logger_config: LoggerConfigDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventDef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub datasets: BTreeMap<String, Vec<f64>>,
    /// Accepted and carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessing: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    pub total_time: f64,
    pub dt: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl ComponentDef {
    pub fn new(type_tag: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            type_tag: type_tag.into(),
            properties,
        }
    }
}

/// Components keyed by id, in declaration order.
///
/// Declaration order decides tie-breaks in the execution order, so it is
/// kept exactly as written rather than sorted or hashed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentMap {
    entries: Vec<(String, ComponentDef)>,
}

impl ComponentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component. Returns false (and changes nothing) if `id` is
    /// already present.
    pub fn insert(&mut self, id: impl Into<String>, def: ComponentDef) -> bool {
        let id = id.into();
        if self.get(&id).is_some() {
            return false;
        }
        self.entries.push((id, def));
        true
    }

    pub fn get(&self, id: &str) -> Option<&ComponentDef> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, def)| def)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ComponentDef> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == id)
            .map(|(_, def)| def)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComponentDef)> {
        self.entries.iter().map(|(id, def)| (id.as_str(), def))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ComponentDef)> {
        self.entries.iter_mut().map(|(id, def)| (id.as_str(), def))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ComponentMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, def) in &self.entries {
            map.serialize_entry(id, def)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ComponentMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ComponentMapVisitor;

        impl<'de> Visitor<'de> for ComponentMapVisitor {
            type Value = ComponentMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of component id to {type, properties}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ComponentMap, A::Error> {
                let mut components = ComponentMap::new();
                while let Some((id, def)) = access.next_entry::<String, ComponentDef>()? {
                    if components.contains(&id) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate component id '{id}'"
                        )));
                    }
                    components.entries.push((id, def));
                }
                Ok(components)
            }
        }

        deserializer.deserialize_map(ComponentMapVisitor)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedDef {
    #[default]
    SameTick,
    PreviousTick,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDef {
    /// `"agentId.attr"` of an output.
    pub source: String,
    /// `"agentId.attr"` of an input.
    pub target: String,
    #[serde(default, skip_serializing_if = "is_same_tick")]
    pub feed: FeedDef,
}

fn is_same_tick(feed: &FeedDef) -> bool {
    *feed == FeedDef::SameTick
}

/// A single agent id or a stage group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OrderEntryDef {
    Single(String),
    Stage(Vec<String>),
}

impl OrderEntryDef {
    pub fn ids(&self) -> &[String] {
        match self {
            OrderEntryDef::Single(id) => std::slice::from_ref(id),
            OrderEntryDef::Stage(ids) => ids,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicyDef {
    #[default]
    HoldLast,
    Unavailable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfigDef {
    #[serde(default = "default_record_every")]
    pub record_every: u64,
}

fn default_record_every() -> u64 {
    1
}

impl Default for LoggerConfigDef {
    fn default() -> Self {
        Self {
            record_every: default_record_every(),
        }
    }
}

/// Attribute write scheduled at simulation time `time`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDef {
    pub time: f64,
    /// `"agentId.attr"`.
    pub target: String,
    pub value: f64,
}

/// Supervisory settings for hosted runs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchDef {
    /// Seconds an agent waits for an operator decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_timeout: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_safe: Option<FailSafeDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailSafeDef {
    Approve,
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_keep_declaration_order() {
        let json = r#"{
            "simulationParams": {"totalTime": 3.0, "dt": 1.0},
            "components": {
                "zeta": {"type": "dummy"},
                "alpha": {"type": "constant", "properties": {"value": 1.0}},
                "mid": {"type": "dummy"}
            }
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        let ids: Vec<_> = config.components.ids().collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        assert_eq!(config.failure_policy, FailurePolicyDef::HoldLast);
        assert_eq!(config.logger_config.record_every, 1);

        let back = serde_json::to_string(&config).unwrap();
        let zeta = back.find("zeta").unwrap();
        let alpha = back.find("alpha").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn duplicate_component_id_is_rejected() {
        let yaml = "
simulationParams: { totalTime: 1.0, dt: 1.0 }
components:
  A: { type: dummy }
  A: { type: dummy }
";
        let err = serde_yaml::from_str::<SimulationConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("A"), "{err}");
    }

    #[test]
    fn order_entries_accept_ids_and_groups() {
        let entries: Vec<OrderEntryDef> = serde_json::from_str(r#"["A", ["B", "C"]]"#).unwrap();
        assert_eq!(
            entries,
            vec![
                OrderEntryDef::Single("A".to_string()),
                OrderEntryDef::Stage(vec!["B".to_string(), "C".to_string()])
            ]
        );
        assert_eq!(entries[1].ids().len(), 2);
    }

    #[test]
    fn connection_feed_defaults_to_same_tick() {
        let conn: ConnectionDef =
            serde_json::from_str(r#"{"source": "A.output", "target": "B.input"}"#).unwrap();
        assert_eq!(conn.feed, FeedDef::SameTick);
        let conn: ConnectionDef = serde_json::from_str(
            r#"{"source": "A.output", "target": "B.input", "feed": "previous_tick"}"#,
        )
        .unwrap();
        assert_eq!(conn.feed, FeedDef::PreviousTick);
    }
}

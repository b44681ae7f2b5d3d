//! Type tag → factory registration map.

use std::collections::BTreeMap;
use std::fmt;

use hk_core::AgentId;

use crate::error::{ComponentError, ComponentResult};
use crate::properties::Properties;
use crate::traits::Steppable;
use crate::{
    Accumulator, Constant, Delay, Dummy, Faulty, Gain, Lag, Series, SupervisedSwitch, Sum,
};

/// Factory producing a fresh component from its id and properties.
pub type ComponentFactory =
    Box<dyn Fn(&AgentId, &Properties) -> ComponentResult<Box<dyn Steppable>> + Send + Sync>;

/// Registry of component types.
///
/// Populated once at startup and then shared read-only; there is no global
/// instance.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all stock components registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        self.insert_builtin(Constant::TYPE_TAG, Constant::from_properties);
        self.insert_builtin(Gain::TYPE_TAG, Gain::from_properties);
        self.insert_builtin(Sum::TYPE_TAG, Sum::from_properties);
        self.insert_builtin(Delay::TYPE_TAG, Delay::from_properties);
        self.insert_builtin(Accumulator::TYPE_TAG, Accumulator::from_properties);
        self.insert_builtin(Lag::TYPE_TAG, Lag::from_properties);
        self.insert_builtin(Series::TYPE_TAG, Series::from_properties);
        self.insert_builtin(Dummy::TYPE_TAG, Dummy::from_properties);
        self.insert_builtin(Faulty::TYPE_TAG, Faulty::from_properties);
        self.insert_builtin(SupervisedSwitch::TYPE_TAG, SupervisedSwitch::from_properties);
    }

    fn insert_builtin<T, F>(&mut self, tag: &str, ctor: F)
    where
        T: Steppable + 'static,
        F: Fn(&AgentId, &Properties) -> ComponentResult<T> + Send + Sync + 'static,
    {
        let factory: ComponentFactory = Box::new(move |id: &AgentId, props: &Properties| {
            ctor(id, props).map(|c| Box::new(c) as Box<dyn Steppable>)
        });
        self.factories.insert(tag.to_string(), factory);
    }

    /// Register a factory under `tag`. Tags are unique.
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F) -> ComponentResult<()>
    where
        F: Fn(&AgentId, &Properties) -> ComponentResult<Box<dyn Steppable>>
            + Send
            + Sync
            + 'static,
    {
        let tag = tag.into();
        if self.factories.contains_key(&tag) {
            return Err(ComponentError::DuplicateType { tag });
        }
        self.factories.insert(tag, Box::new(factory));
        Ok(())
    }

    /// Construct an instance of `tag`.
    pub fn create(
        &self,
        tag: &str,
        id: &AgentId,
        properties: &Properties,
    ) -> ComponentResult<Box<dyn Steppable>> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| ComponentError::UnknownType {
                tag: tag.to_string(),
            })?;
        factory(id, properties)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("tags", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtins_are_registered() {
        let registry = ComponentRegistry::with_builtins();
        for tag in ["constant", "gain", "sum", "delay", "dummy", "faulty"] {
            assert!(registry.contains(tag), "missing builtin {tag}");
        }
        let tags: Vec<_> = registry.tags().collect();
        let mut sorted = tags.clone();
        sorted.sort();
        assert_eq!(tags, sorted);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let registry = ComponentRegistry::with_builtins();
        let err = registry
            .create("reservoir", &AgentId::new("r1"), &Properties::new())
            .err()
            .unwrap();
        assert_eq!(
            err,
            ComponentError::UnknownType {
                tag: "reservoir".to_string()
            }
        );
    }

    #[test]
    fn create_passes_properties() {
        let registry = ComponentRegistry::with_builtins();
        let props = json!({"value": 5.0}).as_object().cloned().unwrap();
        let agent = registry
            .create("constant", &AgentId::new("A"), &props)
            .unwrap();
        assert_eq!(agent.type_tag(), "constant");
        assert_eq!(agent.attribute("output"), Some(5.0));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ComponentRegistry::with_builtins();
        let result = registry.register("constant", |id: &AgentId, p: &Properties| {
            Constant::from_properties(id, p).map(|c| Box::new(c) as Box<dyn Steppable>)
        });
        assert!(matches!(result, Err(ComponentError::DuplicateType { .. })));
    }
}

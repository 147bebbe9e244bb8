//! Explicit registries replacing the original's module-level globals
//! (`spec.md` §9 "Globals → explicit context"). A [`Runtime`] tracks which
//! agent/world/factory names are live in a simulation so that name
//! collisions are caught early and trace references can be rehydrated.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::SimulationError;

/// The kind of entity a [`super::Transaction`] is wrapping a call on, used to
/// pick which registry a name belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Agent,
    World,
    Factory,
}

#[derive(Default)]
pub struct Runtime {
    agents: HashSet<String>,
    worlds: HashSet<String>,
    factories: HashSet<String>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_agent(&mut self, name: &str) -> Result<(), SimulationError> {
        if !self.agents.insert(name.to_string()) {
            return Err(SimulationError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub fn register_world(&mut self, name: &str) -> Result<(), SimulationError> {
        if !self.worlds.insert(name.to_string()) {
            return Err(SimulationError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub fn register_factory(&mut self, name: &str) -> Result<(), SimulationError> {
        if !self.factories.insert(name.to_string()) {
            return Err(SimulationError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub fn has_agent(&self, name: &str) -> bool {
        self.agents.contains(name)
    }

    pub fn has_world(&self, name: &str) -> bool {
        self.worlds.contains(name)
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.factories.contains(name)
    }

    pub fn unregister_agent(&mut self, name: &str) {
        self.agents.remove(name);
    }

    pub fn unregister_world(&mut self, name: &str) {
        self.worlds.remove(name);
    }

    /// Registers `name` under the registry `kind` points to unless it is
    /// already present — called once per distinct entity the first time a
    /// transaction touches it (`spec.md` §4.7, mirroring how the original's
    /// `TinyTransaction.__init__` adds a not-yet-captured object to the
    /// simulation).
    pub fn ensure_registered(&mut self, kind: ObjectKind, name: &str) -> Result<(), SimulationError> {
        match kind {
            ObjectKind::Agent if !self.has_agent(name) => self.register_agent(name),
            ObjectKind::World if !self.has_world(name) => self.register_world(name),
            ObjectKind::Factory if !self.has_factory(name) => self.register_factory(name),
            _ => Ok(()),
        }
    }

    /// Resolves an `AgentRef`/`WorldRef`/`FactoryRef` produced by
    /// [`super::trace`] back to a live registry name, failing loudly rather
    /// than silently rehydrating a stale/unknown reference.
    pub fn resolve(&self, kind: &str, name: &str) -> Result<(), SimulationError> {
        let present = match kind {
            "AgentRef" => self.has_agent(name),
            "WorldRef" => self.has_world(name),
            "FactoryRef" => self.has_factory(name),
            _ => false,
        };
        if present {
            Ok(())
        } else {
            Err(SimulationError::MissingEntity(name.to_string()))
        }
    }

    /// Walks a decoded output/state value for any `*Ref` tags and checks
    /// each against the live registries, failing on the first one not
    /// present (`spec.md` §4.7: "decoding a state whose named agent/world is
    /// not present in live registries fails loudly").
    pub fn resolve_refs(&self, value: &Value) -> Result<(), SimulationError> {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(kind)) = map.get("type") {
                    if matches!(kind.as_str(), "AgentRef" | "WorldRef" | "FactoryRef") {
                        if let Some(Value::String(name)) = map.get("name") {
                            return self.resolve(kind, name);
                        }
                    }
                }
                for v in map.values() {
                    self.resolve_refs(v)?;
                }
                Ok(())
            }
            Value::Array(items) => {
                for item in items {
                    self.resolve_refs(item)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_agent_rejects_duplicates() {
        let mut runtime = Runtime::new();
        runtime.register_agent("Oscar").unwrap();
        let err = runtime.register_agent("Oscar").unwrap_err();
        assert!(matches!(err, SimulationError::DuplicateName(_)));
    }

    #[test]
    fn resolve_fails_for_unregistered_reference() {
        let runtime = Runtime::new();
        let err = runtime.resolve("AgentRef", "Ghost").unwrap_err();
        assert!(matches!(err, SimulationError::MissingEntity(_)));
    }

    #[test]
    fn unregister_allows_name_reuse() {
        let mut runtime = Runtime::new();
        runtime.register_agent("Oscar").unwrap();
        runtime.unregister_agent("Oscar");
        assert!(runtime.register_agent("Oscar").is_ok());
    }

    #[test]
    fn ensure_registered_is_idempotent_for_the_same_name() {
        let mut runtime = Runtime::new();
        runtime.ensure_registered(ObjectKind::Agent, "Oscar").unwrap();
        runtime.ensure_registered(ObjectKind::Agent, "Oscar").unwrap();
        assert!(runtime.has_agent("Oscar"));
    }

    #[test]
    fn resolve_refs_finds_a_ref_nested_inside_a_list() {
        use serde_json::json;

        let mut runtime = Runtime::new();
        runtime.register_agent("Oscar").unwrap();

        let value = json!({"members": [{"type": "AgentRef", "name": "Oscar"}]});
        assert!(runtime.resolve_refs(&value).is_ok());

        let missing = json!({"members": [{"type": "AgentRef", "name": "Ghost"}]});
        assert!(runtime.resolve_refs(&missing).is_err());
    }
}

//! Persona configuration: every attribute a prompt template may reference,
//! plus the free-form `define`/`define_several` escape hatch the original
//! `TinyPerson` exposes for attributes not baked into the struct.
//!
//! Grounded in `original_source/tinytroupe/agent.py`'s `TinyPerson.__init__`
//! / `define` / `define_several` / `define_relationships`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in `currently_accessible_agents` (`spec.md` §4.5 "Ownership of
/// accessibility").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessibleAgentRef {
    pub name: String,
    pub relation_description: String,
}

/// One entry recorded by `define_relationships` / `related_to`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub agent_name: String,
    pub description: String,
}

/// The full persona dict, per `SPEC_FULL.md` §3. Well-known fields are
/// typed; anything defined ad hoc via `define`/`define_several` lives in
/// `attributes`/`groups` so prompt rendering can still find it by name.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PersonaConfiguration {
    pub name: String,
    pub age: Option<u32>,
    pub nationality: Option<String>,
    pub occupation_title: Option<String>,
    pub occupation_description: Option<String>,
    pub routines: Vec<String>,
    pub personality_traits: Vec<String>,
    pub professional_interests: Vec<String>,
    pub personal_interests: Vec<String>,
    pub skills: Vec<String>,
    pub relationships: Vec<RelationshipRecord>,
    pub current_datetime: Option<String>,
    pub current_location: Option<String>,
    /// Replace-on-write list of standalone context fragments (Decision D1).
    pub current_context: Vec<String>,
    pub current_attention: String,
    pub current_goals: String,
    pub current_emotions: String,
    pub currently_accessible_agents: Vec<AccessibleAgentRef>,
    /// Free-form attributes set via `define(key, value, group=None)`.
    pub attributes: HashMap<String, Value>,
    /// Free-form grouped records set via `define_several(group, records)`.
    pub groups: HashMap<String, Vec<Value>>,
}

impl PersonaConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn define(&mut self, key: impl Into<String>, value: Value, group: Option<&str>) {
        match group {
            Some(group) => self.groups.entry(group.to_string()).or_default().push(value),
            None => {
                self.attributes.insert(key.into(), value);
            }
        }
    }

    pub fn define_several(&mut self, group: impl Into<String>, records: Vec<Value>) {
        self.groups.entry(group.into()).or_default().extend(records);
    }

    pub fn define_relationship(&mut self, agent_name: impl Into<String>, description: impl Into<String>) {
        self.relationships.push(RelationshipRecord {
            agent_name: agent_name.into(),
            description: description.into(),
        });
    }

    pub fn clear_relationships(&mut self) {
        self.relationships.clear();
    }

    pub fn make_accessible(&mut self, agent_name: &str, relation_description: impl Into<String>) {
        if !self
            .currently_accessible_agents
            .iter()
            .any(|a| a.name == agent_name)
        {
            self.currently_accessible_agents.push(AccessibleAgentRef {
                name: agent_name.to_string(),
                relation_description: relation_description.into(),
            });
        }
    }

    pub fn make_inaccessible(&mut self, agent_name: &str) {
        self.currently_accessible_agents.retain(|a| a.name != agent_name);
    }

    pub fn make_all_inaccessible(&mut self) {
        self.currently_accessible_agents.clear();
    }
}

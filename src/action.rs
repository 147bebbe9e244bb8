//! Stimulus and action vocabulary (`spec.md` §3, §4.4 "Action grammar is
//! extensible"). Built-in action kinds are a closed tagged union plus an
//! `Extension(String)` escape hatch for faculty-declared kinds, per the
//! REDESIGN FLAGS note in `spec.md` §9 ("Dynamic dispatch on actions →
//! tagged union").

use serde::{Deserialize, Serialize};

/// Inbound event kind (`spec.md` §3 "Stimulus/Action kinds").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StimulusKind {
    Conversation,
    Social,
    Visual,
    Thought,
    InternalGoalFormulation,
}

/// One inbound stimulus, appended to an agent's episodic memory as part of a
/// `user`-role event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    #[serde(rename = "type")]
    pub kind: StimulusKind,
    pub content: String,
    pub source: Option<String>,
}

impl Stimulus {
    pub fn new(kind: StimulusKind, content: impl Into<String>, source: Option<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            source,
        }
    }
}

/// Outbound action kind. Built-ins per `spec.md` §3/§4.4; faculty-declared
/// kinds (RECALL, CONSULT, LIST_DOCUMENTS, WRITE_DOCUMENT, or any future
/// plugin) ride in [`ActionKind::Extension`]. Serializes as a plain string so
/// the wire shape matches `spec.md` §6's `"type": "<ACTION_KIND>"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Done,
    Talk,
    Think,
    ReachOut,
    Extension(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Done => "DONE",
            ActionKind::Talk => "TALK",
            ActionKind::Think => "THINK",
            ActionKind::ReachOut => "REACH_OUT",
            ActionKind::Extension(name) => name.as_str(),
        }
    }
}

impl From<&str> for ActionKind {
    fn from(s: &str) -> Self {
        match s {
            "DONE" => ActionKind::Done,
            "TALK" => ActionKind::Talk,
            "THINK" => ActionKind::Think,
            "REACH_OUT" => ActionKind::ReachOut,
            other => ActionKind::Extension(other.to_string()),
        }
    }
}

impl Serialize for ActionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ActionKind::from(s.as_str()))
    }
}

/// One outbound action, parsed from the LLM response or injected by the
/// agent loop itself (e.g. the pre-act THINK nudge).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind, content: impl Into<String>, target: Option<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            target,
        }
    }

    pub fn done() -> Self {
        Self::new(ActionKind::Done, "", None)
    }

    pub fn think(content: impl Into<String>) -> Self {
        Self::new(ActionKind::Think, content, None)
    }
}

/// `{goals, attention, emotions, context}`, rendered into every prompt
/// (`spec.md` §3 "Cognitive state"). `context` is canonically a list of
/// standalone fragments (Decision D1 in `SPEC_FULL.md` §9) — `change_context`
/// replaces the whole list rather than merging into it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CognitiveState {
    pub goals: String,
    pub attention: String,
    pub emotions: String,
    #[serde(default)]
    pub context: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_as_str_roundtrips_builtins() {
        assert_eq!(ActionKind::Done.as_str(), "DONE");
        assert_eq!(ActionKind::Talk.as_str(), "TALK");
        assert_eq!(
            ActionKind::Extension("RECALL".to_string()).as_str(),
            "RECALL"
        );
    }

    #[test]
    fn done_action_has_no_target() {
        let a = Action::done();
        assert_eq!(a.kind, ActionKind::Done);
        assert!(a.target.is_none());
    }
}

//! Persona-bearing agent: cognitive loop, perception, accessibility, and
//! state capture (`spec.md` §4.5).
//!
//! Grounded in `original_source/tinytroupe/agent.py`'s `TinyPerson.act` /
//! `_observe` / `_produce_message` / `encode_complete_state`, adapted to
//! Rust: no process-wide singletons (agents are addressed by name through
//! whatever registry holds them — `spec.md` §9 "Globals → explicit
//! context"), and transactionality is an explicit wrapper applied by the
//! caller (`crate::simulation::Transaction`), not baked into each method.

pub mod json_extract;
pub mod persona;
pub mod prompt;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::action::{Action, ActionKind, CognitiveState, Stimulus, StimulusKind};
use crate::error::AgentError;
use crate::faculty::Faculty;
use crate::llm::{ChatMessage, LlmClient, LlmParams, Role as LlmRole};
use crate::memory::episodic::{EventPayload, Role as EpisodicRole};
use crate::memory::{EpisodicMemory, SemanticMemory, SemanticMemorySnapshot};

pub use persona::{AccessibleAgentRef, PersonaConfiguration, RelationshipRecord};

/// Hard safety bound on actions performed before `DONE` (`spec.md` §4.5).
pub const MAX_ACTIONS_BEFORE_DONE: usize = 15;

/// One parsed turn: an action plus the cognitive-state delta that came with
/// it, as recorded in `contents` by the original's `act()`.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionRecord {
    pub action: Action,
    pub cognitive_state: CognitiveState,
}

pub struct Agent {
    pub persona: PersonaConfiguration,
    pub episodic_memory: EpisodicMemory,
    pub semantic_memory: SemanticMemory,
    faculties: Vec<Arc<dyn Faculty>>,
    llm_client: Arc<dyn LlmClient>,
    llm_params: LlmParams,
    pending_actions: Vec<Action>,
    displayed_communications: Vec<String>,
    configuration_version: u64,
    faculties_version: u64,
    cached_system_message: Option<(u64, u64, String)>,
}

impl Agent {
    pub fn new(name: impl Into<String>, llm_client: Arc<dyn LlmClient>, semantic_memory: SemanticMemory) -> Self {
        Self {
            persona: PersonaConfiguration::new(name),
            episodic_memory: EpisodicMemory::new(),
            semantic_memory,
            faculties: Vec::new(),
            llm_client,
            llm_params: LlmParams::default(),
            pending_actions: Vec::new(),
            displayed_communications: Vec::new(),
            configuration_version: 0,
            faculties_version: 0,
            cached_system_message: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.persona.name
    }

    pub fn llm_params_mut(&mut self) -> &mut LlmParams {
        &mut self.llm_params
    }

    // ------------------------------------------------------------------
    // Definition
    // ------------------------------------------------------------------

    pub fn define(&mut self, key: impl Into<String>, value: serde_json::Value, group: Option<&str>) {
        self.persona.define(key, value, group);
        self.configuration_version += 1;
    }

    pub fn define_several(&mut self, group: impl Into<String>, records: Vec<serde_json::Value>) {
        self.persona.define_several(group, records);
        self.configuration_version += 1;
    }

    pub fn define_relationships(&mut self, relationships: Vec<RelationshipRecord>, replace: bool) {
        if replace {
            self.persona.clear_relationships();
        }
        self.persona.relationships.extend(relationships);
        self.configuration_version += 1;
    }

    pub fn clear_relationships(&mut self) {
        self.persona.clear_relationships();
        self.configuration_version += 1;
    }

    pub fn related_to(&mut self, other_name: impl Into<String>, description: impl Into<String>) {
        self.persona.define_relationship(other_name, description);
        self.configuration_version += 1;
    }

    pub fn add_mental_faculty(&mut self, faculty: Arc<dyn Faculty>) {
        self.faculties.push(faculty);
        self.faculties_version += 1;
    }

    pub fn add_mental_faculties(&mut self, faculties: Vec<Arc<dyn Faculty>>) {
        self.faculties.extend(faculties);
        self.faculties_version += 1;
    }

    // ------------------------------------------------------------------
    // Perception
    // ------------------------------------------------------------------

    fn observe(&mut self, stimulus: Stimulus) {
        debug!(agent = %self.persona.name, kind = ?stimulus.kind, "observing stimulus");
        self.episodic_memory.store(
            EpisodicRole::User,
            EventPayload::User { stimuli: vec![stimulus] },
            self.persona.current_datetime.clone(),
        );
    }

    pub fn listen(&mut self, speech: impl Into<String>, source: Option<String>) {
        self.observe(Stimulus::new(StimulusKind::Conversation, speech, source));
    }

    pub fn socialize(&mut self, description: impl Into<String>, source: Option<String>) {
        self.observe(Stimulus::new(StimulusKind::Social, description, source));
    }

    pub fn see(&mut self, description: impl Into<String>, source: Option<String>) {
        self.observe(Stimulus::new(StimulusKind::Visual, description, source));
    }

    pub fn think(&mut self, thought: impl Into<String>) {
        let source = Some(self.persona.name.clone());
        self.observe(Stimulus::new(StimulusKind::Thought, thought, source));
    }

    pub fn internalize_goal(&mut self, goal: impl Into<String>) {
        let source = Some(self.persona.name.clone());
        self.observe(Stimulus::new(StimulusKind::InternalGoalFormulation, goal, source));
    }

    // ------------------------------------------------------------------
    // Spatial / context
    // ------------------------------------------------------------------

    /// Replaces the current context list (Decision D1 — `current_context`
    /// is a `Vec<String>`, not a dict, and `change_context` replaces rather
    /// than merges).
    pub fn change_context(&mut self, context: Vec<String>) {
        self.persona.current_context = context.clone();
        self.update_cognitive_state(None, Some(context), None, None);
    }

    pub fn move_to(&mut self, location: impl Into<String>, context: Vec<String>) {
        self.persona.current_location = Some(location.into());
        self.change_context(context);
    }

    /// Called by the World before an agent acts, to keep `current_datetime`
    /// in lockstep with the simulated clock (there is no agent → world
    /// back-pointer; `spec.md` §9 "cyclic references").
    pub fn sync_clock(&mut self, current_datetime: Option<String>) {
        self.persona.current_datetime = current_datetime;
        self.configuration_version += 1;
    }

    // ------------------------------------------------------------------
    // Accessibility
    // ------------------------------------------------------------------

    pub fn make_agent_accessible(&mut self, agent_name: &str, relation_description: impl Into<String>) {
        let already = self
            .persona
            .currently_accessible_agents
            .iter()
            .any(|a| a.name == agent_name);
        if already {
            warn!(agent = %self.persona.name, other = agent_name, "agent is already accessible");
        } else {
            self.persona.make_accessible(agent_name, relation_description);
            self.configuration_version += 1;
        }
    }

    pub fn make_agent_inaccessible(&mut self, agent_name: &str) {
        self.persona.make_inaccessible(agent_name);
        self.configuration_version += 1;
    }

    pub fn make_all_agents_inaccessible(&mut self) {
        self.persona.make_all_inaccessible();
        self.configuration_version += 1;
    }

    pub fn is_accessible(&self, agent_name: &str) -> bool {
        self.persona.currently_accessible_agents.iter().any(|a| a.name == agent_name)
    }

    // ------------------------------------------------------------------
    // Pending actions
    // ------------------------------------------------------------------

    pub fn pop_latest_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending_actions)
    }

    pub fn pop_and_display_latest_communications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.displayed_communications)
    }

    // ------------------------------------------------------------------
    // Prompt assembly
    // ------------------------------------------------------------------

    fn render_system_message(&mut self) -> String {
        if let Some((cfg_v, fac_v, rendered)) = &self.cached_system_message {
            if *cfg_v == self.configuration_version && *fac_v == self.faculties_version {
                return rendered.clone();
            }
        }

        let vars = prompt::build_vars(&self.persona);
        let mut extra = std::collections::HashMap::new();
        let mut definitions = String::new();
        let mut constraints = String::new();
        for faculty in &self.faculties {
            definitions.push_str(&faculty.actions_definitions_prompt());
            definitions.push('\n');
            constraints.push_str(&faculty.actions_constraints_prompt());
            constraints.push('\n');
        }
        extra.insert("action_definitions", definitions);
        extra.insert("action_constraints", constraints);

        let rendered = prompt::render(prompt::DEFAULT_PERSONA_TEMPLATE, &vars, &extra);
        self.cached_system_message = Some((self.configuration_version, self.faculties_version, rendered.clone()));
        rendered
    }

    fn build_messages(&mut self) -> Vec<ChatMessage> {
        let system_message = self.render_system_message();
        let mut messages = vec![ChatMessage {
            role: LlmRole::System,
            content: system_message,
        }];
        for event in self.episodic_memory.retrieve_recent(true) {
            let role = match event.role {
                EpisodicRole::System => LlmRole::System,
                EpisodicRole::User => LlmRole::User,
                EpisodicRole::Assistant => LlmRole::Assistant,
            };
            let content = serde_json::to_string(&event.payload).unwrap_or_default();
            messages.push(ChatMessage { role, content });
        }
        messages
    }

    // ------------------------------------------------------------------
    // Acting
    // ------------------------------------------------------------------

    async fn produce_message(&mut self) -> Result<ActionRecord, AgentError> {
        let messages = self.build_messages();
        let response = self
            .llm_client
            .send_message(&messages, &self.llm_params)
            .await
            .ok_or(AgentError::NoLlmResponse)?;

        let parsed = json_extract::extract_json(&response.content)
            .ok_or_else(|| AgentError::ParseFailed {
                attempts: 1,
                message: "response did not contain a JSON object".to_string(),
            })?;

        let action_value = parsed
            .get("action")
            .ok_or_else(|| AgentError::ParseFailed {
                attempts: 1,
                message: "missing 'action' key".to_string(),
            })?;
        let cognitive_value = parsed
            .get("cognitive_state")
            .ok_or_else(|| AgentError::ParseFailed {
                attempts: 1,
                message: "missing 'cognitive_state' key".to_string(),
            })?;

        let kind_str = action_value
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentError::ParseFailed {
                attempts: 1,
                message: "missing 'action.type' key".to_string(),
            })?;
        let content = match action_value.get("content") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let target = action_value
            .get("target")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let action = Action::new(ActionKind::from(kind_str), content, target);

        let cognitive_state = CognitiveState {
            goals: cognitive_value.get("goals").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            attention: cognitive_value.get("attention").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            emotions: cognitive_value.get("emotions").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            context: self.persona.current_context.clone(),
        };

        Ok(ActionRecord { action, cognitive_state })
    }

    fn update_cognitive_state(
        &mut self,
        goals: Option<String>,
        context: Option<Vec<String>>,
        attention: Option<String>,
        emotions: Option<String>,
    ) {
        if let Some(goals) = goals {
            self.persona.current_goals = goals;
        }
        if let Some(context) = context {
            self.persona.current_context = context;
        }
        if let Some(attention) = attention {
            self.persona.current_attention = attention;
        }
        if let Some(emotions) = emotions {
            self.persona.current_emotions = emotions;
        }
        self.configuration_version += 1;
    }

    async fn act_once(&mut self) -> Result<ActionRecord, AgentError> {
        // A quick THINK nudge, interleaving user/assistant messages, which
        // tends to produce better-behaved model responses.
        self.think("I will now act a bit, and then issue DONE.");

        let record = self.produce_message().await?;

        self.episodic_memory.store(
            EpisodicRole::Assistant,
            EventPayload::Assistant {
                action: record.action.clone(),
                cognitive_state: record.cognitive_state.clone(),
            },
            self.persona.current_datetime.clone(),
        );

        self.pending_actions.push(record.action.clone());
        self.update_cognitive_state(
            Some(record.cognitive_state.goals.clone()),
            None,
            Some(record.cognitive_state.attention.clone()),
            Some(record.cognitive_state.emotions.clone()),
        );

        let faculties = self.faculties.clone();
        for faculty in &faculties {
            faculty.process_action(self, &record.action).await?;
        }

        Ok(record)
    }

    async fn act_once_with_retry(&mut self) -> Result<ActionRecord, AgentError> {
        let mut attempt = 0u32;
        loop {
            match self.act_once().await {
                Ok(record) => return Ok(record),
                Err(AgentError::ParseFailed { message, .. }) => {
                    attempt += 1;
                    if attempt >= 5 {
                        return Err(AgentError::ParseFailed { attempts: attempt, message });
                    }
                    warn!(agent = %self.persona.name, attempt, %message, "act: parse failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Acts in the environment (`spec.md` §4.5 "Act loop semantics"). Either
    /// acts until `DONE`, or exactly `n` times — never both.
    pub async fn act(
        &mut self,
        until_done: bool,
        n: Option<usize>,
        return_actions: bool,
    ) -> Result<Vec<ActionRecord>, AgentError> {
        if until_done && n.is_some() {
            return Err(AgentError::InvalidActArguments(
                "cannot set both until_done and n".to_string(),
            ));
        }
        if let Some(n) = n {
            if n >= MAX_ACTIONS_BEFORE_DONE {
                return Err(AgentError::InvalidActArguments(format!(
                    "n ({n}) must be less than MAX_ACTIONS_BEFORE_DONE ({MAX_ACTIONS_BEFORE_DONE})"
                )));
            }
        }

        let mut contents: Vec<ActionRecord> = Vec::new();

        if let Some(n) = n {
            for _ in 0..n {
                let record = self.act_once_with_retry().await?;
                contents.push(record);
            }
        } else if until_done {
            loop {
                if let Some(last) = contents.last() {
                    if last.action.kind == ActionKind::Done {
                        break;
                    }
                }
                if contents.len() > MAX_ACTIONS_BEFORE_DONE {
                    warn!(agent = %self.persona.name, "acting without ever stopping, aborting act loop");
                    break;
                }
                if contents.len() > 4 {
                    let last3 = &contents[contents.len() - 3..];
                    if last3[0].action == last3[1].action && last3[1].action == last3[2].action {
                        warn!(agent = %self.persona.name, "acting in a loop, aborting act loop");
                        break;
                    }
                }
                let record = self.act_once_with_retry().await?;
                contents.push(record);
            }
        }

        if return_actions {
            Ok(contents)
        } else {
            Ok(Vec::new())
        }
    }

    pub async fn listen_and_act(&mut self, speech: impl Into<String>, return_actions: bool) -> Result<Vec<ActionRecord>, AgentError> {
        self.listen(speech, None);
        self.act(true, None, return_actions).await
    }

    pub async fn see_and_act(&mut self, description: impl Into<String>, return_actions: bool) -> Result<Vec<ActionRecord>, AgentError> {
        self.see(description, None);
        self.act(true, None, return_actions).await
    }

    pub async fn think_and_act(&mut self, thought: impl Into<String>, return_actions: bool) -> Result<Vec<ActionRecord>, AgentError> {
        self.think(thought);
        self.act(true, None, return_actions).await
    }

    // ------------------------------------------------------------------
    // State capture
    // ------------------------------------------------------------------

    pub fn encode_complete_state(&self) -> AgentState {
        AgentState {
            persona: self.persona.clone(),
            episodic_memory: self.episodic_memory.clone(),
            semantic_memory: self.semantic_memory.snapshot(),
            faculty_names: self.faculties.iter().map(|f| f.name().to_string()).collect(),
            configuration_version: self.configuration_version,
            faculties_version: self.faculties_version,
        }
    }

    /// Restores state captured by [`Self::encode_complete_state`]. Faculty
    /// *behavior* is not serialized (trait objects encode executable code,
    /// not data); `faculty_names` is carried for audit only. Re-attaching
    /// concrete faculties after decode is the caller's responsibility.
    pub fn decode_complete_state(&mut self, state: AgentState) {
        self.persona = state.persona;
        self.episodic_memory = state.episodic_memory;
        self.semantic_memory = SemanticMemory::from_snapshot(state.semantic_memory, self.llm_client_as_embedder());
        self.configuration_version = state.configuration_version;
        self.faculties_version = state.faculties_version;
        self.cached_system_message = None;
    }

    fn llm_client_as_embedder(&self) -> Arc<dyn crate::memory::Embedder> {
        Arc::new(crate::memory::LlmEmbedder::new(self.llm_client.clone()))
    }
}

impl crate::simulation::TransactionalState for Agent {
    fn snapshot_state(&self) -> serde_json::Value {
        serde_json::to_value(self.encode_complete_state()).expect("AgentState is always JSON-serializable")
    }

    fn restore_state(&mut self, state: serde_json::Value) {
        let state: AgentState = serde_json::from_value(state).expect("encoded AgentState must round-trip");
        self.decode_complete_state(state);
    }
}

/// Serializable agent specification (`spec.md` §6 "Agent spec").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentState {
    pub persona: PersonaConfiguration,
    pub episodic_memory: EpisodicMemory,
    pub semantic_memory: SemanticMemorySnapshot,
    pub faculty_names: Vec<String>,
    pub configuration_version: u64,
    pub faculties_version: u64,
}

/// `{name, episodic_memory?, semantic_memory?, mental_faculties?, configuration}`
/// per `spec.md` §6, with optional suppression matching the original's
/// `include_memory` / `include_mental_faculties` save-time flags.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub configuration: PersonaConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodic_memory: Option<EpisodicMemory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_memory: Option<SemanticMemorySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mental_faculties: Option<Vec<String>>,
}

impl Agent {
    pub fn save_spec(&self, path: impl AsRef<std::path::Path>, include_mental_faculties: bool, include_memory: bool) -> std::io::Result<()> {
        let spec = AgentSpec {
            name: self.persona.name.clone(),
            configuration: self.persona.clone(),
            episodic_memory: include_memory.then(|| self.episodic_memory.clone()),
            semantic_memory: include_memory.then(|| self.semantic_memory.snapshot()),
            mental_faculties: include_mental_faculties
                .then(|| self.faculties.iter().map(|f| f.name().to_string()).collect()),
        };
        let json = serde_json::to_vec_pretty(&spec)?;
        std::fs::write(path, json)
    }

    pub fn load_spec(
        path: impl AsRef<std::path::Path>,
        llm_client: Arc<dyn LlmClient>,
    ) -> std::io::Result<(AgentSpec, Agent)> {
        let raw = std::fs::read(path)?;
        let spec: AgentSpec = serde_json::from_slice(&raw)?;

        let semantic_memory = match &spec.semantic_memory {
            Some(snapshot) => SemanticMemory::from_snapshot(
                snapshot.clone(),
                Arc::new(crate::memory::LlmEmbedder::new(llm_client.clone())),
            ),
            None => SemanticMemory::new(Arc::new(crate::memory::LlmEmbedder::new(llm_client.clone()))),
        };

        let mut agent = Agent::new(spec.name.clone(), llm_client, semantic_memory);
        agent.persona = spec.configuration.clone();
        if let Some(episodic) = &spec.episodic_memory {
            agent.episodic_memory = episodic.clone();
        }

        Ok((spec, agent))
    }
}

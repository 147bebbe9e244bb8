//! Environment: a step scheduler that advances a simulated clock and
//! dispatches `TALK`/`REACH_OUT` among its member agents (`spec.md` §4.6).
//!
//! Grounded in `original_source/tinytroupe/environment.py`'s `TinyWorld`:
//! `_step` advances the clock, then visits each agent once in insertion
//! order, acting it to completion and dispatching whatever actions it left
//! pending. [`social_network::TinySocialNetwork`] specializes `REACH_OUT`
//! handling and is kept as a sibling type (composition, not inheritance —
//! `spec.md` §9 has no subclassing story for this port).

pub mod social_network;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use social_network::TinySocialNetwork;

use crate::action::{Action, ActionKind};
use crate::agent::{ActionRecord, Agent, AgentState};
use crate::error::WorldError;
use crate::simulation::TransactionalState;

pub struct World {
    pub name: String,
    agents: Vec<Agent>,
    index: HashMap<String, usize>,
    pub current_datetime: Option<DateTime<Utc>>,
    /// When true, a `TALK` with no `target` is broadcast to everyone else in
    /// the world; when false it is silently dropped.
    pub broadcast_if_no_target: bool,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agents: Vec::new(),
            index: HashMap::new(),
            current_datetime: None,
            broadcast_if_no_target: true,
        }
    }

    pub fn add_agent(&mut self, agent: Agent) -> Result<(), WorldError> {
        let name = agent.name().to_string();
        if self.index.contains_key(&name) {
            return Err(WorldError::DuplicateAgent(name));
        }
        self.index.insert(name, self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    pub fn add_agents(&mut self, agents: Vec<Agent>) -> Result<(), WorldError> {
        for agent in agents {
            self.add_agent(agent)?;
        }
        Ok(())
    }

    pub fn has_agent(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get_agent_by_name(&self, name: &str) -> Option<&Agent> {
        self.index.get(name).map(|&i| &self.agents[i])
    }

    pub fn get_agent_mut(&mut self, name: &str) -> Option<&mut Agent> {
        let idx = *self.index.get(name)?;
        Some(&mut self.agents[idx])
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    /// Grants every agent access to every other agent in the world
    /// (`spec.md` §4.6 "make_everyone_accessible").
    pub fn make_everyone_accessible(&mut self) {
        let names = self.agent_names();
        for i in 0..self.agents.len() {
            let self_name = self.agents[i].name().to_string();
            for name in &names {
                if name != &self_name {
                    self.agents[i].make_agent_accessible(name, "member of this environment");
                }
            }
        }
    }

    pub(crate) fn make_all_inaccessible(&mut self) {
        for agent in self.agents.iter_mut() {
            agent.make_all_agents_inaccessible();
        }
    }

    /// Delivers `speech` to every agent except `source` (never echoes back
    /// to the speaker).
    pub fn broadcast(&mut self, speech: impl Into<String>, source: Option<&str>) {
        let speech = speech.into();
        for agent in self.agents.iter_mut() {
            if Some(agent.name()) != source {
                agent.listen(speech.clone(), source.map(|s| s.to_string()));
            }
        }
    }

    /// Broadcasts a thought to literally every agent, source included
    /// (matches the original's unconditional broadcast family).
    pub fn broadcast_thought(&mut self, thought: impl Into<String>) {
        let thought = thought.into();
        for agent in self.agents.iter_mut() {
            agent.think(thought.clone());
        }
    }

    pub fn broadcast_internal_goal(&mut self, goal: impl Into<String>) {
        let goal = goal.into();
        for agent in self.agents.iter_mut() {
            agent.internalize_goal(goal.clone());
        }
    }

    pub fn broadcast_context_change(&mut self, context: Vec<String>) {
        for agent in self.agents.iter_mut() {
            agent.change_context(context.clone());
        }
    }

    pub(crate) fn advance_datetime(&mut self, delta: Option<Duration>) {
        if let Some(delta) = delta {
            let base = self.current_datetime.unwrap_or_else(Utc::now);
            self.current_datetime = Some(base + delta);
        }
    }

    pub(crate) fn sync_all_clocks(&mut self) {
        let formatted = self.current_datetime.map(|dt| dt.to_rfc3339());
        for agent in self.agents.iter_mut() {
            agent.sync_clock(formatted.clone());
        }
    }

    /// Grants mutual accessibility unconditionally — the base policy for a
    /// generic `World`. [`TinySocialNetwork`] overrides this with a
    /// shared-relation requirement. Both sides receive a SOCIAL stimulus
    /// describing the new connection (`spec.md` §4.6).
    pub(crate) fn grant_reach_out(&mut self, source_name: &str, target_name: &str) {
        if let Some(target) = self.get_agent_mut(target_name) {
            target.make_agent_accessible(source_name, "reached out to you");
            target.socialize(
                format!("{source_name} reached out to you, and is now available for interaction."),
                None,
            );
        }
        if let Some(source) = self.get_agent_mut(source_name) {
            source.make_agent_accessible(target_name, "you reached out to them");
            source.socialize(
                format!("{target_name} was successfully reached out, and is now available for interaction."),
                None,
            );
        }
    }

    pub(crate) fn dispatch_talk(&mut self, source_name: &str, content: &str, target: Option<&str>) {
        match target {
            Some(target_name) => {
                if let Some(target_agent) = self.get_agent_mut(target_name) {
                    target_agent.listen(content.to_string(), Some(source_name.to_string()));
                }
            }
            None if self.broadcast_if_no_target => {
                self.broadcast(content.to_string(), Some(source_name));
            }
            None => {}
        }
    }

    fn dispatch_actions(&mut self, source_name: &str, actions: Vec<Action>) -> Result<(), WorldError> {
        for action in actions {
            match &action.kind {
                ActionKind::Talk => self.dispatch_talk(source_name, &action.content, action.target.as_deref()),
                ActionKind::ReachOut => {
                    let target = action.target.clone().ok_or_else(|| {
                        WorldError::UnknownAgent(format!("{source_name}: REACH_OUT action has no target"))
                    })?;
                    self.grant_reach_out(source_name, &target);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// One environment tick: advance the clock, sync it to every agent, then
    /// visit each agent once in insertion order, acting it to completion and
    /// dispatching whatever it left pending.
    pub async fn step(
        &mut self,
        timedelta: Option<Duration>,
        return_actions: bool,
    ) -> Result<HashMap<String, Vec<ActionRecord>>, WorldError> {
        self.advance_datetime(timedelta);
        self.sync_all_clocks();

        let mut results = HashMap::new();
        for name in self.agent_names() {
            let idx = self.index[&name];
            let actions = self.agents[idx]
                .act(true, None, true)
                .await
                .map_err(WorldError::Agent)?;
            let pending = self.agents[idx].pop_latest_actions();
            self.dispatch_actions(&name, pending)?;
            if return_actions {
                results.insert(name, actions);
            }
        }
        Ok(results)
    }

    pub async fn run(
        &mut self,
        steps: usize,
        timedelta_per_step: Option<Duration>,
        return_actions: bool,
    ) -> Result<Vec<HashMap<String, Vec<ActionRecord>>>, WorldError> {
        let mut all = Vec::new();
        for _ in 0..steps {
            let result = self.step(timedelta_per_step, return_actions).await?;
            if return_actions {
                all.push(result);
            }
        }
        Ok(all)
    }

    /// Advances the clock without acting any agent.
    pub fn skip(&mut self, steps: usize, timedelta_per_step: Option<Duration>) {
        for _ in 0..steps {
            self.advance_datetime(timedelta_per_step);
        }
        self.sync_all_clocks();
    }

    pub async fn run_minutes(&mut self, minutes: i64) -> Result<(), WorldError> {
        self.step(Some(Duration::minutes(minutes)), false).await?;
        Ok(())
    }

    pub async fn run_hours(&mut self, hours: i64) -> Result<(), WorldError> {
        self.step(Some(Duration::hours(hours)), false).await?;
        Ok(())
    }

    pub async fn run_days(&mut self, days: i64) -> Result<(), WorldError> {
        self.step(Some(Duration::days(days)), false).await?;
        Ok(())
    }

    pub async fn run_weeks(&mut self, weeks: i64) -> Result<(), WorldError> {
        self.step(Some(Duration::weeks(weeks)), false).await?;
        Ok(())
    }

    pub async fn run_months(&mut self, months: i64) -> Result<(), WorldError> {
        self.step(Some(Duration::weeks(months * 4)), false).await?;
        Ok(())
    }

    pub async fn run_years(&mut self, years: i64) -> Result<(), WorldError> {
        self.step(Some(Duration::days(years * 365)), false).await?;
        Ok(())
    }

    pub fn skip_minutes(&mut self, minutes: i64) {
        self.skip(1, Some(Duration::minutes(minutes)));
    }

    pub fn skip_hours(&mut self, hours: i64) {
        self.skip(1, Some(Duration::hours(hours)));
    }

    pub fn skip_days(&mut self, days: i64) {
        self.skip(1, Some(Duration::days(days)));
    }

    pub fn skip_weeks(&mut self, weeks: i64) {
        self.skip(1, Some(Duration::weeks(weeks)));
    }

    pub fn skip_months(&mut self, months: i64) {
        self.skip(1, Some(Duration::weeks(months * 4)));
    }

    pub fn skip_years(&mut self, years: i64) {
        self.skip(1, Some(Duration::days(years * 365)));
    }

    /// Captures every member agent's complete state, in insertion order, for
    /// the transactional trace (`spec.md` §4.7).
    pub fn encode_complete_state(&self) -> WorldState {
        WorldState {
            name: self.name.clone(),
            agents: self.agents.iter().map(Agent::encode_complete_state).collect(),
            current_datetime: self.current_datetime,
            broadcast_if_no_target: self.broadcast_if_no_target,
        }
    }

    /// Restores state captured by [`Self::encode_complete_state`] into the
    /// already-populated live agents, matched by their position in
    /// `state.agents` — the set and order of member agents must be
    /// unchanged since the snapshot was taken.
    pub fn decode_complete_state(&mut self, state: WorldState) {
        self.name = state.name;
        self.current_datetime = state.current_datetime;
        self.broadcast_if_no_target = state.broadcast_if_no_target;
        for (agent, agent_state) in self.agents.iter_mut().zip(state.agents) {
            agent.decode_complete_state(agent_state);
        }
    }
}

/// Serializable world snapshot, grounded on [`crate::agent::AgentState`]'s
/// same split between persisted memory/persona and caller-reattached
/// behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldState {
    pub name: String,
    pub agents: Vec<AgentState>,
    pub current_datetime: Option<DateTime<Utc>>,
    pub broadcast_if_no_target: bool,
}

impl TransactionalState for World {
    fn snapshot_state(&self) -> serde_json::Value {
        serde_json::to_value(self.encode_complete_state()).expect("WorldState is always JSON-serializable")
    }

    fn restore_state(&mut self, state: serde_json::Value) {
        let state: WorldState = serde_json::from_value(state).expect("encoded WorldState must round-trip");
        self.decode_complete_state(state);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm::MockLlm;
    use crate::memory::{LlmEmbedder, SemanticMemory};

    fn test_agent(name: &str, responses: Vec<String>) -> Agent {
        let llm = Arc::new(MockLlm::scripted(responses));
        let semantic_memory = SemanticMemory::new(Arc::new(LlmEmbedder::new(llm.clone())));
        Agent::new(name, llm, semantic_memory)
    }

    fn done_response() -> String {
        serde_json::json!({
            "action": {"type": "DONE", "content": ""},
            "cognitive_state": {"goals": "", "attention": "", "emotions": ""}
        })
        .to_string()
    }

    fn talk_response(target: &str, content: &str) -> String {
        serde_json::json!({
            "action": {"type": "TALK", "content": content, "target": target},
            "cognitive_state": {"goals": "", "attention": "", "emotions": ""}
        })
        .to_string()
    }

    #[test]
    fn add_agent_rejects_duplicate_names() {
        let mut world = World::new("Office");
        world.add_agent(test_agent("Oscar", vec![done_response()])).unwrap();
        let err = world.add_agent(test_agent("Oscar", vec![done_response()])).unwrap_err();
        assert!(matches!(err, WorldError::DuplicateAgent(_)));
    }

    #[tokio::test]
    async fn step_delivers_targeted_talk_and_drains_pending_actions() {
        let mut world = World::new("Office");
        world
            .add_agent(test_agent("Oscar", vec![talk_response("Lisa", "hello Lisa"), done_response()]))
            .unwrap();
        world.add_agent(test_agent("Lisa", vec![done_response()])).unwrap();

        world.step(None, false).await.unwrap();

        assert!(world.get_agent_by_name("Oscar").unwrap().pop_latest_actions().is_empty());
        let lisa = world.get_agent_by_name("Lisa").unwrap();
        assert!(lisa.episodic_memory.count() > 0);
    }

    #[tokio::test]
    async fn broadcast_never_echoes_to_source() {
        let mut world = World::new("Office");
        world.add_agent(test_agent("Oscar", vec![done_response()])).unwrap();
        world.add_agent(test_agent("Lisa", vec![done_response()])).unwrap();

        let before = world.get_agent_by_name("Oscar").unwrap().episodic_memory.count();
        world.broadcast("good morning", Some("Oscar"));
        assert_eq!(world.get_agent_by_name("Oscar").unwrap().episodic_memory.count(), before);
        assert!(world.get_agent_by_name("Lisa").unwrap().episodic_memory.count() > 0);
    }

    #[test]
    fn grant_reach_out_delivers_social_stimulus_to_both_sides() {
        let mut world = World::new("Office");
        world.add_agent(test_agent("Oscar", vec![done_response()])).unwrap();
        world.add_agent(test_agent("Lisa", vec![done_response()])).unwrap();

        let oscar_before = world.get_agent_by_name("Oscar").unwrap().episodic_memory.count();
        let lisa_before = world.get_agent_by_name("Lisa").unwrap().episodic_memory.count();

        world.grant_reach_out("Oscar", "Lisa");

        assert!(world.get_agent_by_name("Oscar").unwrap().episodic_memory.count() > oscar_before);
        assert!(world.get_agent_by_name("Lisa").unwrap().episodic_memory.count() > lisa_before);
    }

    #[test]
    fn decode_of_encode_restores_member_agent_state() {
        let mut world = World::new("Office");
        world.add_agent(test_agent("Oscar", vec![done_response()])).unwrap();
        world.get_agent_mut("Oscar").unwrap().define("age", serde_json::json!(19), None);

        let encoded = world.encode_complete_state();

        let mut restored = World::new("Office");
        restored.add_agent(test_agent("Oscar", vec![done_response()])).unwrap();
        restored.decode_complete_state(encoded);

        assert_eq!(
            restored.get_agent_by_name("Oscar").unwrap().persona.attributes,
            world.get_agent_by_name("Oscar").unwrap().persona.attributes
        );
    }

    #[test]
    fn make_everyone_accessible_grants_symmetric_access() {
        let mut world = World::new("Office");
        world.add_agent(test_agent("Oscar", vec![done_response()])).unwrap();
        world.add_agent(test_agent("Lisa", vec![done_response()])).unwrap();
        world.make_everyone_accessible();
        assert!(world.get_agent_by_name("Oscar").unwrap().is_accessible("Lisa"));
        assert!(world.get_agent_by_name("Lisa").unwrap().is_accessible("Oscar"));
    }
}

//! Memory-recall faculty: lets an agent pull relevant snippets out of its own
//! semantic memory mid-turn. Grounded in
//! `original_source/tinytroupe/agent.py`'s `RecallFaculty`.

use async_trait::async_trait;

use super::Faculty;
use crate::action::{Action, ActionKind};
use crate::agent::Agent;
use crate::error::AgentError;

const RECALL_DEFAULT_TOP_K: usize = 5;

pub struct RecallFaculty;

impl RecallFaculty {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RecallFaculty {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Faculty for RecallFaculty {
    fn name(&self) -> &str {
        "Memory Recall"
    }

    async fn process_action(&self, agent: &mut Agent, action: &Action) -> Result<bool, AgentError> {
        if action.kind != ActionKind::Extension("RECALL".to_string()) {
            return Ok(false);
        }

        let hits = agent
            .semantic_memory
            .retrieve_relevant(&action.content, RECALL_DEFAULT_TOP_K)
            .await?;

        if hits.is_empty() {
            agent.think(format!(
                "I tried to recall information relevant to \"{}\", but found nothing.",
                action.content
            ));
        } else {
            let joined = hits
                .iter()
                .map(|hit| format!("(from {}) {}", hit.source_name, hit.snippet))
                .collect::<Vec<_>>()
                .join("\n");
            agent.think(format!(
                "I recalled the following information relevant to \"{}\":\n{}",
                action.content, joined
            ));
        }

        Ok(true)
    }

    fn actions_definitions_prompt(&self) -> String {
        "- RECALL: recalls information stored in your semantic memory that is \
         relevant to the given content. The content of the action should \
         describe the query used to search memory."
            .to_string()
    }

    fn actions_constraints_prompt(&self) -> String {
        "- Only use RECALL when you believe relevant information exists in \
         your semantic memory that is not already visible in your current \
         context."
            .to_string()
    }
}

//! Local/web grounding faculty: lets an agent consult ingested documents by
//! name, or list what is available. Grounded in
//! `original_source/tinytroupe/agent.py`'s `FilesAndWebGroundingFaculty`.
//!
//! The original's `LIST_DOCUMENTS` branch reads `self.semantic_memory`, which
//! does not exist on the faculty — only on the agent. That is corrected here:
//! both branches read the acting agent's own semantic memory.

use async_trait::async_trait;

use super::Faculty;
use crate::action::{Action, ActionKind};
use crate::agent::Agent;
use crate::error::AgentError;

pub struct FilesAndWebGroundingFaculty;

impl FilesAndWebGroundingFaculty {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FilesAndWebGroundingFaculty {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Faculty for FilesAndWebGroundingFaculty {
    fn name(&self) -> &str {
        "Local Grounding"
    }

    async fn process_action(&self, agent: &mut Agent, action: &Action) -> Result<bool, AgentError> {
        match &action.kind {
            ActionKind::Extension(kind) if kind == "CONSULT" => {
                match agent.semantic_memory.retrieve_document_content_by_name(&action.content) {
                    Some(content) => {
                        agent.think(format!("I consulted \"{}\" and found:\n{}", action.content, content));
                    }
                    None => {
                        agent.think(format!(
                            "I tried to consult \"{}\", but no such document exists.",
                            action.content
                        ));
                    }
                }
                Ok(true)
            }
            ActionKind::Extension(kind) if kind == "LIST_DOCUMENTS" => {
                let names = agent.semantic_memory.list_documents_names();
                if names.is_empty() {
                    agent.think("I have no documents available to consult.");
                } else {
                    agent.think(format!("The documents available to me are: {}", names.join(", ")));
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn actions_definitions_prompt(&self) -> String {
        "- LIST_DOCUMENTS: lists the names of the documents available for you to consult.\n\
         - CONSULT: reads the content of the named document. The content of the action \
         should be the exact document name, as given by LIST_DOCUMENTS."
            .to_string()
    }

    fn actions_constraints_prompt(&self) -> String {
        "- Always call LIST_DOCUMENTS before CONSULT if you do not already know the \
         exact document name."
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm::MockLlm;
    use crate::memory::{LlmEmbedder, SemanticMemory};

    fn test_agent() -> Agent {
        let llm = Arc::new(MockLlm::new("{}"));
        let semantic_memory = SemanticMemory::new(Arc::new(LlmEmbedder::new(llm.clone())));
        Agent::new("Oscar", llm, semantic_memory)
    }

    #[tokio::test]
    async fn list_documents_reads_the_agents_own_semantic_memory() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("policy.txt");
        std::fs::write(&file_path, "vacation policy text").unwrap();

        let mut agent = test_agent();
        agent.semantic_memory.add_documents_path(&file_path).await.unwrap();

        let faculty = FilesAndWebGroundingFaculty::new();
        let action = Action::new(ActionKind::Extension("LIST_DOCUMENTS".to_string()), "", None);
        let handled = faculty.process_action(&mut agent, &action).await.unwrap();
        assert!(handled);

        let last = agent.episodic_memory.retrieve_last(1);
        let crate::memory::EventPayload::User { stimuli } = &last[0].payload else {
            panic!("expected a thought stimulus");
        };
        assert!(stimuli[0].content.contains("policy.txt"));
    }

    #[tokio::test]
    async fn consult_unknown_document_does_not_error() {
        let mut agent = test_agent();
        let faculty = FilesAndWebGroundingFaculty::new();
        let action = Action::new(ActionKind::Extension("CONSULT".to_string()), "missing.txt", None);
        let handled = faculty.process_action(&mut agent, &action).await.unwrap();
        assert!(handled);
    }

    #[tokio::test]
    async fn ignores_unrelated_actions() {
        let mut agent = test_agent();
        let faculty = FilesAndWebGroundingFaculty::new();
        let action = Action::new(ActionKind::Talk, "hi", None);
        assert!(!faculty.process_action(&mut agent, &action).await.unwrap());
    }
}

//! Tool-dispatch faculty: delegates actions to an ordered list of concrete
//! tools, the first of which to claim an action wins. Grounded in
//! `original_source/tinytroupe/tools.py`'s `TinyTool` base class and the
//! `ToolUse` faculty in `agent.py`.
//!
//! The original's `TinyTool.process_action` discards the boolean returned by
//! its own `_process_action`, so a tool that *did* handle the action still
//! reports "not handled" to its caller. That bug is not repeated here — each
//! [`Tool::process_action`] return value is propagated as-is.

use std::sync::Arc;

use async_trait::async_trait;

use super::Faculty;
use crate::action::Action;
use crate::agent::Agent;
use crate::error::AgentError;

/// A single concrete capability a [`ToolUseFaculty`] can dispatch to, e.g.
/// [`super::DocumentWriterTool`].
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `Ok(true)` iff this tool recognized and handled `action`.
    async fn process_action(&self, agent: &mut Agent, action: &Action) -> Result<bool, AgentError>;

    fn actions_definitions_prompt(&self) -> String;
    fn actions_constraints_prompt(&self) -> String;
}

pub struct ToolUseFaculty {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolUseFaculty {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Faculty for ToolUseFaculty {
    fn name(&self) -> &str {
        "Tool Use"
    }

    async fn process_action(&self, agent: &mut Agent, action: &Action) -> Result<bool, AgentError> {
        for tool in &self.tools {
            if tool.process_action(agent, action).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn actions_definitions_prompt(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.actions_definitions_prompt())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn actions_constraints_prompt(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.actions_constraints_prompt())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::llm::MockLlm;
    use crate::memory::{LlmEmbedder, SemanticMemory};

    struct ClaimsEverything;

    #[async_trait]
    impl Tool for ClaimsEverything {
        fn name(&self) -> &str {
            "Claims Everything"
        }
        async fn process_action(&self, _agent: &mut Agent, _action: &Action) -> Result<bool, AgentError> {
            Ok(true)
        }
        fn actions_definitions_prompt(&self) -> String {
            String::new()
        }
        fn actions_constraints_prompt(&self) -> String {
            String::new()
        }
    }

    struct ClaimsNothing;

    #[async_trait]
    impl Tool for ClaimsNothing {
        fn name(&self) -> &str {
            "Claims Nothing"
        }
        async fn process_action(&self, _agent: &mut Agent, _action: &Action) -> Result<bool, AgentError> {
            Ok(false)
        }
        fn actions_definitions_prompt(&self) -> String {
            String::new()
        }
        fn actions_constraints_prompt(&self) -> String {
            String::new()
        }
    }

    fn test_agent() -> Agent {
        let llm = Arc::new(MockLlm::new("{}"));
        let semantic_memory = SemanticMemory::new(Arc::new(LlmEmbedder::new(llm.clone())));
        Agent::new("Oscar", llm, semantic_memory)
    }

    #[tokio::test]
    async fn first_claiming_tool_wins_and_result_propagates() {
        let mut agent = test_agent();
        let faculty = ToolUseFaculty::new(vec![Arc::new(ClaimsNothing), Arc::new(ClaimsEverything)]);
        let action = Action::new(ActionKind::Extension("ANYTHING".to_string()), "", None);
        let handled = faculty.process_action(&mut agent, &action).await.unwrap();
        assert!(handled);
    }

    #[tokio::test]
    async fn no_tool_claims_returns_false() {
        let mut agent = test_agent();
        let faculty = ToolUseFaculty::new(vec![Arc::new(ClaimsNothing)]);
        let action = Action::new(ActionKind::Extension("ANYTHING".to_string()), "", None);
        let handled = faculty.process_action(&mut agent, &action).await.unwrap();
        assert!(!handled);
    }
}

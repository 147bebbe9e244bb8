//! Mental faculties: pluggable capabilities that extend the action grammar
//! and handle the actions they declare (`spec.md` §4.4). The four
//! operations (`process_action`, the two prompt fragments, equality by
//! name) mirror `tinytroupe.agent.Faculty` in `original_source/`.

pub mod document_writer;
pub mod grounding;
pub mod recall;
pub mod tool_use;

use async_trait::async_trait;

use crate::action::Action;
use crate::agent::Agent;
use crate::error::AgentError;

pub use document_writer::DocumentWriterTool;
pub use grounding::FilesAndWebGroundingFaculty;
pub use recall::RecallFaculty;
pub use tool_use::{Tool, ToolUseFaculty};

/// A pluggable capability. Faculties are compared by name, not identity
/// (`spec.md` §4.4: "equality by name").
#[async_trait]
pub trait Faculty: Send + Sync {
    fn name(&self) -> &str;

    /// Attempts to handle `action`. Returns `Ok(true)` iff this faculty
    /// consumed the action; unconsumed actions are left for the World.
    async fn process_action(&self, agent: &mut Agent, action: &Action) -> Result<bool, AgentError>;

    fn actions_definitions_prompt(&self) -> String;
    fn actions_constraints_prompt(&self) -> String;
}

pub fn same_faculty(a: &dyn Faculty, b: &dyn Faculty) -> bool {
    a.name() == b.name()
}

//! Document-writing tool: the `WRITE_DOCUMENT` action, persisting a titled
//! document to disk. Grounded in
//! `original_source/tinytroupe/tools.py`'s `TinyWordProcessor`, scaled down
//! per `SPEC_FULL.md` §4.4 (no export-format enrichment — markdown only).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::tool_use::Tool;
use crate::action::{Action, ActionKind};
use crate::agent::Agent;
use crate::error::AgentError;

#[derive(Deserialize)]
struct WriteDocumentRequest {
    title: String,
    content: String,
    #[serde(default)]
    author: Option<String>,
}

pub struct DocumentWriterTool {
    output_root: PathBuf,
}

impl DocumentWriterTool {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    fn file_name_for(title: &str) -> String {
        let slug: String = title
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{slug}.md")
    }
}

#[async_trait]
impl Tool for DocumentWriterTool {
    fn name(&self) -> &str {
        "Document Writer"
    }

    async fn process_action(&self, agent: &mut Agent, action: &Action) -> Result<bool, AgentError> {
        if action.kind != ActionKind::Extension("WRITE_DOCUMENT".to_string()) {
            return Ok(false);
        }

        let request: WriteDocumentRequest = serde_json::from_str(&action.content).map_err(|e| {
            AgentError::ToolFailed(format!("WRITE_DOCUMENT content did not parse: {e}"))
        })?;

        let document_dir = self.output_root.join("Document");
        std::fs::create_dir_all(&document_dir)
            .map_err(|e| AgentError::ToolFailed(format!("could not create output directory: {e}")))?;

        let path = document_dir.join(Self::file_name_for(&request.title));
        let mut body = format!("# {}\n\n", request.title);
        if let Some(author) = &request.author {
            body.push_str(&format!("*by {author}*\n\n"));
        }
        body.push_str(&request.content);

        std::fs::write(&path, body)
            .map_err(|e| AgentError::ToolFailed(format!("could not write document: {e}")))?;

        agent.think(format!("I wrote the document \"{}\" to {}", request.title, path.display()));
        Ok(true)
    }

    fn actions_definitions_prompt(&self) -> String {
        "- WRITE_DOCUMENT: writes a document to storage. The content of the action must be \
         a JSON object with keys \"title\", \"content\", and optionally \"author\"."
            .to_string()
    }

    fn actions_constraints_prompt(&self) -> String {
        "- Only use WRITE_DOCUMENT when you are producing a final artifact, not a draft \
         still under discussion."
            .to_string()
    }
}

/// Convenience constructor used by callers wiring up a [`super::ToolUseFaculty`]
/// around just this one tool.
pub fn document_writer_faculty(output_root: impl Into<PathBuf>) -> super::ToolUseFaculty {
    super::ToolUseFaculty::new(vec![Arc::new(DocumentWriterTool::new(output_root)) as Arc<dyn Tool>])
}

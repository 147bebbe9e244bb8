//! # tinyverse
//!
//! A multi-agent LLM simulation engine: persona-bearing agents that perceive,
//! think, and act through a JSON-schema cognitive loop; a stepped
//! environment that advances a simulated clock and dispatches messages among
//! them; and a transactional simulation trace that makes a run replayable
//! from a content-addressed cache instead of re-querying the LLM.
//!
//! ## Main modules
//!
//! - [`agent`]: [`Agent`], [`PersonaConfiguration`] — the cognitive loop
//!   (`act`/`listen`/`see`/`think`), accessibility, and state capture.
//! - [`faculty`]: [`Faculty`] — pluggable capabilities (`RecallFaculty`,
//!   `FilesAndWebGroundingFaculty`, `ToolUseFaculty`) that extend the action
//!   grammar.
//! - [`world`]: [`World`], [`TinySocialNetwork`] — the step scheduler and
//!   message dispatcher.
//! - [`simulation`]: [`Runtime`], [`Simulation`], transactional caching of
//!   side-effecting calls.
//! - [`memory`]: [`EpisodicMemory`], [`SemanticMemory`] — an agent's episodic
//!   log and vector-indexed document store.
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], [`ChatCompletionClient`].
//! - [`action`]: [`Action`], [`Stimulus`], [`CognitiveState`] — the wire
//!   vocabulary shared by agents, faculties, and the world.
//! - [`cache`]: [`Cache`], [`InMemoryCache`], [`FileCache`] — the
//!   content-addressed store backing both LLM response caching and the
//!   simulation trace.
//! - [`config`]: [`LlmConfig`], [`RunConfigSummary`] — ini-based run
//!   configuration.
//! - [`error`]: typed errors for every subsystem.

pub mod action;
pub mod agent;
pub mod cache;
pub mod config;
pub mod error;
pub mod faculty;
pub mod llm;
pub mod memory;
pub mod simulation;
pub mod world;

pub use action::{Action, ActionKind, CognitiveState, Stimulus, StimulusKind};
pub use agent::{Agent, ActionRecord, AgentSpec, AgentState, PersonaConfiguration};
pub use cache::{Cache, FileCache, InMemoryCache};
pub use config::{ApiCredentials, ApiType, LlmConfig, RunConfigSummary};
pub use error::{AgentError, LlmError, MemoryError, SimulationError, WorldError};
pub use faculty::{DocumentWriterTool, Faculty, FilesAndWebGroundingFaculty, RecallFaculty, Tool, ToolUseFaculty};
pub use llm::{ChatCompletionClient, ChatMessage, LlmClient, LlmParams, MockLlm, RetryPolicy};
pub use memory::{Document, EpisodicMemory, RelevantSnippet, SemanticMemory};
pub use simulation::{ObjectKind, Runtime, Simulation, Transaction, TransactionalState};
pub use world::{TinySocialNetwork, World};

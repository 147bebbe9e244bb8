//! Typed errors for every subsystem. No `anyhow`, no panics outside tests.

use thiserror::Error;

/// Errors from the LLM client: transport, retry exhaustion, and malformed
/// provider responses. Parse failures on the *agent's* response schema are
/// [`AgentError`], not this type — the client only knows about the wire
/// protocol, not the `{action, cognitive_state}` schema riding inside it.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transient failure after {attempts} attempt(s): {message}")]
    RetriesExhausted { attempts: u32, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response missing expected field: {0}")]
    MalformedResponse(String),
}

/// Errors from episodic/semantic memory.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("io error: {0}")]
    Io(String),
}

/// Errors from agent operations: prompting, parsing, and state encode/decode.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("LLM response did not parse as a valid action after {attempts} attempt(s): {message}")]
    ParseFailed { attempts: u32, message: String },

    #[error("agent '{0}' is not a member of any world")]
    NotInWorld(String),

    #[error("no such agent: {0}")]
    UnknownAgent(String),

    #[error("state decode error: {0}")]
    DecodeError(String),

    #[error("invalid act() arguments: {0}")]
    InvalidActArguments(String),

    #[error("LLM produced no response")]
    NoLlmResponse,

    #[error("tool failed: {0}")]
    ToolFailed(String),
}

/// Errors from world-level dispatch and stepping.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("agent name '{0}' is already registered in this world")]
    DuplicateAgent(String),

    #[error("no such agent: {0}")]
    UnknownAgent(String),
}

/// Errors from simulation lifecycle and the transactional trace.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("simulation is already started")]
    AlreadyStarted,

    #[error("simulation is already stopped")]
    AlreadyStopped,

    #[error("entity name '{0}' is already registered in this simulation")]
    DuplicateName(String),

    #[error("cannot decode simulation state: entity '{0}' is not present in the live registry")]
    MissingEntity(String),

    #[error("cache io error: {0}")]
    CacheIo(String),

    #[error("cache decode error: {0}")]
    CacheDecode(String),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

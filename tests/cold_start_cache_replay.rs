//! Cold start, single agent, two calls, checkpoint.
//!
//! Begin a simulation against a file-backed trace cache; define two agent
//! attributes around a `listen_and_act` call, checkpointing after each
//! mutation; end the run. Re-running the identical program against the
//! same cache file must not invoke the LLM again.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tinyverse::llm::Role;
use tinyverse::{Cache, ChatMessage, FileCache, LlmClient, LlmError, LlmParams, Simulation};

/// Counts calls so the test can assert the replay run makes zero of them.
struct CountingLlm {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmClient for CountingLlm {
    async fn send_message(&self, _messages: &[ChatMessage], _params: &LlmParams) -> Option<ChatMessage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(ChatMessage {
            role: Role::Assistant,
            content: serde_json::json!({
                "action": {"type": "DONE", "content": ""},
                "cognitive_state": {"goals": "", "attention": "", "emotions": ""}
            })
            .to_string(),
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        Ok(vec![text.len() as f32])
    }
}

/// Wraps a single `Agent` mutation in a transaction, capturing/restoring its
/// complete state across cache hits exactly as a real caller would.
async fn transact(
    sim: &mut Simulation,
    agent: &mut tinyverse::Agent,
    call_name: &str,
    args: serde_json::Value,
    f: impl FnOnce(&mut tinyverse::Agent) -> std::pin::Pin<Box<dyn std::future::Future<Output = serde_json::Value> + '_>>,
) {
    use tinyverse::simulation::ObjectKind;

    let mut tx = tinyverse::Transaction::new(&mut *sim, ObjectKind::Agent, "Oscar", call_name);
    tx.execute(agent, &args, |agent| f(agent)).await.unwrap();
}

async fn run_program(trace_path: &std::path::Path, llm: Arc<CountingLlm>) -> tinyverse::Agent {
    use tinyverse::memory::{LlmEmbedder, SemanticMemory};
    use tinyverse::Agent;

    let trace_store: Arc<dyn Cache<String, Vec<tinyverse::simulation::TraceNode>>> =
        Arc::new(FileCache::<Vec<tinyverse::simulation::TraceNode>>::load(trace_path).unwrap());
    let mut sim = Simulation::new("oscar-run", trace_store);
    sim.begin(Some(trace_path.display().to_string()), false).await.unwrap();

    let semantic_memory = SemanticMemory::new(Arc::new(LlmEmbedder::new(llm.clone())));
    let mut agent = Agent::new("Oscar", llm.clone(), semantic_memory);

    transact(&mut sim, &mut agent, "define", serde_json::json!({"key": "age", "value": 19}), |agent| {
        Box::pin(async move {
            agent.define("age", serde_json::json!(19), None);
            serde_json::json!({"ok": true})
        })
    })
    .await;
    transact(
        &mut sim,
        &mut agent,
        "define",
        serde_json::json!({"key": "nationality", "value": "Brazilian"}),
        |agent| {
            Box::pin(async move {
                agent.define("nationality", serde_json::json!("Brazilian"), None);
                serde_json::json!({"ok": true})
            })
        },
    )
    .await;
    sim.checkpoint().await.unwrap();
    assert!(trace_path.exists());

    transact(
        &mut sim,
        &mut agent,
        "listen_and_act",
        serde_json::json!({"speech": "How are you doing?"}),
        |agent| {
            Box::pin(async move {
                agent.listen_and_act("How are you doing?", false).await.unwrap();
                serde_json::json!({"ok": true})
            })
        },
    )
    .await;
    transact(
        &mut sim,
        &mut agent,
        "define",
        serde_json::json!({"key": "occupation", "value": "Engineer"}),
        |agent| {
            Box::pin(async move {
                agent.define("occupation", serde_json::json!("Engineer"), None);
                serde_json::json!({"ok": true})
            })
        },
    )
    .await;
    sim.checkpoint().await.unwrap();
    assert!(trace_path.exists());
    assert!(sim.trace().len() >= 4);

    sim.end().unwrap();
    agent
}

#[tokio::test]
async fn replaying_the_same_program_makes_no_further_llm_calls() {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("c.json");

    let first_llm = Arc::new(CountingLlm { calls: AtomicUsize::new(0) });
    let first_agent = run_program(&trace_path, first_llm.clone()).await;
    assert_eq!(first_llm.calls.load(Ordering::SeqCst), 1);

    let second_llm = Arc::new(CountingLlm { calls: AtomicUsize::new(0) });
    let second_agent = run_program(&trace_path, second_llm.clone()).await;
    assert_eq!(
        second_llm.calls.load(Ordering::SeqCst),
        0,
        "replaying from an identical trace must not re-invoke the LLM"
    );

    // Not just the same output values — the replayed agent's actual state
    // (persona attributes and episodic memory) must match a fresh run's.
    let first_state = first_agent.encode_complete_state();
    let second_state = second_agent.encode_complete_state();
    assert_eq!(first_state.persona.attributes, second_state.persona.attributes);
    assert_eq!(
        first_state.episodic_memory.retrieve_all(),
        second_state.episodic_memory.retrieve_all()
    );
}

//! Loop guard: an LLM stub that always returns the same non-DONE action.
//! `act(until_done=true)` must stop once it has observed three identical
//! actions in a row, never exceeding `MAX_ACTIONS_BEFORE_DONE`.

use std::sync::Arc;

use tinyverse::agent::MAX_ACTIONS_BEFORE_DONE;
use tinyverse::memory::{LlmEmbedder, SemanticMemory};
use tinyverse::{Agent, ActionKind, MockLlm};

fn repeating_talk_response() -> String {
    serde_json::json!({
        "action": {"type": "TALK", "content": "I keep saying the same thing."},
        "cognitive_state": {"goals": "chat", "attention": "nothing new", "emotions": "flat"}
    })
    .to_string()
}

#[tokio::test]
async fn identical_action_stream_trips_the_loop_detector() {
    let llm = Arc::new(MockLlm::scripted(vec![repeating_talk_response()]));
    let semantic_memory = SemanticMemory::new(Arc::new(LlmEmbedder::new(llm.clone())));
    let mut agent = Agent::new("Oscar", llm, semantic_memory);

    let actions = agent.act(true, None, true).await.unwrap();

    assert!(actions.len() <= MAX_ACTIONS_BEFORE_DONE);
    // The detector only looks once more than 4 actions have accumulated, so
    // three identical actions in a row trips it at exactly 5.
    assert_eq!(actions.len(), 5);
    for record in &actions {
        assert_eq!(record.action.kind, ActionKind::Talk);
    }
    let last_three = &actions[actions.len() - 3..];
    assert_eq!(last_three[0].action, last_three[1].action);
    assert_eq!(last_three[1].action, last_three[2].action);
}

//! The execution trace: a hash-chained sequence of recorded calls, grounded
//! in `original_source/tinytroupe/control.py`'s cache-chain design. Each
//! [`TraceNode`] commits to the node before it (`prev_node_hash`), the call
//! that produced it (`event_hash`), and what that call returned
//! (`encoded_output`) plus whatever simulation state needs to travel with it
//! for resume (`encoded_state`).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceNode {
    pub prev_node_hash: Option<String>,
    pub event_hash: String,
    pub encoded_output: Value,
    pub encoded_state: Value,
}

/// Digests `(object_name, call_name, args)` into the identity of one call —
/// two calls with the same name and arguments at the same point in the chain
/// are the same event, and can be replayed from cache.
pub fn hash_event(object_name: &str, call_name: &str, args: &Value) -> String {
    let canonical = json!({ "object": object_name, "call": call_name, "args": args });
    let bytes = serde_json::to_vec(&canonical).expect("trace event is always JSON-serializable");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    use std::fmt::Write;
    for byte in digest {
        write!(out, "{byte:02x}").unwrap();
    }
    out
}

/// References into the live registry are encoded by name only — never by
/// serializing the referenced object itself (`spec.md` §9 "cyclic
/// references → serialize by name, rehydrate through registry").
pub fn encode_agent_ref(name: &str) -> Value {
    json!({ "type": "AgentRef", "name": name })
}

pub fn encode_world_ref(name: &str) -> Value {
    json!({ "type": "WorldRef", "name": name })
}

pub fn encode_factory_ref(name: &str) -> Value {
    json!({ "type": "FactoryRef", "name": name })
}

/// Plain scalars/lists/dicts pass through unwrapped, tagged so a decoder can
/// tell them apart from the `*Ref` variants above.
pub fn encode_json(value: Value) -> Value {
    json!({ "type": "JSON", "value": value })
}

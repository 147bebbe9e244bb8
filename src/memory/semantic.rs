//! Semantic memory: vector-indexed retrieval over ingested documents and web
//! pages (`spec.md` §4.3), using plain cosine-similarity scoring over an
//! owned chunk list rather than a concurrent store.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::embedder::Embedder;
use crate::error::MemoryError;
use crate::llm::sanitize;

const CHUNK_SIZE: usize = 1000;
const CHUNK_OVERLAP: usize = 100;
/// Whole-document lookups are bounded to keep prompts small (`spec.md` §4.3).
const DOCUMENT_PREFIX_CHARS: usize = 10_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub content: String,
    pub source: String,
}

#[derive(Clone, Debug)]
struct Chunk {
    source_name: String,
    text: String,
    vector: Vec<f32>,
}

/// One scored retrieval hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelevantSnippet {
    pub source_name: String,
    pub similarity: f32,
    pub snippet: String,
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Splits `text` into overlapping chunks, preferring to break on whitespace
/// near the chunk boundary so words are not split mid-token.
fn chunk_text(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let mut end = (start + CHUNK_SIZE).min(chars.len());
        if end < chars.len() {
            if let Some(ws) = chars[start..end]
                .iter()
                .rposition(|c| c.is_whitespace())
                .filter(|&p| p > CHUNK_SIZE / 2)
            {
                end = start + ws;
            }
        }
        let chunk: String = chars[start..end].iter().collect();
        chunks.push(chunk);
        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(CHUNK_OVERLAP);
    }
    chunks
}

pub struct SemanticMemory {
    embedder: Arc<dyn Embedder>,
    http: reqwest::Client,
    ingested: HashSet<String>,
    documents: HashMap<String, Document>,
    chunks: Vec<Chunk>,
}

impl SemanticMemory {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            http: reqwest::Client::new(),
            ingested: HashSet::new(),
            documents: HashMap::new(),
            chunks: Vec::new(),
        }
    }

    fn document_name_for(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string())
    }

    async fn ingest(&mut self, name: String, raw: String, source: String) -> Result<(), MemoryError> {
        let content = sanitize(&raw);
        for piece in chunk_text(&content) {
            let vector = self.embedder.embed(&piece).await?;
            self.chunks.push(Chunk {
                source_name: name.clone(),
                text: piece,
                vector,
            });
        }
        self.documents.insert(
            name.clone(),
            Document {
                name,
                content,
                source,
            },
        );
        Ok(())
    }

    /// Ingests a single file or every direct file entry under a directory.
    /// Idempotent per exact path string (`spec.md` §4.3).
    pub async fn add_documents_path(&mut self, path: impl AsRef<Path>) -> Result<(), MemoryError> {
        let path = path.as_ref();
        let key = path.to_string_lossy().to_string();
        if self.ingested.contains(&key) {
            return Ok(());
        }

        if path.is_dir() {
            let entries =
                std::fs::read_dir(path).map_err(|e| MemoryError::Io(e.to_string()))?;
            for entry in entries {
                let entry = entry.map_err(|e| MemoryError::Io(e.to_string()))?;
                let file_path = entry.path();
                if file_path.is_file() {
                    let raw = std::fs::read_to_string(&file_path)
                        .map_err(|e| MemoryError::Io(e.to_string()))?;
                    let name = Self::document_name_for(&file_path);
                    self.ingest(name, raw, file_path.to_string_lossy().to_string())
                        .await?;
                }
            }
        } else {
            let raw = std::fs::read_to_string(path).map_err(|e| MemoryError::Io(e.to_string()))?;
            let name = Self::document_name_for(path);
            self.ingest(name, raw, key.clone()).await?;
        }

        self.ingested.insert(key);
        Ok(())
    }

    /// Fetches and ingests each URL, idempotent per exact URL string.
    pub async fn add_web_urls(&mut self, urls: &[String]) -> Result<(), MemoryError> {
        for url in urls {
            if self.ingested.contains(url) {
                continue;
            }
            let body = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| MemoryError::Io(e.to_string()))?
                .text()
                .await
                .map_err(|e| MemoryError::Io(e.to_string()))?;
            self.ingest(url.clone(), body, url.clone()).await?;
            self.ingested.insert(url.clone());
        }
        Ok(())
    }

    /// Top-k scored chunks for `query`. Always embeds and scores against the
    /// caller-supplied query (Decision D2 in `SPEC_FULL.md` §9 — the
    /// original's bug of ignoring the query in one branch is not repeated).
    pub async fn retrieve_relevant(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RelevantSnippet>, MemoryError> {
        let query_vector = self.embedder.embed(query).await?;
        let mut scored: Vec<RelevantSnippet> = self
            .chunks
            .iter()
            .map(|chunk| RelevantSnippet {
                source_name: chunk.source_name.clone(),
                similarity: cosine_similarity(&query_vector, &chunk.vector),
                snippet: chunk.text.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Whole-document lookup by name, bounded to
    /// [`DOCUMENT_PREFIX_CHARS`] to keep prompts small.
    pub fn retrieve_document_content_by_name(&self, name: &str) -> Option<String> {
        self.documents.get(name).map(|doc| {
            doc.content
                .chars()
                .take(DOCUMENT_PREFIX_CHARS)
                .collect::<String>()
        })
    }

    pub fn list_documents_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.documents.keys().cloned().collect();
        names.sort();
        names
    }

    /// Captures documents, chunks, and the ingestion set for persistence
    /// (`encode_complete_state`, `save_spec`). The embedder itself is not
    /// part of the snapshot — it is supplied again on [`Self::from_snapshot`].
    pub fn snapshot(&self) -> SemanticMemorySnapshot {
        SemanticMemorySnapshot {
            ingested: self.ingested.iter().cloned().collect(),
            documents: self.documents.values().cloned().collect(),
            chunks: self
                .chunks
                .iter()
                .map(|c| ChunkSnapshot {
                    source_name: c.source_name.clone(),
                    text: c.text.clone(),
                    vector: c.vector.clone(),
                })
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: SemanticMemorySnapshot, embedder: Arc<dyn Embedder>) -> Self {
        let documents = snapshot
            .documents
            .into_iter()
            .map(|doc| (doc.name.clone(), doc))
            .collect();
        let chunks = snapshot
            .chunks
            .into_iter()
            .map(|c| Chunk {
                source_name: c.source_name,
                text: c.text,
                vector: c.vector,
            })
            .collect();
        Self {
            embedder,
            http: reqwest::Client::new(),
            ingested: snapshot.ingested.into_iter().collect(),
            documents,
            chunks,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkSnapshot {
    pub source_name: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// Serializable state of a [`SemanticMemory`], excluding the embedder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SemanticMemorySnapshot {
    pub ingested: Vec<String>,
    pub documents: Vec<Document>,
    pub chunks: Vec<ChunkSnapshot>,
}

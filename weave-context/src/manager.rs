//! Context Manager (`§4.4`, C4).
//!
//! Produces, once per turn, the `ContextBundle` consumed by the ReAct
//! Controller: the tool catalog plus whichever resources and history
//! messages fit the turn's token budgets.

use tokio::sync::Mutex;

use weave_embed::EmbeddingService;
use weave_types::{ChatMessage, ContextBundle, ContextError, SearchHit, Tool, WeaveConfig};
use weave_vectorstore::VectorStore;

use crate::counter::{estimate_message_tokens, truncate_to_budget};
use crate::query::enhance_query;

const RECENCY_WINDOW: usize = 3;
const MIN_USEFUL_RESOURCE_CHARS: usize = 200;

struct CacheEntry {
    query: String,
    server_id: String,
    turn: u64,
    bundle: ContextBundle,
}

/// Assembles `ContextBundle`s. Caches the last built bundle for the lifetime
/// of a turn (`§4.4.4`), keyed additionally on a caller-supplied turn id so a
/// cache entry never survives into a later turn even when that turn's
/// enhanced query happens to be textually identical (history still mutated
/// in between); invalidated unconditionally on server switch.
pub struct ContextManager {
    cache: Mutex<Option<CacheEntry>>,
}

impl ContextManager {
    /// Construct an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(None),
        }
    }

    /// Drop any cached bundle. Call this on server switch (`bootServer`).
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// Build (or return the cached) `ContextBundle`. `turn` identifies the
    /// calling turn (the caller bumps it once per `chat()` call); a cached
    /// entry only satisfies a request carrying the same `turn`, so the cache
    /// can never serve a stale bundle across turns.
    #[allow(clippy::too_many_arguments)]
    pub async fn build(
        &self,
        user_message: &str,
        history: &[ChatMessage],
        tools: Vec<Tool>,
        server_id: &str,
        turn: u64,
        embeddings: &EmbeddingService,
        store: &VectorStore,
        config: &WeaveConfig,
    ) -> Result<ContextBundle, ContextError> {
        let query = enhance_query(user_message, history);

        {
            let cache = self.cache.lock().await;
            if let Some(entry) = cache.as_ref() {
                if entry.query == query && entry.server_id == server_id && entry.turn == turn {
                    let mut bundle = entry.bundle.clone();
                    bundle.tools = tools;
                    return Ok(bundle);
                }
            }
        }

        let relevant_resources = if config.use_vector_search {
            self.retrieve_resources(&query, history, embeddings, store, config).await?
        } else {
            Vec::new()
        };

        let history_messages = select_history_within_budget(history, config);

        let bundle = ContextBundle {
            tools,
            relevant_resources,
            history_messages,
        };

        *self.cache.lock().await = Some(CacheEntry {
            query,
            server_id: server_id.to_string(),
            turn,
            bundle: bundle.clone(),
        });

        Ok(bundle)
    }

    async fn retrieve_resources(
        &self,
        query: &str,
        history: &[ChatMessage],
        embeddings: &EmbeddingService,
        store: &VectorStore,
        config: &WeaveConfig,
    ) -> Result<Vec<SearchHit>, ContextError> {
        let query_embedding = embeddings.embed(query).await?;
        let k_candidate = 2 * config.resource_max_results;
        let mut candidates = store
            .search(&query_embedding, k_candidate, config.resource_candidate_threshold)
            .await?;

        let recency_text = recent_history_text(history, RECENCY_WINDOW);
        for candidate in &mut candidates {
            if mentioned_in(&candidate.uri, &recency_text) {
                candidate.score += config.resource_recency_boost;
            }
        }

        candidates.retain(|hit| hit.score >= config.resource_final_threshold);
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(config.resource_max_results);

        Ok(truncate_resources_to_budget(candidates, config))
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

fn recent_history_text(history: &[ChatMessage], window: usize) -> String {
    history
        .iter()
        .rev()
        .take(window)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `uri` (or its tail identifier) is mentioned in `text`: either as
/// the literal `res://<id>` / `tool://...` URI, or as a bare word matching
/// the URI's last path segment.
fn mentioned_in(uri: &str, text: &str) -> bool {
    if text.contains(uri) {
        return true;
    }
    let tail = uri.rsplit('/').next().unwrap_or(uri);
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|word| !word.is_empty() && word == tail)
}

fn truncate_resources_to_budget(hits: Vec<SearchHit>, config: &WeaveConfig) -> Vec<SearchHit> {
    if !config.enable_context_budgeting {
        return hits;
    }
    let mut remaining = config.budget_resources;
    let mut kept = Vec::with_capacity(hits.len());
    for mut hit in hits {
        if remaining == 0 {
            break;
        }
        match truncate_to_budget(&hit.text, remaining, MIN_USEFUL_RESOURCE_CHARS) {
            Some(truncated) => {
                remaining = remaining.saturating_sub(truncated.len() / 4);
                hit.text = truncated;
                kept.push(hit);
            }
            None => continue,
        }
    }
    kept
}

fn select_history_within_budget(history: &[ChatMessage], config: &WeaveConfig) -> Vec<ChatMessage> {
    if !config.enable_context_budgeting {
        return history.to_vec();
    }
    let mut remaining = config.budget_history;
    let mut kept = Vec::new();
    for message in history.iter().rev() {
        let cost = estimate_message_tokens(&message.content);
        if cost > remaining {
            break;
        }
        remaining -= cost;
        kept.push(message.clone());
    }
    kept.reverse();
    kept
}

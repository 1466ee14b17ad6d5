#![deny(missing_docs)]
//! Local text embedding service (`§4.1`, C1).
//!
//! Loads a small MiniLM-family sentence embedding model once at facade init
//! and serves `embed()` calls for the lifetime of the process. Output is
//! always L2-normalized so consumers can use a dot product as cosine
//! similarity.

use std::sync::Arc;

use tokio::sync::Mutex;
use weave_types::EmbeddingError;

/// Dimension of the embedding model this service loads (MiniLM-L6, 384-d).
pub const EMBEDDING_DIM: usize = 384;

/// The synchronous inference backend. Kept as a trait so the service can be
/// exercised in tests without downloading ONNX model weights.
pub trait EmbeddingBackend: Send + Sync {
    /// Encode a batch of strings, returning one raw (not necessarily
    /// normalized) vector per input, in order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String>;

    /// The fixed output dimension for this backend.
    fn dimension(&self) -> usize;
}

/// [`EmbeddingBackend`] backed by `fastembed`'s ONNX runtime. Inference is
/// CPU-bound and blocking; the service offloads it to a blocking thread so
/// the facade's cooperative executor is never stalled — the async analog of
/// the spec's "background work happens in isolated workers".
pub struct FastEmbedBackend {
    model: fastembed::TextEmbedding,
}

impl FastEmbedBackend {
    /// Load the default MiniLM-L6-v2 model. Blocking; call from
    /// `spawn_blocking` or during a dedicated init phase.
    pub fn load() -> Result<Self, EmbeddingError> {
        let init_options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);
        let model = fastembed::TextEmbedding::try_new(init_options)
            .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?;
        Ok(Self { model })
    }
}

impl EmbeddingBackend for FastEmbedBackend {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| e.to_string())
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

enum State {
    Uninitialized,
    Ready(Arc<dyn EmbeddingBackend>),
}

/// Produces L2-normalized, fixed-dimension embeddings for text.
///
/// Lifecycle: constructed once at facade init, `init()`ed once, and never
/// torn down for the life of the process — server switches reset the vector
/// store and history, not the embedding model.
pub struct EmbeddingService {
    state: Mutex<State>,
}

impl EmbeddingService {
    /// Construct a not-yet-ready service. Call [`Self::init`] before use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Uninitialized),
        }
    }

    /// Construct a service around a pre-built backend, useful for tests or
    /// alternative embedding providers.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            state: Mutex::new(State::Ready(backend)),
        }
    }

    /// Load the embedding model. Fatal on failure: the caller (Agent Facade)
    /// surfaces this as a `bootServer` init error.
    pub async fn init(&self) -> Result<(), EmbeddingError> {
        let mut state = self.state.lock().await;
        if matches!(*state, State::Ready(_)) {
            return Ok(());
        }
        let backend = tokio::task::spawn_blocking(FastEmbedBackend::load)
            .await
            .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))??;
        *state = State::Ready(Arc::new(backend));
        Ok(())
    }

    /// Whether [`Self::init`] has completed successfully.
    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.lock().await, State::Ready(_))
    }

    /// The embedding dimension `D`. Panics if called before `init()`.
    pub async fn dimension(&self) -> usize {
        match &*self.state.lock().await {
            State::Ready(backend) => backend.dimension(),
            State::Uninitialized => EMBEDDING_DIM,
        }
    }

    /// Encode `text` into an L2-normalized vector of length `D`.
    ///
    /// Per-call failures (`EncodeError`) are non-fatal: callers treat the
    /// error as "skip indexing this item" rather than propagating further.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let backend = match &*self.state.lock().await {
            State::Ready(backend) => Arc::clone(backend),
            State::Uninitialized => return Err(EmbeddingError::NotReady),
        };
        let owned = text.to_string();
        let raw = tokio::task::spawn_blocking(move || backend.embed_batch(&[owned]))
            .await
            .map_err(|e| EmbeddingError::Encode(e.to_string()))?
            .map_err(EmbeddingError::Encode)?;
        let vector = raw
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Encode("backend returned no vectors".into()))?;
        Ok(l2_normalize(vector))
    }
}

impl Default for EmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize `v` so `‖v‖₂ = 1`, matching the spec's consumer-facing
/// invariant. A zero vector is returned unchanged (its norm is already 0;
/// there is no meaningful direction to normalize to).
#[must_use]
pub fn l2_normalize(v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < f32::EPSILON {
        return v;
    }
    v.into_iter().map(|x| x / norm).collect()
}

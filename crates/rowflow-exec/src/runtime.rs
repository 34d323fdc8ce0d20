//! Runtime: owns configuration and the spill manager, and turns a graph plus
//! bindings into a lazy record stream.

use std::sync::Arc;

use thiserror::Error;

use rowflow_core::config::EngineConfig;
use rowflow_core::error::Error as CoreError;
use rowflow_mem::{Codec, PeakTracker, SpillManager, Storage};
use rowflow_operators::RecordStream;

use rowflow_io::storage::build_storage_from_config;

use crate::bindings::Bindings;
use crate::graph::Graph;
use crate::metrics;
use crate::scheduler::Scheduler;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("source '{name}' is not bound")]
    UnboundSource { name: String },

    #[error("spill storage: {0}")]
    Storage(String),
}

/// Engine owns the configuration and the spill manager shared by every
/// sort it runs. Independent runs over one engine never share cursors.
pub struct Engine {
    cfg: EngineConfig,
    spill: Arc<SpillManager>,
    tracker: Option<Arc<PeakTracker>>,
}

impl Engine {
    /// Build an engine, choosing spill storage from `cfg`.
    pub fn new(cfg: EngineConfig) -> Result<Self, ExecError> {
        let storage = build_storage_from_config(&cfg.storage_config())
            .map_err(|e| ExecError::Storage(e.to_string()))?;
        Self::with_storage(cfg, storage)
    }

    /// Build an engine over an explicit storage backend.
    pub fn with_storage(cfg: EngineConfig, storage: Box<dyn Storage>) -> Result<Self, ExecError> {
        cfg.validate()?;
        let codec = parse_codec(&cfg.spill_codec)?;
        let root = cfg.storage_config().root;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            chunk_rows = cfg.sort_chunk_rows,
            spill_root = %root,
            codec = ?codec,
            "engine configured"
        );

        Ok(Self {
            spill: Arc::new(SpillManager::new(storage, codec, root)),
            cfg,
            tracker: None,
        })
    }

    /// Engine configured from `ROWFLOW_*` environment variables.
    pub fn from_env() -> Result<Self, ExecError> {
        Self::new(EngineConfig::from_env())
    }

    /// Report resident-record counts of every sort to `tracker`.
    pub fn with_tracker(mut self, tracker: Arc<PeakTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn spill_manager(&self) -> &Arc<SpillManager> {
        &self.spill
    }

    /// Check bindings and realize `graph` into a lazy stream.
    ///
    /// Every source name must be bound; this is checked before any source is
    /// opened. No records are read until the returned stream is pulled.
    pub fn run(&self, graph: &Graph, bindings: &Bindings) -> Result<RecordStream, ExecError> {
        let names = graph.source_names();
        if let Some(missing) = names.iter().find(|n| !bindings.contains(n)) {
            return Err(ExecError::UnboundSource {
                name: missing.clone(),
            });
        }

        metrics::run_started(graph.kind(), &names);

        let mut scheduler = Scheduler::new(
            bindings,
            Arc::clone(&self.spill),
            self.cfg.sort_chunk_rows,
            self.tracker.clone(),
        );
        scheduler.realize(graph)
    }
}

fn parse_codec(name: &str) -> Result<Codec, ExecError> {
    let codec = Codec::parse(name)
        .map_err(|e| CoreError::Config(format!("spill codec '{name}': {e}")))?;
    if !codec.is_available() {
        return Err(CoreError::Config(format!(
            "spill codec '{}' needs the `{}` cargo feature",
            codec.name(),
            codec.name()
        ))
        .into());
    }
    Ok(codec)
}

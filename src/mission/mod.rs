//! Per-mission pipeline: registry, ring buffers and flush tasks.

pub mod flusher;
pub mod registry;
pub mod ring;

pub use flusher::{BatchFlusher, FlushOutcome};
pub use registry::{IngestError, Mission, MissionRegistry, MissionSettings, RegistryError, SyncState};
pub use ring::{Offer, RingBuffer};

//! Remove vertices skinned to bones that no longer exist and rebuild a
//! compact, self-consistent mesh.
//!
//! The [`prune`] module holds the core pipeline: weight validation, optional
//! island growth, index remapping and reconstruction of attributes,
//! submeshes and blend shapes. [`gltf_source`], [`export`] and [`project`]
//! are the file-facing glue used by the binary.

pub mod error;
pub mod export;
pub mod gltf_source;
pub mod logging;
pub mod project;
pub mod prune;

pub use error::{IntegrityViolation, PruneError, PruneResult};
pub use logging::{
    LogLevel, LogObserver, NullObserver, PruneEvent, PruneObserver, RecordingObserver,
};
pub use prune::{PruneOptions, PruneOutcome, PruneSummary, PrunedMesh, prune_mesh};

use serde::Serialize;

use crate::prune::{OrphanCause, PruneSummary};

/// Log level attached to every pipeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    fn to_log_level(self) -> log::Level {
        match self {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Pipeline stage reported in start/finish events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Integrity,
    Validation,
    IslandGrowth,
    Remap,
    Attributes,
    Topology,
    BlendShapes,
    Verification,
}

/// Structured progress event emitted while pruning a mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PruneEvent {
    Started {
        mesh_name: String,
        vertex_count: usize,
        submesh_count: usize,
        blend_shape_count: usize,
        bone_count: usize,
    },
    StageStarted {
        stage: Stage,
    },
    StageFinished {
        stage: Stage,
        detail: String,
    },
    OrphanFound {
        vertex: u32,
        slot: usize,
        bone_index: u32,
        cause: OrphanCause,
    },
    GrowthRound {
        round: usize,
        moved: usize,
        remaining: usize,
    },
    SubmeshDropped {
        submesh: usize,
        material: Option<String>,
    },
    SampleChecked {
        new_index: usize,
        old_index: usize,
        matches: bool,
    },
    NothingToPrune {
        vertex_count: usize,
    },
    Aborted {
        reason: String,
    },
    Finished {
        summary: PruneSummary,
    },
}

impl PruneEvent {
    pub fn level(&self) -> LogLevel {
        match self {
            PruneEvent::OrphanFound { .. } | PruneEvent::SubmeshDropped { .. } => LogLevel::Warn,
            PruneEvent::SampleChecked { matches: false, .. } => LogLevel::Warn,
            PruneEvent::StageStarted { .. }
            | PruneEvent::SampleChecked { .. }
            | PruneEvent::GrowthRound { .. } => LogLevel::Debug,
            PruneEvent::Aborted { .. } => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    /// Human-readable rendering of the event.
    pub fn message(&self) -> String {
        match self {
            PruneEvent::Started {
                mesh_name,
                vertex_count,
                submesh_count,
                blend_shape_count,
                bone_count,
            } => format!(
                "pruning '{mesh_name}': {vertex_count} vertices, {submesh_count} submeshes, \
                 {blend_shape_count} blend shapes, {bone_count} bones"
            ),
            PruneEvent::StageStarted { stage } => format!("[{stage:?}] started"),
            PruneEvent::StageFinished { stage, detail } => format!("[{stage:?}] {detail}"),
            PruneEvent::OrphanFound {
                vertex,
                slot,
                bone_index,
                cause,
            } => match cause {
                OrphanCause::OutOfRange => format!(
                    "orphaned vertex {vertex}: slot {slot} references bone {bone_index} \
                     beyond the bone table"
                ),
                OrphanCause::MissingBone => format!(
                    "orphaned vertex {vertex}: slot {slot} references missing bone {bone_index}"
                ),
            },
            PruneEvent::GrowthRound {
                round,
                moved,
                remaining,
            } => format!("island growth round {round}: {moved} vertices moved, {remaining} kept"),
            PruneEvent::SubmeshDropped { submesh, material } => format!(
                "submesh {submesh} discarded with material '{}'",
                material.as_deref().unwrap_or("NULL")
            ),
            PruneEvent::SampleChecked {
                new_index,
                old_index,
                matches,
            } => format!("sample check new {new_index} <- old {old_index}: match={matches}"),
            PruneEvent::NothingToPrune { vertex_count } => format!(
                "all {vertex_count} vertices are weighted to existing bones, nothing to prune"
            ),
            PruneEvent::Aborted { reason } => format!("pruning aborted: {reason}"),
            PruneEvent::Finished { summary } => format!(
                "removed {} vertices and {} triangles",
                summary.vertices_removed, summary.triangles_removed
            ),
        }
    }
}

/// Receiver of pipeline events, injected by the caller.
pub trait PruneObserver {
    fn on_event(&mut self, event: &PruneEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl PruneObserver for LogObserver {
    fn on_event(&mut self, event: &PruneEvent) {
        log::log!(target: "skin_prune", event.level().to_log_level(), "{}", event.message());
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PruneObserver for NullObserver {
    fn on_event(&mut self, _event: &PruneEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<PruneEvent>,
}

impl RecordingObserver {
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.events.iter().filter(|e| e.level() == level).count()
    }
}

impl PruneObserver for RecordingObserver {
    fn on_event(&mut self, event: &PruneEvent) {
        self.events.push(event.clone());
    }
}

/// Initialise the console logger for the binary.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        eprintln!("Warning: Logging system already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_failed_sample_when_leveling_then_event_is_a_warning() {
        let event = PruneEvent::SampleChecked {
            new_index: 0,
            old_index: 3,
            matches: false,
        };
        assert_eq!(event.level(), LogLevel::Warn);
        assert_eq!(event.level().as_str(), "warn");
    }

    #[test]
    fn given_dropped_submesh_without_material_when_rendering_then_null_is_printed() {
        let event = PruneEvent::SubmeshDropped {
            submesh: 2,
            material: None,
        };
        assert!(event.message().contains("'NULL'"));
    }

    #[test]
    fn given_recording_observer_when_used_as_trait_object_then_events_are_kept() {
        let mut recorder = RecordingObserver::default();
        {
            let observer: &mut dyn PruneObserver = &mut recorder;
            observer.on_event(&PruneEvent::NothingToPrune { vertex_count: 4 });
        }
        assert_eq!(recorder.events.len(), 1);
        assert_eq!(recorder.count_at(LogLevel::Info), 1);
    }
}

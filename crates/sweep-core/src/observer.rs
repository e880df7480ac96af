use std::fmt;

use sweep_types::models::{RoomRef, RunSummary};

/// Which mutation a message failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Replace,
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Lifecycle events of a sweep.
#[derive(Debug, Clone)]
pub enum RunEvent {
    Started {
        room: RoomRef,
        author_id: u64,
        oldest_message_id: u64,
        newest_message_id: u64,
    },
    BatchFetched {
        running_total: u64,
        size: usize,
    },
    MessageFailed {
        message_id: u64,
        stage: Stage,
    },
    /// The search found nothing in range.
    NothingToDelete,
    Completed {
        summary: RunSummary,
    },
    Aborted {
        error: String,
    },
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { room, author_id, oldest_message_id, newest_message_id } => write!(
                f,
                "Started! {} {} author={} ids={}..={}",
                room.kind.path_segment(),
                room.id,
                author_id,
                oldest_message_id,
                newest_message_id
            ),
            Self::BatchFetched { running_total, size } => {
                write!(f, "batch_fetched size={} total={}", size, running_total)
            }
            Self::MessageFailed { message_id, stage } => {
                write!(f, "message_failed id={} stage={}", message_id, stage)
            }
            Self::NothingToDelete => f.write_str("There are no messages to bulk delete..."),
            Self::Completed { summary } => write!(
                f,
                "completed total={} failed={}",
                summary.total_results_size, summary.failed_count
            ),
            Self::Aborted { error } => write!(f, "Aborted! {}", error),
        }
    }
}

/// Receives run events. Implementations can write to tracing or discard them.
pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &RunEvent);
}

/// Observer that uses the `tracing` crate.
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::Completed { summary } => log_summary(summary),
            RunEvent::Aborted { .. } => tracing::warn!("{}", event),
            RunEvent::MessageFailed { message_id, stage } => {
                tracing::debug!(message_id, %stage, "{}", event)
            }
            RunEvent::BatchFetched { running_total, size } => {
                tracing::info!(
                    running_total,
                    size,
                    "Fetched {} messages ({} so far)",
                    size,
                    running_total
                )
            }
            RunEvent::Started { .. } | RunEvent::NothingToDelete => tracing::info!("{}", event),
        }
    }
}

fn log_summary(summary: &RunSummary) {
    tracing::info!("Done to bulk delete {} messages!", summary.succeeded());
    tracing::info!("Failed to modify or to delete {} messages.", summary.failed_count);
    if let (Some(oldest), Some(newest)) = (&summary.oldest, &summary.newest) {
        tracing::info!("Message IDs: from {} to {}", oldest.id, newest.id);
        tracing::info!(
            "Message Timestamps: from {} to {}",
            oldest.timestamp,
            newest.timestamp
        );
    }
    if let Some(elapsed) = summary.elapsed() {
        tracing::info!(
            replaced = summary.replaced_count,
            deleted = summary.deleted_count,
            "Finished in {}.{:03}s",
            elapsed.num_seconds(),
            elapsed.num_milliseconds().rem_euclid(1000)
        );
    }
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_event(&self, _event: &RunEvent) {}
}

use std::pin::pin;
use std::sync::Arc;

use chrono::Utc;
use futures_util::TryStreamExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use sweep_api::{ApiClient, Transport, TransportError};
use sweep_types::config::{ReplacePolicy, RunConfig};
use sweep_types::models::{Message, RunSummary};

use crate::filler::FillerSpec;
use crate::observer::{RunEvent, RunObserver, Stage};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("runner cannot be started again (state: {0})")]
    AlreadyStarted(&'static str),
}

#[derive(Debug, Clone)]
pub enum RunState {
    Idle,
    Running,
    Completed(RunSummary),
    Aborted(String),
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed(_) => "completed",
            Self::Aborted(_) => "aborted",
        }
    }
}

/// Drives one sweep: pulls batches from search and redacts/deletes each
/// message, one request at a time.
///
/// A message is deleted only after its replacement (if any) went through.
/// Refused replace/delete calls are counted as failures; anything else
/// aborts the run.
pub struct Runner<'a, T> {
    client: &'a ApiClient<T>,
    config: RunConfig,
    observer: Arc<dyn RunObserver>,
    filler: FillerSpec,
    rng: StdRng,
    state: RunState,
}

impl<'a, T: Transport> Runner<'a, T> {
    pub fn new(client: &'a ApiClient<T>, config: RunConfig, observer: Arc<dyn RunObserver>) -> Self {
        Self {
            client,
            config,
            observer,
            filler: FillerSpec::default(),
            rng: StdRng::from_os_rng(),
            state: RunState::Idle,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_filler(mut self, filler: FillerSpec) -> Self {
        self.filler = filler;
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub async fn run(&mut self) -> Result<RunSummary, RunError> {
        if !matches!(self.state, RunState::Idle) {
            return Err(RunError::AlreadyStarted(self.state.name()));
        }
        self.state = RunState::Running;
        self.observer.on_event(&RunEvent::Started {
            room: self.config.room,
            author_id: self.config.author_id,
            oldest_message_id: self.config.oldest_message_id,
            newest_message_id: self.config.newest_message_id,
        });

        match self.sweep().await {
            Ok(summary) => {
                if summary.total_results_size == 0 {
                    self.observer.on_event(&RunEvent::NothingToDelete);
                } else {
                    self.observer.on_event(&RunEvent::Completed {
                        summary: summary.clone(),
                    });
                }
                self.state = RunState::Completed(summary.clone());
                Ok(summary)
            }
            Err(e) => {
                self.observer.on_event(&RunEvent::Aborted {
                    error: e.to_string(),
                });
                self.state = RunState::Aborted(e.to_string());
                Err(e.into())
            }
        }
    }

    async fn sweep(&mut self) -> Result<RunSummary, TransportError> {
        let mut summary = RunSummary::new(Utc::now());
        let client = self.client;
        let pager = client.search_by_author(
            self.config.room,
            self.config.author_id,
            self.config.oldest_message_id,
            self.config.newest_message_id,
        );
        let mut batches = pin!(pager.into_stream());

        while let Some(batch) = batches.try_next().await? {
            self.observer.on_event(&RunEvent::BatchFetched {
                running_total: batch.running_total,
                size: batch.messages.len(),
            });
            summary.total_results_size = batch.running_total;

            for message in &batch.messages {
                summary.observe(message);
                if let Err(stage) = self.process(message, &mut summary).await? {
                    summary.failed_count += 1;
                    self.observer.on_event(&RunEvent::MessageFailed {
                        message_id: message.id,
                        stage,
                    });
                }
            }
        }

        summary.finish(Utc::now());
        Ok(summary)
    }

    /// Inner `Err` names the stage the server refused.
    async fn process(
        &mut self,
        message: &Message,
        summary: &mut RunSummary,
    ) -> Result<Result<(), Stage>, TransportError> {
        if let Some(content) = self.replacement() {
            if !self
                .client
                .replace_message(message.channel_id, message.id, &content)
                .await?
            {
                return Ok(Err(Stage::Replace));
            }
            summary.replaced_count += 1;
        }

        if !self.client.delete_message(message.channel_id, message.id).await? {
            return Ok(Err(Stage::Delete));
        }
        summary.deleted_count += 1;
        Ok(Ok(()))
    }

    fn replacement(&mut self) -> Option<String> {
        match &self.config.replace {
            ReplacePolicy::Random => Some(self.filler.generate(&mut self.rng)),
            ReplacePolicy::Fixed(text) => Some(text.clone()),
            ReplacePolicy::None => None,
        }
    }
}

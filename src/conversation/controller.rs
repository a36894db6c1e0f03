use anyhow::{Context, Result};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace, warn};

use crate::recognition::{
    RecognitionBackend, RecognitionConfig, RecognitionSession, SessionOutcome, Transcript,
};
use crate::volume::VolumeSampler;

use super::collaborators::{PlaybackControl, TranscriptProcessor};
use super::config::ConversationConfig;
use super::state::ConversationState;
use super::stats::ConversationStats;

/// Requests accepted by the controller loop.
#[derive(Debug)]
pub enum ConversationCommand {
    /// User activated the microphone.
    ActivateMic,
    /// User deactivated the microphone.
    DeactivateMic,
    /// Snapshot the current statistics.
    QueryStats(oneshot::Sender<ConversationStats>),
    /// Stop the loop and release all resources.
    Shutdown,
}

/// Conditions surfaced to the embedding layer so it can notify the user.
/// Everything else degrades silently to `Idle`.
#[derive(Debug, Clone, Error)]
pub enum ConversationError {
    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("transcript processing failed: {0}")]
    Processing(String),
}

/// Cloneable handle for driving a running controller.
#[derive(Clone)]
pub struct ConversationHandle {
    commands: mpsc::Sender<ConversationCommand>,
    state_rx: watch::Receiver<ConversationState>,
}

impl ConversationHandle {
    pub async fn activate_mic(&self) -> Result<()> {
        self.commands
            .send(ConversationCommand::ActivateMic)
            .await
            .context("conversation controller stopped")
    }

    pub async fn deactivate_mic(&self) -> Result<()> {
        self.commands
            .send(ConversationCommand::DeactivateMic)
            .await
            .context("conversation controller stopped")
    }

    pub async fn stats(&self) -> Result<ConversationStats> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(ConversationCommand::QueryStats(tx))
            .await
            .context("conversation controller stopped")?;
        rx.await.context("conversation controller stopped")
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(ConversationCommand::Shutdown)
            .await
            .context("conversation controller stopped")
    }

    /// Current canonical state.
    pub fn state(&self) -> ConversationState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state transitions.
    pub fn state_receiver(&self) -> watch::Receiver<ConversationState> {
        self.state_rx.clone()
    }
}

/// What woke the controller loop.
enum Wake {
    Command(Option<ConversationCommand>),
    Recognition(SessionOutcome),
    Playback(bool),
    PlaybackGone,
}

/// The single source of truth for the conversation state.
///
/// Runs as one event loop: commands, recognition outcomes and playback
/// signals are consumed in arrival order, and a transition's side effects
/// complete before the next event is taken; transitions never interleave.
/// The controller is the only component that starts or stops capture,
/// starts or stops recognition, or cancels playback.
pub struct ConversationController {
    config: ConversationConfig,
    recognizer: Arc<dyn RecognitionBackend>,
    processor: Arc<dyn TranscriptProcessor>,
    playback: Arc<dyn PlaybackControl>,
    volume: VolumeSampler,

    commands: mpsc::Receiver<ConversationCommand>,
    state_tx: watch::Sender<ConversationState>,
    error_tx: mpsc::UnboundedSender<ConversationError>,
    speaking_rx: watch::Receiver<bool>,
    playback_gone: bool,

    state: ConversationState,
    active_recognition: Option<RecognitionSession>,
    next_sequence: u64,
    stats: ConversationStats,
}

impl ConversationController {
    /// Wire a controller to its injected collaborators.
    ///
    /// Returns the controller (to be driven via [`run`](Self::run)), a
    /// cloneable handle, and the receiver for surfaced errors.
    pub fn new(
        recognizer: Arc<dyn RecognitionBackend>,
        processor: Arc<dyn TranscriptProcessor>,
        playback: Arc<dyn PlaybackControl>,
        volume: VolumeSampler,
        config: ConversationConfig,
    ) -> (
        Self,
        ConversationHandle,
        mpsc::UnboundedReceiver<ConversationError>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(ConversationState::Idle);
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let speaking_rx = playback.speaking();

        let conversation_id = format!("conversation-{}", uuid::Uuid::new_v4());
        info!(%conversation_id, "conversation controller created");

        let controller = Self {
            config,
            recognizer,
            processor,
            playback,
            volume,
            commands: command_rx,
            state_tx,
            error_tx,
            speaking_rx,
            playback_gone: false,
            state: ConversationState::Idle,
            active_recognition: None,
            next_sequence: 0,
            stats: ConversationStats::new(conversation_id),
        };

        let handle = ConversationHandle {
            commands: command_tx,
            state_rx,
        };

        (controller, handle, error_rx)
    }

    /// Subscribe to the volume signal for the visualizer.
    pub fn volume_level(&self) -> watch::Receiver<f32> {
        self.volume.level()
    }

    /// Drive the conversation until shutdown.
    ///
    /// Ends when a `Shutdown` command arrives or every handle has been
    /// dropped; either way the unconditional cleanup path runs, releasing
    /// the audio session and any recognition attempt regardless of state.
    pub async fn run(mut self) -> Result<()> {
        info!("conversation controller started");

        loop {
            let wake = tokio::select! {
                cmd = self.commands.recv() => Wake::Command(cmd),
                outcome = Self::recognition_outcome(&mut self.active_recognition) => {
                    Wake::Recognition(outcome)
                }
                changed = Self::speaking_changed(&mut self.speaking_rx, self.playback_gone) => {
                    match changed {
                        Some(speaking) => Wake::Playback(speaking),
                        None => Wake::PlaybackGone,
                    }
                }
            };

            match wake {
                Wake::Command(None) | Wake::Command(Some(ConversationCommand::Shutdown)) => break,
                Wake::Command(Some(cmd)) => self.handle_command(cmd).await,
                Wake::Recognition(outcome) => self.handle_recognition(outcome).await,
                Wake::Playback(speaking) => self.handle_playback(speaking),
                Wake::PlaybackGone => {
                    warn!("playback collaborator went away");
                    self.playback_gone = true;
                    self.handle_playback(false);
                }
            }
        }

        self.teardown().await;
        Ok(())
    }

    /// Resolves once the active recognition session settles; pends forever
    /// while no session is live.
    async fn recognition_outcome(session: &mut Option<RecognitionSession>) -> SessionOutcome {
        match session {
            Some(active) => active.outcome().await,
            None => std::future::pending().await,
        }
    }

    /// Resolves with the new speaking flag, or `None` once the playback
    /// collaborator is gone. Pends forever after that.
    async fn speaking_changed(rx: &mut watch::Receiver<bool>, gone: bool) -> Option<bool> {
        if gone {
            return std::future::pending().await;
        }
        match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        }
    }

    async fn handle_command(&mut self, cmd: ConversationCommand) {
        match cmd {
            ConversationCommand::ActivateMic => self.activate_mic().await,
            ConversationCommand::DeactivateMic => self.deactivate_mic().await,
            ConversationCommand::QueryStats(reply) => {
                let _ = reply.send(self.stats.clone());
            }
            ConversationCommand::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    async fn activate_mic(&mut self) {
        match self.state {
            ConversationState::Idle => self.begin_listening().await,
            ConversationState::Speaking => self.barge_in().await,
            ConversationState::Listening | ConversationState::Thinking => {
                debug!(state = %self.state, "mic activation ignored");
            }
        }
    }

    /// Idle/Speaking → Listening: start the recognition attempt, then the
    /// audio session. Capture failure is non-fatal: the visualizer stays
    /// at rest while recognition proceeds on its own.
    async fn begin_listening(&mut self) {
        let sequence = self.next_sequence;
        let recognition_config = RecognitionConfig {
            locale: self.config.locale.clone(),
            ..RecognitionConfig::default()
        };

        match RecognitionSession::begin(self.recognizer.as_ref(), &recognition_config, sequence)
            .await
        {
            Ok(session) => {
                self.next_sequence += 1;
                self.active_recognition = Some(session);
            }
            Err(e) => {
                warn!("failed to start recognition: {e}");
                self.stats.recognition_failures += 1;
                let _ = self
                    .error_tx
                    .send(ConversationError::Recognition(e.to_string()));
                self.set_state(ConversationState::Idle);
                return;
            }
        }

        if let Err(e) = self.volume.start().await {
            warn!("capture unavailable, visualization stays at rest: {e}");
        }

        self.set_state(ConversationState::Listening);
    }

    /// Speaking → Listening: cancel playback, wait out the settle delay so
    /// the response tail is not captured, then reopen capture and
    /// recognition. Strictly cancel-then-delay-then-start.
    async fn barge_in(&mut self) {
        info!("barge-in: cancelling playback");
        self.stats.barge_ins += 1;

        if let Err(e) = self.playback.cancel().await {
            warn!("playback cancel failed: {e}");
        }
        tokio::time::sleep(self.config.settle_delay).await;

        self.begin_listening().await;
    }

    /// Listening → Idle. No-op in any other state, so deactivating twice
    /// is safe.
    async fn deactivate_mic(&mut self) {
        match self.state {
            ConversationState::Listening => {
                self.stop_recognition();
                self.volume.stop().await;
                self.set_state(ConversationState::Idle);
            }
            _ => debug!(state = %self.state, "mic deactivation ignored"),
        }
    }

    fn stop_recognition(&mut self) {
        if let Some(session) = self.active_recognition.take() {
            session.stop();
        }
    }

    async fn handle_recognition(&mut self, outcome: SessionOutcome) {
        // Sessions are single-use; whatever settled is discarded here
        self.active_recognition = None;

        match outcome {
            SessionOutcome::Transcript(transcript) => self.process_transcript(transcript).await,
            SessionOutcome::Empty => {
                debug!("discarding whitespace-only recognition result");
                self.stats.empty_transcripts += 1;
                self.volume.stop().await;
                self.set_state(ConversationState::Idle);
            }
            SessionOutcome::Failed(reason) => {
                warn!("recognition error: {reason}");
                self.stats.recognition_failures += 1;
                let _ = self.error_tx.send(ConversationError::Recognition(reason));
                self.volume.stop().await;
                self.set_state(ConversationState::Idle);
            }
            SessionOutcome::Ended => {
                debug!("recognition ended without a result");
                self.volume.stop().await;
                self.set_state(ConversationState::Idle);
            }
        }
    }

    /// Listening → Thinking → (Speaking | Idle). The microphone is closed
    /// before the processor round-trip, so no capture resource is held
    /// while awaiting the backend.
    async fn process_transcript(&mut self, transcript: Transcript) {
        self.volume.stop().await;
        self.set_state(ConversationState::Thinking);

        self.stats.transcripts_forwarded += 1;
        info!(sequence = transcript.sequence, "forwarding transcript");

        match self.processor.process(&transcript).await {
            Ok(()) => {
                // Playback may already have begun while we awaited; later
                // watch notifications for the same flag are deduplicated in
                // handle_playback.
                if *self.speaking_rx.borrow() {
                    self.set_state(ConversationState::Speaking);
                }
            }
            Err(e) => {
                warn!("transcript processing failed: {e}");
                let _ = self
                    .error_tx
                    .send(ConversationError::Processing(e.to_string()));
                self.set_state(ConversationState::Idle);
            }
        }
    }

    fn handle_playback(&mut self, speaking: bool) {
        match (speaking, self.state) {
            (true, ConversationState::Thinking) => self.set_state(ConversationState::Speaking),
            (false, ConversationState::Speaking) => {
                self.stats.turns_completed += 1;
                self.set_state(ConversationState::Idle);
            }
            _ => trace!(speaking, state = %self.state, "playback signal outside a transition"),
        }
    }

    /// Unconditional cleanup: the one path allowed to bypass the
    /// transition table, so no resource survives shutdown regardless of
    /// the state the loop was in.
    async fn teardown(&mut self) {
        self.stop_recognition();
        self.volume.stop().await;
        self.set_state(ConversationState::Idle);
        info!("conversation controller stopped");
    }

    fn set_state(&mut self, next: ConversationState) {
        if self.state == next {
            return;
        }
        info!(from = %self.state, to = %next, "conversation state changed");
        self.state = next;
        self.stats.state = next;
        let _ = self.state_tx.send(next);
    }
}

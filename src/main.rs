use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use voiceloop::sim::{QueuedResponder, ScriptedOutcome, ScriptedRecognizer, TimedPlayback};
use voiceloop::{
    Config, ConversationController, ConversationState, FileCapture, MicrophoneCapture,
    VisualizationDriver, VolumeSampler,
};

/// Demo conversation: scripted utterances against simulated collaborators.
#[derive(Debug, Parser)]
#[command(name = "voiceloop", about = "Real-time voice conversation controller demo")]
struct Args {
    /// Path to a config file (TOML, without extension for search paths)
    #[arg(long)]
    config: Option<String>,

    /// WAV file used as the microphone source instead of the synthetic tone
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Utterances the scripted recognizer yields, one per turn
    #[arg(long = "say", default_values_t = [
        "what courses are available".to_string(),
        "tell me more about the first one".to_string(),
    ])]
    utterances: Vec<String>,

    /// Interrupt the last response mid-playback
    #[arg(long)]
    barge_in: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    info!("voiceloop demo starting ({} turns)", args.utterances.len());

    let capture: Arc<dyn MicrophoneCapture> = match &args.wav {
        Some(path) => Arc::new(FileCapture::new(path)),
        None => Arc::new(voiceloop::sim::SyntheticCapture::new(440.0, 0.2)),
    };

    let mut script: Vec<ScriptedOutcome> = args
        .utterances
        .iter()
        .map(|text| ScriptedOutcome::Transcript(text.clone()))
        .collect();
    if args.barge_in {
        // The interrupted turn reopens one more recognition session
        script.push(ScriptedOutcome::Silence);
    }
    let recognizer = Arc::new(ScriptedRecognizer::new(script));
    let playback = Arc::new(TimedPlayback::new());
    let processor = Arc::new(
        QueuedResponder::new()
            .with_playback(Arc::clone(&playback))
            .with_response_duration(Duration::from_millis(600)),
    );

    let volume = VolumeSampler::new(capture, cfg.capture.clone(), cfg.volume.clone());
    let (controller, handle, mut errors) = ConversationController::new(
        recognizer,
        processor,
        playback,
        volume,
        cfg.conversation.clone(),
    );

    let volume_rx = controller.volume_level();
    let mut state_rx = handle.state_receiver();
    let driver = VisualizationDriver::new(cfg.visual.clone());

    let controller_task = tokio::spawn(controller.run());

    let last_turn = args.utterances.len().saturating_sub(1);
    for (turn, utterance) in args.utterances.iter().enumerate() {
        info!(turn, %utterance, "activating microphone");
        handle.activate_mic().await?;

        wait_for_state(&mut state_rx, ConversationState::Speaking).await?;

        let descriptor = driver.render(
            *volume_rx.borrow(),
            handle.state() == ConversationState::Speaking,
        );
        info!("render descriptor: {}", serde_json::to_string(&descriptor)?);

        if args.barge_in && turn == last_turn {
            info!("interrupting playback");
            handle.activate_mic().await?;
            wait_for_state(&mut state_rx, ConversationState::Listening).await?;
            handle.deactivate_mic().await?;
        }

        wait_for_state(&mut state_rx, ConversationState::Idle).await?;
    }

    while let Ok(error) = errors.try_recv() {
        warn!("surfaced error: {error}");
    }

    let stats = handle.stats().await?;
    handle.shutdown().await?;
    controller_task.await??;

    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

async fn wait_for_state(
    state_rx: &mut tokio::sync::watch::Receiver<ConversationState>,
    target: ConversationState,
) -> Result<()> {
    timeout(Duration::from_secs(5), state_rx.wait_for(|s| *s == target))
        .await
        .map_err(|_| anyhow::anyhow!("timed out waiting for {target} state"))??;
    Ok(())
}

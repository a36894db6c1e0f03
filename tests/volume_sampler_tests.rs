// Integration tests for the volume sampling lifecycle
//
// These tests verify the at-most-one-session invariant, cleanup
// completeness on every exit path, and idempotent stop.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use voiceloop::sim::{CaptureFailure, SyntheticCapture};
use voiceloop::{CaptureConfig, CaptureError, MicrophoneCapture, VolumeConfig, VolumeSampler};

fn sampler_with(capture: &Arc<SyntheticCapture>) -> VolumeSampler {
    VolumeSampler::new(
        Arc::clone(capture) as Arc<dyn MicrophoneCapture>,
        CaptureConfig::default(),
        VolumeConfig::default(),
    )
}

#[tokio::test]
async fn at_most_one_audio_session() {
    let capture = Arc::new(SyntheticCapture::new(440.0, 0.2));
    let mut sampler = sampler_with(&capture);

    sampler.start().await.expect("first start should succeed");
    assert!(sampler.is_sampling());

    // Starting again while live is a no-op, not a second session
    sampler.start().await.expect("second start should be a no-op");
    assert_eq!(capture.opens(), 1, "no second stream may be opened");
    assert_eq!(capture.live_streams(), 1);

    sampler.stop().await;
    assert_eq!(capture.live_streams(), 0);
}

#[tokio::test]
async fn produces_volume_then_rests_after_stop() {
    let capture = Arc::new(SyntheticCapture::new(440.0, 0.5));
    let mut sampler = sampler_with(&capture);
    let mut level_rx = sampler.level();

    sampler.start().await.expect("start should succeed");

    // Wait until the tone registers above rest level
    let result = timeout(
        Duration::from_secs(2),
        level_rx.wait_for(|level| *level > 0.01),
    )
    .await;
    assert!(result.is_ok(), "tone should register above rest level");

    sampler.stop().await;

    // Rest level is published on teardown and the tick loop is gone
    assert_eq!(*sampler.level().borrow(), 0.0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        *sampler.level().borrow(),
        0.0,
        "no tick may fire after the session is released"
    );
    assert_eq!(capture.live_streams(), 0);
}

#[tokio::test]
async fn stop_is_idempotent() {
    let capture = Arc::new(SyntheticCapture::new(440.0, 0.2));
    let mut sampler = sampler_with(&capture);

    // Stopping before any session exists is a no-op
    sampler.stop().await;

    sampler.start().await.expect("start should succeed");
    sampler.stop().await;
    sampler.stop().await;

    assert!(!sampler.is_sampling());
    assert_eq!(capture.live_streams(), 0);
}

#[tokio::test]
async fn capture_unavailable_is_non_fatal() {
    let capture = Arc::new(SyntheticCapture::failing(CaptureFailure::Unavailable));
    let mut sampler = sampler_with(&capture);

    let err = sampler.start().await.expect_err("start should fail");
    assert!(matches!(err, CaptureError::Unavailable));

    // The sampler stays inert at rest level
    assert!(!sampler.is_sampling());
    assert_eq!(*sampler.level().borrow(), 0.0);

    // A later start against a working backend still works
    sampler.stop().await;
    assert_eq!(capture.opens(), 0);
}

#[tokio::test]
async fn permission_denied_is_non_fatal() {
    let capture = Arc::new(SyntheticCapture::failing(CaptureFailure::PermissionDenied));
    let mut sampler = sampler_with(&capture);

    let err = sampler.start().await.expect_err("start should fail");
    assert!(matches!(err, CaptureError::PermissionDenied(_)));
    assert!(!sampler.is_sampling());
}

#[tokio::test]
async fn drop_releases_the_session() {
    let capture = Arc::new(SyntheticCapture::new(440.0, 0.2));
    let mut sampler = sampler_with(&capture);

    sampler.start().await.expect("start should succeed");
    assert_eq!(capture.live_streams(), 1);

    // Dropping mid-session cancels the tick; the analysis task then closes
    // the stream on its own
    drop(sampler);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while capture.live_streams() > 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "capture stream must be released after drop"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn restart_after_stop_opens_a_fresh_session() {
    let capture = Arc::new(SyntheticCapture::new(440.0, 0.2));
    let mut sampler = sampler_with(&capture);

    sampler.start().await.expect("first start");
    sampler.stop().await;
    sampler.start().await.expect("restart");

    assert_eq!(capture.opens(), 2);
    assert_eq!(capture.live_streams(), 1, "only the new session is live");

    sampler.stop().await;
    assert_eq!(capture.live_streams(), 0);
}

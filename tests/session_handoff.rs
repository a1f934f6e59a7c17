//! End-to-end handoff between a wrist recorder and its companion over the
//! loopback link.

use gyrosync::capture::{ScriptedCamera, ScriptedSensors};
use gyrosync::export::{codec, ExportOptions, ExportPipeline, TransferState};
use gyrosync::link::{LinkInbound, LoopbackLink};
use gyrosync::peer::PeerCoordinator;
use gyrosync::recorder::{
    Channel, MotionSample, OrientationSample, PositionSample, RecordingConfig, RecordingController,
    RecordingError, RecordingState, StopOutcome, Vector3,
};
use gyrosync::remote::{RemoteCaptureController, RemoteEvent};
use gyrosync::storage::ArtifactStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

struct Devices {
    wrist: RecordingController,
    sensors: ScriptedSensors,
    watch_link: LoopbackLink,
    companion: PeerCoordinator,
    remote: Arc<RemoteCaptureController>,
    camera: ScriptedCamera,
    phone_inbound: Option<LinkInbound>,
    _watch_inbound: LinkInbound,
    _dir: TempDir,
}

fn devices() -> Devices {
    let dir = tempdir().unwrap();
    let ((watch_link, watch_inbound), (phone_link, phone_inbound)) = LoopbackLink::pair().unwrap();

    let camera = ScriptedCamera::new();
    let store = ArtifactStore::open(dir.path().join("Documents")).unwrap();
    let remote = Arc::new(RemoteCaptureController::new(Arc::new(camera.clone()), store));
    remote.prepare_session();
    let companion = PeerCoordinator::with_remote(Arc::new(phone_link), remote.clone());

    let sensors = ScriptedSensors::new();
    let wrist = RecordingController::new(
        RecordingConfig::default(),
        Arc::new(sensors.clone()),
        PeerCoordinator::new(Arc::new(watch_link.clone())),
        ExportPipeline::new(ExportOptions::with_output_dir(dir.path().join("exports"))),
    );

    Devices {
        wrist,
        sensors,
        watch_link,
        companion,
        remote,
        camera,
        phone_inbound: Some(phone_inbound),
        _watch_inbound: watch_inbound,
        _dir: dir,
    }
}

fn feed(sensors: &ScriptedSensors, t: f64, with_motion: bool) {
    sensors.emit_position(Ok(PositionSample::new(t, 25.0 + t, 121.0 - t)));
    sensors.emit_orientation(Ok(OrientationSample::new(t, Vector3::new(t, 0.5, -0.5))));
    if with_motion {
        sensors.emit_motion(Ok(MotionSample::new(t, Vector3::new(0.0, 0.0, -1.0))));
    }
}

/// Drain whatever the wrist has sent so far into the companion
fn pump(devices: &mut Devices) {
    let inbound = devices.phone_inbound.as_mut().unwrap();
    while let Ok(event) = inbound.try_recv() {
        devices.companion.handle_event(event);
    }
}

#[tokio::test]
async fn three_ticks_reach_companion_as_three_files() {
    let mut d = devices();
    let mut remote_events = d.remote.subscribe();

    d.wrist.start().unwrap();
    pump(&mut d);
    assert!(d.remote.is_recording());

    for (i, t) in [10.0, 10.5, 11.0].into_iter().enumerate() {
        d.wrist.tick(0.1 * (i + 1) as f64);
        feed(&d.sensors, t, true);
    }
    d.wrist.stop().unwrap();
    pump(&mut d);
    assert!(!d.remote.is_recording());
    assert_eq!(d.camera.finished_recordings().len(), 1);

    let summary = d.wrist.export().unwrap();
    assert_eq!(summary.artifacts.len(), 3);
    assert!(summary.transferred);

    for artifact in &summary.artifacts {
        let mut lines = artifact.content().lines();
        assert_eq!(lines.next(), Some(codec::header(artifact.channel())));
        assert_eq!(lines.count(), 3);
        assert_eq!(artifact.transfer_state(), TransferState::InFlight);
    }

    let motion = summary
        .artifacts
        .iter()
        .find(|a| a.channel() == Channel::Motion)
        .unwrap();
    let rows = codec::parse_motion(motion.content()).unwrap();
    let times: Vec<f64> = rows.iter().map(|m| m.timestamp).collect();
    assert_eq!(times, vec![10.0, 10.5, 11.0]);

    pump(&mut d);
    assert_eq!(
        d.remote.file_names(),
        vec!["GPS.csv", "GravityAndAttitude.csv", "Motion.csv"]
    );
    assert_eq!(
        d.remote.store().list().unwrap(),
        vec!["GPS.csv", "GravityAndAttitude.csv", "Motion.csv"]
    );

    assert_eq!(remote_events.try_recv().unwrap(), RemoteEvent::RecordingChanged(true));
    assert_eq!(remote_events.try_recv().unwrap(), RemoteEvent::RecordingChanged(false));
    assert_eq!(
        remote_events.try_recv().unwrap(),
        RemoteEvent::ArtifactReceived("GPS.csv".to_string())
    );
}

#[test]
fn tick_missing_motion_never_exports() {
    let mut d = devices();
    d.wrist.start().unwrap();
    d.wrist.tick(0.1);
    feed(&d.sensors, 1.0, false);
    d.wrist.stop().unwrap();

    assert!(matches!(d.wrist.export(), Err(RecordingError::EmptyBuffer)));
    assert!(d.watch_link.transferred_files().is_empty());
}

#[test]
fn unreachable_peer_does_not_block_recording() {
    let mut d = devices();
    d.watch_link.set_reachable(false);

    d.wrist.start().unwrap();
    assert_eq!(d.wrist.state(), RecordingState::Recording);
    pump(&mut d);
    assert!(!d.remote.is_recording());

    d.wrist.tick(0.1);
    feed(&d.sensors, 2.0, true);
    d.wrist.stop().unwrap();

    let summary = d.wrist.export().unwrap();
    assert!(!summary.transferred);
    assert!(summary
        .artifacts
        .iter()
        .all(|a| a.transfer_state() == TransferState::Pending && a.path().exists()));
    pump(&mut d);
    assert!(d.remote.file_names().is_empty());
}

#[test]
fn second_start_is_refused() {
    let mut d = devices();
    d.wrist.start().unwrap();
    assert!(matches!(d.wrist.start(), Err(RecordingError::AlreadyRunning)));
    assert_eq!(d.watch_link.sent_messages().len(), 1);
}

#[test]
fn stop_or_clear_walks_back_to_idle() {
    let mut d = devices();
    d.wrist.start().unwrap();
    d.wrist.tick(0.3);
    feed(&d.sensors, 1.0, true);

    assert_eq!(d.wrist.stop_or_clear().unwrap(), StopOutcome::Stopped);
    assert_eq!(d.wrist.stop_or_clear().unwrap(), StopOutcome::Cleared);
    assert_eq!(d.wrist.state(), RecordingState::Idle);
    assert_eq!(d.wrist.elapsed_seconds(), 0.0);
    assert!(matches!(d.wrist.export(), Err(RecordingError::EmptyBuffer)));
}

#[tokio::test]
async fn spawned_dispatch_collects_files() {
    let mut d = devices();
    let inbound = d.phone_inbound.take().unwrap();
    let dispatch = d.companion.spawn(inbound);
    let mut remote_events = d.remote.subscribe();

    d.wrist.start().unwrap();
    d.wrist.tick(0.1);
    feed(&d.sensors, 5.0, true);
    d.wrist.stop().unwrap();
    d.wrist.export().unwrap();

    let mut received = Vec::new();
    while received.len() < 3 {
        let event = tokio::time::timeout(Duration::from_secs(5), remote_events.recv())
            .await
            .unwrap()
            .unwrap();
        if let RemoteEvent::ArtifactReceived(name) = event {
            received.push(name);
        }
    }
    assert_eq!(received.len(), 3);
    assert!(d.remote.store().contains("Motion.csv"));

    dispatch.abort();
}

#[test]
fn second_session_files_stored_under_new_names() {
    let mut d = devices();

    for session in 0..2 {
        d.wrist.start().unwrap();
        d.wrist.tick(0.1);
        feed(&d.sensors, 1.0 + session as f64, true);
        d.wrist.stop().unwrap();
        assert!(d.wrist.export().unwrap().transferred);
        pump(&mut d);
    }

    assert_eq!(
        d.remote.file_names(),
        vec![
            "GPS.csv",
            "GravityAndAttitude.csv",
            "Motion.csv",
            "GPS (1).csv",
            "GravityAndAttitude (1).csv",
            "Motion (1).csv",
        ]
    );

    let first = std::fs::read_to_string(d.remote.store().root().join("Motion.csv")).unwrap();
    let second = std::fs::read_to_string(d.remote.store().root().join("Motion (1).csv")).unwrap();
    assert_eq!(codec::parse_motion(&first).unwrap()[0].timestamp, 1.0);
    assert_eq!(codec::parse_motion(&second).unwrap()[0].timestamp, 2.0);
}

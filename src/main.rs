//! gyrosync simulator
//!
//! Runs both devices in one process over a loopback link: the wrist side
//! records scripted sensor streams, exports them and transfers the files,
//! while the companion follows along and collects what it receives.
//!
//! Usage: `gyrosync [config.json] [ticks]`

use anyhow::{Context, Result};
use gyrosync::capture::{ScriptedCamera, ScriptedSensors};
use gyrosync::export::ExportPipeline;
use gyrosync::link::LoopbackLink;
use gyrosync::peer::PeerCoordinator;
use gyrosync::recorder::{
    spawn_ticker, MotionSample, OrientationSample, PositionSample, RecordingController, Vector3,
};
use gyrosync::remote::RemoteCaptureController;
use gyrosync::storage::ArtifactStore;
use gyrosync::{init_tracing, SyncConfig};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TICKS: usize = 30;

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SyncConfig::from_file(Path::new(&path))
            .with_context(|| format!("failed to load config from {}", path))?,
        None => SyncConfig::default(),
    };
    let ticks = match args.next() {
        Some(n) => n.parse().context("tick count must be a number")?,
        None => DEFAULT_TICKS,
    };

    init_tracing(&config.logging.filter);
    tracing::info!("Starting gyrosync v{}", env!("CARGO_PKG_VERSION"));

    let ((watch_link, _watch_inbound), (phone_link, phone_inbound)) =
        LoopbackLink::pair().context("failed to create loopback link")?;

    // companion
    let camera = ScriptedCamera::new();
    let store = ArtifactStore::open(&config.storage.artifacts_dir)
        .context("failed to open artifact store")?;
    let remote = Arc::new(RemoteCaptureController::new(Arc::new(camera), store));
    remote.prepare_session();
    let companion = PeerCoordinator::with_remote(Arc::new(phone_link), remote.clone());
    let dispatch = companion.spawn(phone_inbound);

    // wrist
    let sensors = ScriptedSensors::new();
    let controller = Arc::new(Mutex::new(RecordingController::new(
        config.recording.clone(),
        Arc::new(sensors.clone()),
        PeerCoordinator::new(Arc::new(watch_link)),
        ExportPipeline::new(config.export.clone()),
    )));
    let tick_interval = config.recording.tick_interval();
    let ticker = spawn_ticker(controller.clone(), tick_interval);

    controller.lock().start()?;

    let producers = spawn_producers(&sensors, ticks, config.recording.motion_interval());
    for producer in producers {
        producer.await?;
    }
    tokio::time::sleep(tick_interval).await;

    controller.lock().stop()?;
    let summary = controller.lock().export()?;
    ticker.abort();

    println!(
        "Session {}: {} records over {:.2}s",
        summary.session_id, summary.record_count, summary.duration_seconds
    );
    for artifact in &summary.artifacts {
        println!(
            "  {} ({} rows, {:?})",
            artifact.name(),
            artifact.row_count(),
            artifact.transfer_state()
        );
    }

    // give the companion a moment to take in the transfers
    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(controller);
    dispatch.abort();

    println!("Companion files:");
    for name in remote.store().list()? {
        println!("  {}", name);
    }

    Ok(())
}

/// One task per channel, each delivering `ticks` readings at its own pace
fn spawn_producers(
    sensors: &ScriptedSensors,
    ticks: usize,
    period: Duration,
) -> Vec<tokio::task::JoinHandle<()>> {
    let timestamp = move |i: usize| i as f64 * period.as_secs_f64();

    let position = sensors.clone();
    let orientation = sensors.clone();
    let motion = sensors.clone();
    vec![
        tokio::spawn(async move {
            for i in 0..ticks {
                let t = timestamp(i);
                position.emit_position(Ok(PositionSample::new(
                    t,
                    25.0330 + t * 1e-5,
                    121.5654 - t * 1e-5,
                )));
                tokio::time::sleep(period).await;
            }
        }),
        tokio::spawn(async move {
            for i in 0..ticks {
                let t = timestamp(i);
                orientation.emit_orientation(Ok(OrientationSample::new(
                    t,
                    Vector3::new(t.sin(), t.cos(), 0.5 * t.sin()),
                )));
                tokio::time::sleep(period).await;
            }
        }),
        tokio::spawn(async move {
            for i in (0..ticks).rev() {
                // motion arrives in reverse to exercise out-of-order joins
                let t = timestamp(i);
                motion.emit_motion(Ok(MotionSample::new(t, Vector3::new(0.0, 0.02 * t, -1.0))));
                tokio::time::sleep(period).await;
            }
        }),
    ]
}

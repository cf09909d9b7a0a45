use std::{f32::consts::TAU, path::Path};

use airsketch_core::{
    DrawOutcome, Gesture, Pose, Result, Session, SwipeDirection, ToolMode,
};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

const TONE_HZ: f32 = 220.0;

/// Recorded (or synthesised) stream of tracking poses and gestures, one
/// entry per rendered frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub frame_rate: u32,
    pub frames: Vec<TraceFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceFrame {
    pub pose: Pose,
    #[serde(default)]
    pub gestures: Vec<Gesture>,
    /// Amplitude of the narration tone fed to the microphone this frame.
    #[serde(default)]
    pub input_level: f32,
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&source)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Draws a three-quarter ring while narrating, switches to player mode
    /// and traces the ring again at a third of the drawing speed.
    pub fn demo(frame_rate: u32, distance: f32) -> Self {
        const POINTS: usize = 48;
        const RADIUS: f32 = 0.15;
        const REPLAY_FRAMES_PER_POINT: usize = 3;

        let center = Vec3::new(0.0, 0.0, -distance);
        let ring: Vec<Vec3> = (0..POINTS)
            .map(|i| {
                let angle = 0.75 * TAU * i as f32 / (POINTS - 1) as f32;
                center + Vec3::new(angle.cos(), angle.sin(), 0.0) * RADIUS
            })
            .collect();
        // An unrotated device `distance` behind the target looks straight at it.
        let pose_at = |target: Vec3| Pose::new(target + Vec3::Z * distance, Quat::IDENTITY);
        let frame = |target: Vec3, gestures: Vec<Gesture>, input_level: f32| TraceFrame {
            pose: pose_at(target),
            gestures,
            input_level,
        };

        let mut frames = vec![frame(ring[0], vec![Gesture::LongPressBegan], 0.0)];
        frames.extend(ring.iter().map(|point| frame(*point, Vec::new(), 0.3)));
        frames.push(frame(ring[POINTS - 1], vec![Gesture::LongPressEnded], 0.0));
        frames.push(frame(
            ring[0],
            vec![Gesture::Swipe(SwipeDirection::Right), Gesture::Rewind],
            0.0,
        ));

        for pair in ring.windows(2) {
            for step in 0..REPLAY_FRAMES_PER_POINT {
                let t = step as f32 / REPLAY_FRAMES_PER_POINT as f32;
                frames.push(frame(pair[0].lerp(pair[1], t), Vec::new(), 0.0));
            }
        }
        frames.extend((0..frame_rate).map(|_| frame(ring[POINTS - 1], Vec::new(), 0.0)));

        Self { frame_rate, frames }
    }
}

/// Outcome of running a trace through a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: usize,
    pub points: usize,
    pub segments: usize,
    pub lines: usize,
    pub cursor: usize,
    pub completed: bool,
}

/// Feeds `trace` through `session`. Each frame pushes one block of
/// synthesised microphone input, dispatches the frame's gestures, hands over
/// the pose, runs the frame driver and finally renders one output block.
pub fn run(session: &mut Session, trace: &Trace, sample_rate: u32) -> Result<RunSummary> {
    let block = (sample_rate / trace.frame_rate.max(1)).max(1) as usize;
    let mut input = vec![0.0_f32; block];
    let mut output = vec![0.0_f32; block];
    let mut phase = 0_usize;
    let mut summary = RunSummary::default();

    for (index, frame) in trace.frames.iter().enumerate() {
        for sample in input.iter_mut() {
            let t = phase as f32 / sample_rate as f32;
            *sample = frame.input_level * (TAU * TONE_HZ * t).sin();
            phase += 1;
        }
        session.audio_mut().push_input(&input);

        for gesture in &frame.gestures {
            session.handle(*gesture)?;
        }
        session.observe_pose(frame.pose);
        let report = session.frame()?;

        if let DrawOutcome::Finished { group } = report.draw {
            tracing::info!(frame = index, grouped = group.is_some(), "line closed");
        }
        if let Some(listen) = report.listen {
            if listen.advanced {
                tracing::debug!(frame = index, cursor = session.listen().cursor(), "cursor advanced");
            }
            summary.completed |= listen.completed;
        }

        session.audio_mut().render_output(&mut output);
        summary.frames += 1;
    }

    if let Some(export) = session.take_pending_export() {
        match export.wait() {
            Ok(path) => tracing::info!(?path, "narration saved"),
            Err(err) => tracing::warn!(error = %err, "narration was not saved"),
        }
    }

    let store = session.store();
    summary.points = store.len();
    summary.segments = store.segment_count();
    summary.lines = store.lines().len();
    summary.cursor = session.listen().cursor();
    if session.tool().mode() == ToolMode::Player && !summary.completed {
        tracing::warn!(cursor = summary.cursor, points = summary.points, "playback did not finish");
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use airsketch_core::{AppConfig, AudioConfig};

    use super::*;

    #[test]
    fn demo_trace_draws_and_replays_the_ring() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            audio: AudioConfig {
                sample_rate: 6_000,
                block_size: 100,
                export_dir: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = Session::new(&config).unwrap();
        let trace = Trace::demo(60, session.tool().distance_from_camera());

        let summary = run(&mut session, &trace, config.audio.sample_rate).unwrap();

        assert_eq!(summary.frames, trace.frames.len());
        assert_eq!(summary.points, 48);
        assert_eq!(summary.segments, 47);
        assert_eq!(summary.lines, 1);
        assert_eq!(summary.cursor, 48);
        assert!(summary.completed);
        assert!(dir.path().join("TempTestFile.wav").exists());
    }

    #[test]
    fn trace_documents_round_trip_through_json() {
        let trace = Trace::demo(30, 0.3);
        let json = serde_json::to_string(&trace).unwrap();
        let parsed: Trace = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.frames.len(), trace.frames.len());
        assert_eq!(parsed.frames[0].gestures, vec![Gesture::LongPressBegan]);
    }

    #[test]
    fn gestures_and_level_are_optional() {
        let json = r#"{
            "frame_rate": 60,
            "frames": [
                { "pose": { "position": [0.0, 0.0, 0.0], "orientation": [0.0, 0.0, 0.0, 1.0] } }
            ]
        }"#;
        let trace: Trace = serde_json::from_str(json).unwrap();
        assert!(trace.frames[0].gestures.is_empty());
        assert_eq!(trace.frames[0].input_level, 0.0);
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    audio::AudioRoute,
    config::AppConfig,
    draw::{DrawEngine, DrawOutcome, StrokeSample},
    listen::{ListenEngine, ListenOutcome},
    record::ExportHandle,
    tool::{SwipeDirection, Tool, ToolMode},
    tracking::{Pose, PoseTracker},
    AudioEngine, LineStore, Result, Scene, SketchError,
};

/// Input events delivered on the frame thread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gesture {
    /// Starts drawing and recording when the tool is a pen.
    LongPressBegan,
    LongPressEnded,
    Swipe(SwipeDirection),
    Pinch(f32),
    DeleteSelection,
    Rewind,
    Route(AudioRoute),
}

/// Everything one call to [`Session::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub draw: DrawOutcome,
    /// `None` while drawing, when the listen engine does not run.
    pub listen: Option<ListenOutcome>,
}

/// One drawing session: owns the scene, the line history, the tool and both
/// engines, and drives them once per rendered frame.
///
/// Construction attaches every collaborator up front, so nothing is left to
/// be wired in later.
#[derive(Debug)]
pub struct Session {
    scene: Scene,
    store: LineStore,
    tool: Tool,
    tracker: PoseTracker,
    draw: DrawEngine,
    listen: ListenEngine,
    audio: AudioEngine,
    drawing: bool,
    pending_export: Option<ExportHandle>,
}

impl Session {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_audio(config, AudioEngine::new(&config.audio))
    }

    pub fn with_audio(config: &AppConfig, audio: AudioEngine) -> Result<Self> {
        if config.audio.clean_on_start {
            if let Err(err) = audio.clean_export() {
                tracing::warn!(error = %err, "could not clear previous export");
            }
        }

        let mut scene = Scene::new();
        let tool = Tool::new(&config.tool, &mut scene)?;
        let mut tracker = PoseTracker::new(config.playback.orientation_smoothing);
        tracker.snap(&mut scene, tool.node(), tool.distance_from_camera())?;

        Ok(Self {
            scene,
            store: LineStore::new(),
            tool,
            tracker,
            draw: DrawEngine::new(),
            listen: ListenEngine::new(&config.playback),
            audio,
            drawing: false,
            pending_export: None,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn store(&self) -> &LineStore {
        &self.store
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut Tool {
        &mut self.tool
    }

    pub fn listen(&self) -> &ListenEngine {
        &self.listen
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioEngine {
        &mut self.audio
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Hands over the most recent narration export, if one is in flight.
    pub fn take_pending_export(&mut self) -> Option<ExportHandle> {
        self.pending_export.take()
    }

    /// Latest device pose from the tracking session.
    pub fn observe_pose(&mut self, pose: Pose) {
        self.tracker.observe(pose);
    }

    pub fn handle(&mut self, gesture: Gesture) -> Result<()> {
        match gesture {
            Gesture::LongPressBegan => {
                if self.tool.mode() == ToolMode::Pen && !self.drawing {
                    self.begin_drawing();
                }
            }
            Gesture::LongPressEnded => {
                if self.drawing {
                    self.end_drawing();
                }
            }
            Gesture::Swipe(direction) => {
                let mode = self.tool.swipe(direction, &mut self.scene)?;
                tracing::info!(?mode, "switched tool mode");
            }
            Gesture::Pinch(scale) => self.tool.pinch(scale, &mut self.scene)?,
            Gesture::DeleteSelection => {
                self.delete_selection()?;
            }
            Gesture::Rewind => self.listen.rewind(self.audio.player_mut()),
            Gesture::Route(route) => self.audio.set_route(route),
        }
        Ok(())
    }

    /// Removes every selected node from the scene. Their line entries stay in
    /// the store and are skipped during playback. The tool marker and the
    /// root are never removed.
    pub fn delete_selection(&mut self) -> Result<usize> {
        let mut removed = 0;
        for node in self.tool.take_selection() {
            if node == self.tool.node() || node == self.scene.root() {
                continue;
            }
            if self.scene.contains(node) {
                self.scene.remove(node)?;
                removed += 1;
            }
        }
        tracing::debug!(removed, "deleted selection");
        Ok(removed)
    }

    /// Runs the draw engine, the listen engine and the tool update, in that
    /// order.
    pub fn frame(&mut self) -> Result<FrameReport> {
        let sample = self.drawing.then(|| StrokeSample {
            pose: self.tracker.target(self.tool.distance_from_camera()),
            brush_size: self.tool.size(),
            recording_time: self.audio.recorded_duration(),
        });
        let draw = self.draw.update(sample, &mut self.scene, &mut self.store)?;

        let listen = if self.drawing {
            None
        } else {
            let pointer = self
                .scene
                .world_position(self.tool.node())
                .ok_or(SketchError::MissingNode(self.tool.node()))?;
            Some(self.listen.update(
                pointer,
                &mut self.scene,
                &self.store,
                self.audio.player_mut(),
            ))
        };

        self.tracker.update(
            &mut self.scene,
            self.tool.node(),
            self.tool.distance_from_camera(),
        )?;
        Ok(FrameReport { draw, listen })
    }

    fn begin_drawing(&mut self) {
        self.drawing = true;
        if let Err(err) = self.audio.start_recording() {
            tracing::error!(error = %err, "could not start recording; drawing without audio");
        }
    }

    fn end_drawing(&mut self) {
        self.drawing = false;
        match self.audio.stop_recording() {
            Ok(Some(export)) => {
                if let Some(previous) = self.pending_export.replace(export) {
                    if !previous.is_finished() {
                        tracing::debug!("previous export still running, detaching it");
                    }
                }
            }
            Ok(None) => tracing::debug!("nothing recorded"),
            Err(err) => tracing::error!(error = %err, "export failed to start"),
        }
        tracing::info!(entries = self.store.len(), "drawing ended");
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::{config::AudioConfig, scene::Color};

    const SAMPLE_RATE: u32 = 10;

    fn session(dir: &std::path::Path) -> Session {
        let config = AppConfig {
            audio: AudioConfig {
                sample_rate: SAMPLE_RATE,
                block_size: 2,
                export_dir: Some(dir.to_path_buf()),
                ..Default::default()
            },
            ..Default::default()
        };
        Session::new(&config).unwrap()
    }

    /// Pose that puts the tool target at `point` for an unrotated device.
    fn pose_for(session: &Session, point: Vec3) -> Pose {
        let distance = session.tool().distance_from_camera();
        Pose::new(point + Vec3::Z * distance, Quat::IDENTITY)
    }

    fn step(session: &mut Session, point: Vec3, input: usize) -> FrameReport {
        session.audio_mut().push_input(&vec![0.2; input]);
        let pose = pose_for(session, point);
        session.observe_pose(pose);
        session.frame().unwrap()
    }

    #[test]
    fn drawing_tags_points_with_narration_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let points = [
            Vec3::new(0.0, 0.0, -0.3),
            Vec3::new(0.1, 0.0, -0.3),
            Vec3::new(0.2, 0.0, -0.3),
        ];

        session.handle(Gesture::LongPressBegan).unwrap();
        assert!(session.audio().is_recording());
        assert_eq!(step(&mut session, points[0], 0).draw, DrawOutcome::Started);
        for point in points {
            let report = step(&mut session, point, 0);
            assert!(matches!(report.draw, DrawOutcome::Sampled { .. }));
            assert!(report.listen.is_none());
            // 0.2 s of narration between samples.
            session.audio_mut().push_input(&[0.2; 2]);
        }
        session.handle(Gesture::LongPressEnded).unwrap();
        let report = step(&mut session, points[2], 0);
        assert!(matches!(
            report.draw,
            DrawOutcome::Finished { group: Some(_) }
        ));

        let store = session.store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.segment_count(), 2);
        for (entry, expected) in store.entries().iter().zip([0.0, 0.2, 0.4]) {
            assert!((entry.recording_time - expected).abs() < 1e-9);
        }
        assert!(session.audio().player().is_loaded());

        let export = session.take_pending_export().expect("export started");
        assert!(export.wait().unwrap().exists());
    }

    #[test]
    fn immediate_release_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let nodes_before = session.scene().len();

        session.handle(Gesture::LongPressBegan).unwrap();
        step(&mut session, Vec3::ZERO, 0);
        session.handle(Gesture::LongPressEnded).unwrap();
        let report = step(&mut session, Vec3::ZERO, 0);

        assert_eq!(report.draw, DrawOutcome::Finished { group: None });
        assert!(session.store().is_empty());
        assert_eq!(session.scene().len(), nodes_before);
        assert!(session.take_pending_export().is_none());
    }

    #[test]
    fn long_press_in_player_mode_does_not_draw() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session
            .handle(Gesture::Swipe(SwipeDirection::Left))
            .unwrap();

        session.handle(Gesture::LongPressBegan).unwrap();
        assert!(!session.is_drawing());
        assert!(!session.audio().is_recording());
    }

    #[test]
    fn tracing_the_line_replays_the_narration() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let points = [
            Vec3::new(0.0, 0.0, -0.3),
            Vec3::new(0.3, 0.0, -0.3),
            Vec3::new(0.6, 0.0, -0.3),
        ];

        session.handle(Gesture::LongPressBegan).unwrap();
        step(&mut session, points[0], 0);
        for point in points {
            step(&mut session, point, 0);
            session.audio_mut().push_input(&[0.2; 2]);
        }
        session.handle(Gesture::LongPressEnded).unwrap();
        step(&mut session, points[2], 0);
        session
            .handle(Gesture::Swipe(SwipeDirection::Right))
            .unwrap();
        session.handle(Gesture::Rewind).unwrap();

        let mut out = [0.0_f32; 1];
        let mut cursor = 0;
        let mut completions = 0;
        let mut played = false;
        for frame in 0..200 {
            // Walk slowly along the line; the tool lands on the target one
            // frame later.
            let along = (frame as f32 / 120.0).min(1.0);
            let target = points[0].lerp(points[2], along);
            let report = step(&mut session, target, 0);
            let listen = report.listen.expect("listening while not drawing");

            assert!(session.listen().cursor() >= cursor);
            assert!(session.listen().cursor() <= session.store().len());
            cursor = session.listen().cursor();
            completions += usize::from(listen.completed);
            played |= session.audio().player().is_playing();

            session.audio_mut().render_output(&mut out);
        }

        assert!(played);
        assert_eq!(session.listen().cursor(), 3);
        assert_eq!(completions, 1);
        assert!(!session.audio().player().is_playing());
        for entry in session.store().entries() {
            let node = session.scene().node(entry.point).unwrap();
            assert_eq!(node.color, Color::DARK_GRAY);
        }
    }

    #[test]
    fn deleting_selected_line_keeps_playback_moving() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());

        session.handle(Gesture::LongPressBegan).unwrap();
        step(&mut session, Vec3::ZERO, 0);
        step(&mut session, Vec3::new(0.0, 0.0, -0.3), 2);
        step(&mut session, Vec3::new(0.1, 0.0, -0.3), 2);
        session.handle(Gesture::LongPressEnded).unwrap();
        let report = step(&mut session, Vec3::ZERO, 0);
        let DrawOutcome::Finished { group: Some(group) } = report.draw else {
            panic!("expected a finished line, got {:?}", report.draw);
        };

        let tool_node = session.tool().node();
        session.tool_mut().toggle_selection(group);
        session.tool_mut().toggle_selection(tool_node);
        session.handle(Gesture::DeleteSelection).unwrap();

        assert!(!session.scene().contains(group));
        assert!(session.scene().contains(tool_node));
        assert_eq!(session.store().len(), 2);

        let far = Vec3::splat(5.0);
        let first = step(&mut session, far, 0).listen.unwrap();
        let second = step(&mut session, far, 0).listen.unwrap();
        assert!(first.advanced && second.advanced);
        assert!(second.completed);
    }

    #[test]
    fn deleting_a_point_while_drawing_still_closes_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());

        session.handle(Gesture::LongPressBegan).unwrap();
        step(&mut session, Vec3::ZERO, 0);
        step(&mut session, Vec3::new(0.0, 0.0, -0.3), 2);
        step(&mut session, Vec3::new(0.1, 0.0, -0.3), 2);
        let first = session.store().entries()[0].point;
        session.tool_mut().toggle_selection(first);
        session.handle(Gesture::DeleteSelection).unwrap();
        session.handle(Gesture::LongPressEnded).unwrap();

        let report = step(&mut session, Vec3::ZERO, 0);
        let DrawOutcome::Finished { group: Some(group) } = report.draw else {
            panic!("expected a finished line, got {:?}", report.draw);
        };
        let root = session.scene().node(session.scene().root()).unwrap();
        assert_eq!(root.children(), &[session.tool().node(), group]);
        assert_eq!(session.store().lines().len(), 1);
        assert_eq!(session.scene().node(group).unwrap().children().len(), 2);
        session.take_pending_export().unwrap().wait().unwrap();
    }

    #[test]
    fn headphone_route_enables_monitoring_while_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session
            .handle(Gesture::Route(AudioRoute::Headphones))
            .unwrap();
        session.handle(Gesture::LongPressBegan).unwrap();
        assert_eq!(session.audio().monitor_gain(), 1.0);
        session.handle(Gesture::LongPressEnded).unwrap();
        assert_eq!(session.audio().monitor_gain(), 0.0);
    }
}

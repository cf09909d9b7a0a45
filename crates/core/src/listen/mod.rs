//! Synchronised replay. The narration only moves forward while the replay
//! pointer stays on the path: each stored point at the cursor gates playback
//! on the pointer's distance to it and on the audio time relative to the
//! moment it was drawn.

use glam::Vec3;

use crate::{
    audio::Player,
    config::PlaybackConfig,
    scene::{Color, NodeId},
    timeline::LineStore,
    Scene,
};

/// What one listen frame did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ListenOutcome {
    /// Entry highlighted and played this frame.
    pub active: Option<usize>,
    pub advanced: bool,
    /// Set only on the frame the cursor reached the end of the store.
    pub completed: bool,
}

#[derive(Debug)]
pub struct ListenEngine {
    cursor: usize,
    finished: bool,
    proximity_threshold: f32,
    lookahead: f64,
    catch_up: f64,
}

impl ListenEngine {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            cursor: 0,
            finished: false,
            proximity_threshold: config.proximity_threshold,
            lookahead: config.lookahead_seconds,
            catch_up: config.catch_up_seconds,
        }
    }

    /// Index of the next entry to play. Equal to the store length once
    /// playback has completed.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Restarts playback from the first entry.
    pub fn rewind(&mut self, player: &mut Player) {
        self.cursor = 0;
        self.finished = false;
        player.stop();
    }

    /// Runs one frame with the replay pointer at `pointer`.
    pub fn update(
        &mut self,
        pointer: Vec3,
        scene: &mut Scene,
        store: &LineStore,
        player: &mut Player,
    ) -> ListenOutcome {
        let mut outcome = ListenOutcome::default();

        if let Some(entry) = store.get(self.cursor).copied() {
            match scene.world_position(entry.point) {
                // The point was deleted; there is nothing left to trace.
                None => {
                    self.cursor += 1;
                    outcome.advanced = true;
                }
                Some(position) if position.distance(pointer) < self.proximity_threshold => {
                    let deadline = entry.recording_time + self.lookahead;
                    // Without a tape, proximity alone moves the cursor.
                    let (now, exhausted) = if player.is_loaded() {
                        (player.current_time(), player.at_end())
                    } else {
                        (f64::INFINITY, true)
                    };

                    if now <= deadline && !exhausted {
                        highlight(scene, entry.point);
                        if let Some(segment) = entry.segment {
                            highlight(scene, segment);
                        }
                        outcome.active = Some(self.cursor);
                    }
                    if exhausted || now > deadline - self.catch_up {
                        self.cursor += 1;
                        outcome.advanced = true;
                    }
                }
                Some(_) => {}
            }
        }

        if !store.is_empty() && self.cursor >= store.len() {
            if !self.finished {
                self.finished = true;
                outcome.completed = true;
                player.stop();
                tracing::info!(entries = store.len(), "playback completed");
            }
            return outcome;
        }
        self.finished = false;

        if outcome.active.is_some() {
            if !player.is_playing() {
                if player.is_paused() {
                    player.resume();
                } else {
                    player.play();
                }
            }
        } else if player.is_playing() {
            player.pause();
        }
        outcome
    }
}

fn highlight(scene: &mut Scene, id: NodeId) {
    if let Some(node) = scene.node_mut(id) {
        node.color = Color::DARK_GRAY;
    }
}

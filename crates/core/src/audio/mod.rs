use std::{collections::VecDeque, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    config::AudioConfig,
    record::{ExportHandle, Recorder, RecordingSettings},
    Result,
};

/// Where the output is heard. Monitoring the microphone is only safe when it
/// cannot feed back into the open mic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioRoute {
    #[default]
    Speaker,
    Headphones,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
}

/// Plays back the captured narration. The playhead only moves while output
/// blocks are rendered.
#[derive(Debug)]
pub struct Player {
    sample_rate: u32,
    buffer: Option<Arc<[f32]>>,
    position: usize,
    state: PlayerState,
}

impl Player {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            buffer: None,
            position: 0,
            state: PlayerState::Stopped,
        }
    }

    /// Replaces the playback buffer. The playhead keeps its place when it still
    /// fits inside the new buffer.
    pub fn load(&mut self, buffer: Arc<[f32]>) {
        self.position = self.position.min(buffer.len());
        self.buffer = Some(buffer);
        if self.state == PlayerState::Playing && self.at_end() {
            self.state = PlayerState::Stopped;
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.buffer.as_ref().is_some_and(|buffer| !buffer.is_empty())
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlayerState::Paused
    }

    /// Playhead position in seconds.
    pub fn current_time(&self) -> f64 {
        self.position as f64 / f64::from(self.sample_rate)
    }

    pub fn duration(&self) -> f64 {
        self.len() as f64 / f64::from(self.sample_rate)
    }

    /// True once the whole buffer has been played.
    pub fn at_end(&self) -> bool {
        self.is_loaded() && self.position >= self.len()
    }

    /// Starts from the playhead, or from the top when the previous run
    /// reached the end. Does nothing without a loaded buffer.
    pub fn play(&mut self) {
        if !self.is_loaded() {
            return;
        }
        if self.at_end() {
            self.position = 0;
        }
        self.state = PlayerState::Playing;
    }

    pub fn resume(&mut self) {
        if self.state == PlayerState::Paused {
            self.state = PlayerState::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
    }

    /// Stops and rewinds to the start.
    pub fn stop(&mut self) {
        self.state = PlayerState::Stopped;
        self.position = 0;
    }

    pub fn seek(&mut self, seconds: f64) {
        let target = (seconds.max(0.0) * f64::from(self.sample_rate)).round() as usize;
        self.position = target.min(self.len());
    }

    /// Writes the next samples into `out`, zero-filling whatever is not
    /// covered, and returns how many samples were played.
    pub fn render(&mut self, out: &mut [f32]) -> usize {
        out.fill(0.0);
        if self.state != PlayerState::Playing {
            return 0;
        }
        let Some(buffer) = &self.buffer else {
            return 0;
        };
        let available = buffer.len().saturating_sub(self.position);
        let count = available.min(out.len());
        out[..count].copy_from_slice(&buffer[self.position..self.position + count]);
        self.position += count;
        if self.position >= buffer.len() {
            self.state = PlayerState::Stopped;
        }
        count
    }

    fn len(&self) -> usize {
        self.buffer.as_ref().map_or(0, |buffer| buffer.len())
    }
}

/// Recording and playback façade driven by the session.
#[derive(Debug)]
pub struct AudioEngine {
    recorder: Recorder,
    player: Player,
    route: AudioRoute,
    monitor_gain: f32,
    monitor: VecDeque<f32>,
    monitor_capacity: usize,
}

impl AudioEngine {
    pub fn new(config: &AudioConfig) -> Self {
        Self::with_settings(RecordingSettings::from_config(config), config.block_size)
    }

    pub fn with_settings(settings: RecordingSettings, block_size: usize) -> Self {
        let player = Player::new(settings.sample_rate);
        Self {
            recorder: Recorder::new(settings),
            player,
            route: AudioRoute::Speaker,
            monitor_gain: 0.0,
            monitor: VecDeque::new(),
            monitor_capacity: block_size.max(1) * 4,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn set_route(&mut self, route: AudioRoute) {
        self.route = route;
        if self.recorder.is_recording() {
            self.monitor_gain = self.monitoring_level();
        }
    }

    pub fn monitor_gain(&self) -> f32 {
        self.monitor_gain
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn recorded_duration(&self) -> f64 {
        self.recorder.recorded_duration()
    }

    /// Starts capturing the microphone. Input is monitored only on
    /// headphones.
    pub fn start_recording(&mut self) -> Result<()> {
        self.recorder.start()?;
        self.monitor_gain = self.monitoring_level();
        tracing::debug!(route = ?self.route, gain = self.monitor_gain, "recording started");
        Ok(())
    }

    /// Stops capturing, loads the tape into the player and starts exporting
    /// it. Returns `None` when nothing has been captured yet.
    pub fn stop_recording(&mut self) -> Result<Option<ExportHandle>> {
        self.monitor_gain = 0.0;
        self.monitor.clear();
        let tape = self.recorder.capture();
        if tape.is_empty() {
            self.recorder.stop();
            return Ok(None);
        }
        self.player.load(tape);
        self.recorder.stop();
        tracing::debug!(duration = self.recorder.recorded_duration(), "recording stopped");
        self.recorder.export_async().map(Some)
    }

    /// Feeds one block of microphone input.
    pub fn push_input(&mut self, samples: &[f32]) {
        self.recorder.push_samples(samples);
        let gain = self.monitor_gain;
        if gain > 0.0 {
            self.monitor.extend(samples.iter().map(|s| s * gain));
            let overflow = self.monitor.len().saturating_sub(self.monitor_capacity);
            self.monitor.drain(..overflow);
        }
    }

    /// Fills one output block with the player's audio plus any monitored
    /// input. This is what moves the playhead forward.
    pub fn render_output(&mut self, out: &mut [f32]) {
        self.player.render(out);
        let count = self.monitor.len().min(out.len());
        for (sample, monitored) in out.iter_mut().zip(self.monitor.drain(..count)) {
            *sample += monitored;
        }
    }

    pub fn clean_export(&self) -> Result<()> {
        self.recorder.clean_export()
    }

    fn monitoring_level(&self) -> f32 {
        match self.route {
            AudioRoute::Headphones => 1.0,
            AudioRoute::Speaker => 0.0,
        }
    }
}

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread::JoinHandle,
};

use hound::{SampleFormat, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};

use crate::{config::AudioConfig, Result, SketchError};

/// Configuration options for the recording subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    pub sample_rate: u32,
    pub export_dir: PathBuf,
    pub export_name: String,
}

impl RecordingSettings {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            export_dir: config.export_directory(),
            export_name: config.export_name.clone(),
        }
    }

    /// Fixed location of the exported narration. Every export overwrites it.
    pub fn export_path(&self) -> PathBuf {
        self.export_dir.join(format!("{}.wav", self.export_name))
    }
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self::from_config(&AudioConfig::default())
    }
}

/// Microphone capture buffer. Samples pushed while recording are appended to
/// one mono tape that keeps growing across drawing sessions.
#[derive(Debug, Default)]
pub struct Recorder {
    settings: RecordingSettings,
    samples: Vec<f32>,
    is_recording: bool,
}

impl Recorder {
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            settings,
            samples: Vec::new(),
            is_recording: false,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(SketchError::AlreadyRecording);
        }
        self.is_recording = true;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.is_recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// Appends captured input. Ignored unless recording.
    pub fn push_samples(&mut self, samples: &[f32]) {
        if self.is_recording {
            self.samples.extend_from_slice(samples);
        }
    }

    /// Length of the tape in seconds.
    pub fn recorded_duration(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.settings.sample_rate.max(1))
    }

    /// Snapshot of the tape so far.
    pub fn capture(&self) -> Arc<[f32]> {
        Arc::from(self.samples.as_slice())
    }

    /// Writes the current tape to [`RecordingSettings::export_path`] on a
    /// background thread. The outcome is logged when the thread finishes.
    pub fn export_async(&self) -> Result<ExportHandle> {
        let samples = self.capture();
        if samples.is_empty() {
            return Err(SketchError::EmptyCapture);
        }
        let path = self.settings.export_path();
        let sample_rate = self.settings.sample_rate;

        let join = std::thread::Builder::new()
            .name("narration-export".into())
            .spawn(move || {
                let outcome = write_wav(&path, sample_rate, &samples);
                match &outcome {
                    Ok(()) => tracing::info!(?path, "export succeeded"),
                    Err(err) => tracing::error!(?path, error = %err, "export failed"),
                }
                outcome.map(|()| path)
            })?;
        Ok(ExportHandle { join })
    }

    /// Deletes a previous export, if any.
    pub fn clean_export(&self) -> Result<()> {
        let path = self.settings.export_path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(?path, "removed stale export");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-flight export started by [`Recorder::export_async`].
#[derive(Debug)]
pub struct ExportHandle {
    join: JoinHandle<Result<PathBuf>>,
}

impl ExportHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Blocks until the export thread is done.
    pub fn wait(self) -> Result<PathBuf> {
        self.join
            .join()
            .map_err(|_| SketchError::msg("export thread panicked"))?
    }
}

fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(dir: &Path) -> RecordingSettings {
        RecordingSettings {
            sample_rate: 10,
            export_dir: dir.to_path_buf(),
            export_name: "TempTestFile".to_string(),
        }
    }

    #[test]
    fn only_captures_while_recording() {
        let mut recorder = Recorder::new(RecordingSettings {
            sample_rate: 10,
            ..Default::default()
        });
        recorder.push_samples(&[0.5; 4]);
        assert_eq!(recorder.recorded_duration(), 0.0);

        recorder.start().unwrap();
        assert!(matches!(recorder.start(), Err(SketchError::AlreadyRecording)));
        recorder.push_samples(&[0.5; 5]);
        recorder.stop();
        recorder.push_samples(&[0.5; 5]);

        assert!((recorder.recorded_duration() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn tape_accumulates_across_sessions() {
        let mut recorder = Recorder::new(RecordingSettings {
            sample_rate: 10,
            ..Default::default()
        });
        for _ in 0..2 {
            recorder.start().unwrap();
            recorder.push_samples(&[0.1; 3]);
            recorder.stop();
        }
        assert_eq!(recorder.capture().len(), 6);
    }

    #[test]
    fn exports_wav_to_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::new(settings(dir.path()));
        recorder.start().unwrap();
        recorder.push_samples(&[0.25, -0.25, 0.5]);
        recorder.stop();

        let path = recorder.export_async().unwrap().wait().unwrap();
        assert_eq!(path, dir.path().join("TempTestFile.wav"));

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 10);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.25, -0.25, 0.5]);

        recorder.clean_export().unwrap();
        assert!(!path.exists());
        recorder.clean_export().unwrap();
    }

    #[test]
    fn refuses_to_export_empty_tape() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(settings(dir.path()));
        assert!(matches!(
            recorder.export_async(),
            Err(SketchError::EmptyCapture)
        ));
    }
}

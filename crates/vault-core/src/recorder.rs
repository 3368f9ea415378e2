//! Voice Recorder
//!
//! Recording state machine over an abstract microphone capture. The
//! browser implementation wraps `MediaRecorder`; tests use a fake.
//!
//! The capture is held in a `CaptureGuard` from the moment recording
//! starts, so every way out of a recording (stop, discard, error, drop)
//! releases the microphone exactly once.

use thiserror::Error;

use crate::api::{upload_file, ApiResponse};
use crate::config::DEFAULT_MAX_RECORDING_SECS;
use crate::domain::Timestamp;
use crate::repository::Backend;

pub const VOICE_BUCKET: &str = "voice-memories";

/// Chunk interval requested from the capture
pub const CHUNK_INTERVAL_MS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("microphone unavailable: {0}")]
    Microphone(String),
    #[error("cannot {action} while {state:?}")]
    InvalidState { state: RecorderState, action: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopped,
}

/// A live microphone stream plus its encoder
pub trait AudioCapture {
    /// Begin encoding, emitting a chunk every `timeslice_ms`
    fn start(&mut self, timeslice_ms: u32) -> Result<(), RecorderError>;
    fn pause(&mut self);
    fn resume(&mut self);
    /// Stop encoding and stop every track of the stream
    fn release(&mut self);
    fn content_type(&self) -> String;
}

/// An acquired microphone stream
pub trait MicrophoneStream {
    /// Stop every track of the stream
    fn stop_tracks(&self);
}

/// Owns a microphone stream from the moment access is granted.
/// Tracks are stopped once, on `stop` or on drop, so a stream whose
/// encoder could not be built never stays live.
pub struct StreamGuard<S: MicrophoneStream> {
    stream: S,
    stopped: bool,
}

impl<S: MicrophoneStream> StreamGuard<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, stopped: false }
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stream.stop_tracks();
        }
    }
}

impl<S: MicrophoneStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns a capture and releases it on drop
pub struct CaptureGuard {
    capture: Option<Box<dyn AudioCapture>>,
}

impl CaptureGuard {
    pub fn new(capture: Box<dyn AudioCapture>) -> Self {
        Self { capture: Some(capture) }
    }

    fn get(&mut self) -> Option<&mut Box<dyn AudioCapture>> {
        self.capture.as_mut()
    }

    pub fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.release();
            tracing::debug!("microphone released");
        }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub duration_secs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue(u32),
    /// Maximum duration reached; the caller must stop
    LimitReached,
}

pub struct VoiceRecorder {
    state: RecorderState,
    max_duration: u32,
    elapsed: u32,
    chunks: Vec<Vec<u8>>,
    content_type: String,
    capture: Option<CaptureGuard>,
    recording: Option<Recording>,
}

impl Default for VoiceRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORDING_SECS)
    }
}

impl VoiceRecorder {
    pub fn new(max_duration: u32) -> Self {
        Self {
            state: RecorderState::Idle,
            max_duration: if max_duration == 0 { DEFAULT_MAX_RECORDING_SECS } else { max_duration },
            elapsed: 0,
            chunks: Vec::new(),
            content_type: String::new(),
            capture: None,
            recording: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn max_duration(&self) -> u32 {
        self.max_duration
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    fn invalid(&self, action: &'static str) -> RecorderError {
        RecorderError::InvalidState {
            state: self.state,
            action,
        }
    }

    /// Start a fresh recording; a previous unsaved one is discarded
    pub fn start(&mut self, capture: Box<dyn AudioCapture>) -> Result<(), RecorderError> {
        if matches!(self.state, RecorderState::Recording | RecorderState::Paused) {
            return Err(self.invalid("start"));
        }
        let mut guard = CaptureGuard::new(capture);
        let content_type = match guard.get() {
            Some(capture) => {
                capture.start(CHUNK_INTERVAL_MS)?;
                capture.content_type()
            }
            None => return Err(RecorderError::Microphone("capture already released".into())),
        };

        self.content_type = content_type;
        self.capture = Some(guard);
        self.chunks.clear();
        self.recording = None;
        self.elapsed = 0;
        self.state = RecorderState::Recording;
        tracing::debug!(max_duration = self.max_duration, "recording started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), RecorderError> {
        if self.state != RecorderState::Recording {
            return Err(self.invalid("pause"));
        }
        if let Some(capture) = self.capture.as_mut().and_then(CaptureGuard::get) {
            capture.pause();
        }
        self.state = RecorderState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), RecorderError> {
        if self.state != RecorderState::Paused {
            return Err(self.invalid("resume"));
        }
        if let Some(capture) = self.capture.as_mut().and_then(CaptureGuard::get) {
            capture.resume();
        }
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Encoded audio from the capture. Empty chunks are dropped; a final
    /// chunk flushed after `stop` is appended to the finished recording.
    pub fn push_chunk(&mut self, bytes: Vec<u8>) {
        if bytes.is_empty() {
            return;
        }
        match self.state {
            RecorderState::Recording | RecorderState::Paused => self.chunks.push(bytes),
            RecorderState::Stopped => {
                if let Some(recording) = self.recording.as_mut() {
                    recording.bytes.extend(bytes);
                }
            }
            RecorderState::Idle => {}
        }
    }

    /// Advance the clock by one second while recording
    pub fn tick(&mut self) -> Tick {
        if self.state != RecorderState::Recording {
            return Tick::Continue(self.elapsed);
        }
        self.elapsed += 1;
        if self.elapsed >= self.max_duration {
            tracing::info!(elapsed = self.elapsed, "recording limit reached");
            Tick::LimitReached
        } else {
            Tick::Continue(self.elapsed)
        }
    }

    /// Finish recording, release the microphone and assemble the audio
    pub fn stop(&mut self) -> Result<&Recording, RecorderError> {
        if !matches!(self.state, RecorderState::Recording | RecorderState::Paused) {
            return Err(self.invalid("stop"));
        }
        self.capture = None;
        self.state = RecorderState::Stopped;
        let recording = self.recording.insert(Recording {
            bytes: self.chunks.drain(..).flatten().collect(),
            content_type: self.content_type.clone(),
            duration_secs: self.elapsed,
        });
        Ok(&*recording)
    }

    /// The finished recording once it holds audio; captures that flush
    /// their data after `stop` make it ready only then
    pub fn ready_to_upload(&self) -> Option<&Recording> {
        match self.state {
            RecorderState::Stopped => self.recording.as_ref().filter(|r| !r.bytes.is_empty()),
            _ => None,
        }
    }

    /// Drop any recording and return to idle, releasing the microphone
    pub fn discard(&mut self) {
        self.capture = None;
        self.chunks.clear();
        self.recording = None;
        self.elapsed = 0;
        self.state = RecorderState::Idle;
    }
}

/// Store a finished recording in the voice bucket and return its URL
pub async fn upload_recording(backend: &dyn Backend, recording: &Recording, now: Timestamp) -> ApiResponse<String> {
    let essence = recording.content_type.split(';').next().unwrap_or_default().trim();
    let extension = match essence {
        "audio/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/mp4" => "m4a",
        "audio/mpeg" => "mp3",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first())
            .copied()
            .unwrap_or("webm"),
    };
    let path = format!("voice-memory-{}.{}", now.timestamp_millis(), extension);
    upload_file(
        backend,
        VOICE_BUCKET,
        &path,
        Some(recording.content_type.as_str()),
        recording.bytes.clone(),
    )
    .await
}

/// `m:ss`
pub fn format_duration(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeCapture {
        releases: Rc<Cell<u32>>,
        fail_start: bool,
    }

    impl AudioCapture for FakeCapture {
        fn start(&mut self, timeslice_ms: u32) -> Result<(), RecorderError> {
            assert_eq!(timeslice_ms, CHUNK_INTERVAL_MS);
            if self.fail_start {
                return Err(RecorderError::Microphone("NotAllowedError".into()));
            }
            Ok(())
        }
        fn pause(&mut self) {}
        fn resume(&mut self) {}
        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
        fn content_type(&self) -> String {
            "audio/webm".into()
        }
    }

    fn capture(releases: &Rc<Cell<u32>>) -> Box<dyn AudioCapture> {
        Box::new(FakeCapture {
            releases: releases.clone(),
            fail_start: false,
        })
    }

    #[test]
    fn test_limit_forces_stop() {
        let releases = Rc::new(Cell::new(0));
        let mut recorder = VoiceRecorder::new(3);
        recorder.start(capture(&releases)).unwrap();
        assert_eq!(recorder.tick(), Tick::Continue(1));
        recorder.pause().unwrap();
        // paused time does not count
        assert_eq!(recorder.tick(), Tick::Continue(1));
        recorder.resume().unwrap();
        assert_eq!(recorder.tick(), Tick::Continue(2));
        assert_eq!(recorder.tick(), Tick::LimitReached);

        recorder.push_chunk(vec![1, 2]);
        recorder.push_chunk(vec![]);
        recorder.push_chunk(vec![3]);
        let recording = recorder.stop().unwrap().clone();
        assert_eq!(recording.bytes, vec![1, 2, 3]);
        assert_eq!(recording.duration_secs, 3);
        assert_eq!(releases.get(), 1);

        recorder.push_chunk(vec![4]);
        assert_eq!(recorder.recording().unwrap().bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_ready_after_flush_on_stop() {
        let releases = Rc::new(Cell::new(0));
        let mut recorder = VoiceRecorder::default();
        recorder.start(capture(&releases)).unwrap();
        recorder.tick();
        recorder.stop().unwrap();
        assert!(recorder.ready_to_upload().is_none());

        recorder.push_chunk(vec![7, 8, 9]);
        let ready = recorder.ready_to_upload().unwrap();
        assert_eq!(ready.bytes, vec![7, 8, 9]);
        assert_eq!(ready.duration_secs, 1);

        // a flush landing after discard is dropped
        recorder.discard();
        recorder.push_chunk(vec![1]);
        assert!(recorder.ready_to_upload().is_none());
    }

    #[tokio::test]
    async fn test_upload_recording_names_by_type() {
        use crate::repository::InMemoryBackend;
        use chrono::TimeZone;

        let backend = InMemoryBackend::new();
        let recording = Recording {
            bytes: vec![1, 2, 3],
            content_type: "audio/ogg;codecs=opus".into(),
            duration_secs: 4,
        };
        let now = chrono::Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let url = upload_recording(&backend, &recording, now).await.into_result().unwrap();
        assert!(url.ends_with("voice-memory-1700000000000.ogg"), "{}", url);
        assert!(backend.object(VOICE_BUCKET, "voice-memory-1700000000000.ogg").is_some());
    }

    #[test]
    fn test_failed_start_releases() {
        let releases = Rc::new(Cell::new(0));
        let mut recorder = VoiceRecorder::default();
        let result = recorder.start(Box::new(FakeCapture {
            releases: releases.clone(),
            fail_start: true,
        }));
        assert!(matches!(result, Err(RecorderError::Microphone(_))));
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let releases = Rc::new(Cell::new(0));
        {
            let mut recorder = VoiceRecorder::default();
            recorder.start(capture(&releases)).unwrap();
        }
        assert_eq!(releases.get(), 1);
    }

    struct FakeStream {
        stops: Rc<Cell<u32>>,
    }

    impl MicrophoneStream for FakeStream {
        fn stop_tracks(&self) {
            self.stops.set(self.stops.get() + 1);
        }
    }

    fn build_encoder(stream: StreamGuard<FakeStream>, fail: bool) -> Result<StreamGuard<FakeStream>, RecorderError> {
        if fail {
            return Err(RecorderError::Microphone("NotSupportedError".into()));
        }
        Ok(stream)
    }

    #[test]
    fn test_stream_stopped_when_encoder_fails() {
        let stops = Rc::new(Cell::new(0));
        let stream = StreamGuard::new(FakeStream { stops: stops.clone() });
        assert!(build_encoder(stream, true).is_err());
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn test_stream_stops_once() {
        let stops = Rc::new(Cell::new(0));
        let mut stream = build_encoder(StreamGuard::new(FakeStream { stops: stops.clone() }), false).unwrap();
        assert_eq!(stops.get(), 0);
        stream.stop();
        stream.stop();
        drop(stream);
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut recorder = VoiceRecorder::default();
        assert!(recorder.stop().is_err());
        assert!(recorder.pause().is_err());
        assert_eq!(recorder.max_duration(), 300);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(300), "5:00");
    }
}

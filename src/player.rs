use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use thiserror::Error;

use crate::logger::Logger;
use crate::record::RecordSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Recording,
}

/// Backend failures, whichever engine produced them, arrive as one of these
/// on the channel returned by `Player::new`. The caller's only obligation is
/// to stop playback (done here on drain) and surface the message.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Error(String),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("no playback backend available: {0}")]
    NoBackend(String),
    #[error("stream open failed: {0}")]
    Stream(String),
    #[error("recording failed: {0}")]
    Record(String),
}

/// The two interchangeable engines. Selection happens once at construction;
/// afterwards every call dispatches here and callers never learn which one
/// is active.
pub trait PlaybackBackend {
    fn name(&self) -> &'static str;
    fn play(&mut self, url: &str) -> Result<(), PlayerError>;
    /// Reopens the stream with a record sink duplicating output to
    /// `spec.path` while playback continues.
    fn play_with_record(&mut self, url: &str, spec: &RecordSpec) -> Result<(), PlayerError>;
    fn stop(&mut self);
    fn set_volume(&mut self, volume: i32);
    fn toggle_mute(&mut self);
    fn is_playing(&mut self) -> bool;
}

pub struct Player {
    backend: Box<dyn PlaybackBackend>,
    state: PlaybackState,
    current_url: Option<String>,
    events: Receiver<PlayerEvent>,
    log: Logger,
}

impl Player {
    /// Probes the native engine first and falls back to the in-process sink
    /// when it is unavailable. Fails only when neither backend comes up.
    pub fn new(log: Logger) -> Result<Self, PlayerError> {
        let (tx, rx) = mpsc::channel();
        let backend = select_backend(tx, &log)?;
        log.log_line(&format!("playback backend: {}", backend.name()));
        Ok(Self::from_parts(backend, rx, log))
    }

    fn from_parts(
        backend: Box<dyn PlaybackBackend>,
        events: Receiver<PlayerEvent>,
        log: Logger,
    ) -> Self {
        Self {
            backend,
            state: PlaybackState::Idle,
            current_url: None,
            events,
            log,
        }
    }

    pub fn play(&mut self, url: &str) -> Result<(), PlayerError> {
        self.stop();
        self.backend.play(url)?;
        self.state = PlaybackState::Playing;
        self.current_url = Some(url.to_string());
        self.log.log_line(&format!("playing {}", url));
        Ok(())
    }

    /// Idempotent; stopping an idle engine is a no-op.
    pub fn stop(&mut self) {
        if self.state != PlaybackState::Idle {
            self.backend.stop();
            self.state = PlaybackState::Idle;
        }
    }

    /// Requires an active playback session with a known URL. Returns false
    /// (and creates no file) when the preconditions are unmet or the sink
    /// cannot be opened; fails fast when a recording is already running.
    pub fn start_recording(&mut self, output_path: &Path) -> bool {
        if self.state != PlaybackState::Playing {
            self.log.log_line("recording refused: no active playback session");
            return false;
        }
        let url = match self.current_url.clone().filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => {
                self.log.log_line("recording refused: no current stream URL");
                return false;
            }
        };
        let spec = RecordSpec::for_target(output_path);
        // Release the active consumption handle before reopening with the
        // duplicating sink.
        self.backend.stop();
        match self.backend.play_with_record(&url, &spec) {
            Ok(()) => {
                self.state = PlaybackState::Recording;
                self.log
                    .log_line(&format!("recording to {}", spec.path.display()));
                true
            }
            Err(e) => {
                self.state = PlaybackState::Idle;
                self.log.log_error("start_recording", &e);
                false
            }
        }
    }

    pub fn stop_recording(&mut self) {
        self.stop();
    }

    /// The UI slider already bounds its range; this clamp only guards
    /// callers that bypass it.
    pub fn set_volume(&mut self, volume: i32) {
        self.backend.set_volume(volume.clamp(0, 100));
    }

    pub fn toggle_mute(&mut self) {
        self.backend.toggle_mute();
    }

    pub fn is_playing(&mut self) -> bool {
        self.backend.is_playing()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Drains one pending backend event. On an error the engine forcibly
    /// returns to idle; there is no automatic reconnect.
    pub fn poll_event(&mut self) -> Option<PlayerEvent> {
        match self.events.try_recv() {
            Ok(event) => {
                let PlayerEvent::Error(ref message) = event;
                self.log.log_line(&format!("playback error: {}", message));
                self.backend.stop();
                self.state = PlaybackState::Idle;
                Some(event)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

fn select_backend(
    events: Sender<PlayerEvent>,
    log: &Logger,
) -> Result<Box<dyn PlaybackBackend>, PlayerError> {
    #[cfg(unix)]
    match crate::mpv::MpvBackend::start(events.clone()) {
        Ok(backend) => return Ok(Box::new(backend)),
        Err(e) => log.log_line(&format!("native backend unavailable ({}), falling back", e)),
    }
    match crate::rodio_player::RodioBackend::start(events) {
        Ok(backend) => Ok(Box::new(backend)),
        Err(e) => Err(PlayerError::NoBackend(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct StubCalls {
        played: Vec<String>,
        recorded: Vec<(String, RecordSpec)>,
        stops: usize,
        volumes: Vec<i32>,
        mutes: usize,
    }

    struct StubBackend {
        calls: Rc<RefCell<StubCalls>>,
        playing: bool,
        fail_record: bool,
    }

    impl StubBackend {
        fn new(calls: Rc<RefCell<StubCalls>>) -> Self {
            Self {
                calls,
                playing: false,
                fail_record: false,
            }
        }
    }

    impl PlaybackBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn play(&mut self, url: &str) -> Result<(), PlayerError> {
            self.calls.borrow_mut().played.push(url.to_string());
            self.playing = true;
            Ok(())
        }

        fn play_with_record(&mut self, url: &str, spec: &RecordSpec) -> Result<(), PlayerError> {
            if self.fail_record {
                return Err(PlayerError::Record("sink refused".to_string()));
            }
            self.calls
                .borrow_mut()
                .recorded
                .push((url.to_string(), spec.clone()));
            self.playing = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.borrow_mut().stops += 1;
            self.playing = false;
        }

        fn set_volume(&mut self, volume: i32) {
            self.calls.borrow_mut().volumes.push(volume);
        }

        fn toggle_mute(&mut self) {
            self.calls.borrow_mut().mutes += 1;
        }

        fn is_playing(&mut self) -> bool {
            self.playing
        }
    }

    fn player_with_stub(
        fail_record: bool,
    ) -> (Player, Rc<RefCell<StubCalls>>, Sender<PlayerEvent>) {
        let calls = Rc::new(RefCell::new(StubCalls::default()));
        let mut backend = StubBackend::new(Rc::clone(&calls));
        backend.fail_record = fail_record;
        let (tx, rx) = mpsc::channel();
        let dir = tempfile::tempdir().unwrap();
        let log = Logger::new(dir.path().join("test.log"));
        (Player::from_parts(Box::new(backend), rx, log), calls, tx)
    }

    #[test]
    fn play_then_stop_leaves_idle() {
        let (mut player, _, _tx) = player_with_stub(false);
        player.play("http://a").unwrap();
        assert!(player.is_playing());
        assert_eq!(player.state(), PlaybackState::Playing);
        player.stop();
        assert!(!player.is_playing());
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn double_stop_is_a_no_op() {
        let (mut player, calls, _tx) = player_with_stub(false);
        player.play("http://a").unwrap();
        player.stop();
        player.stop();
        // One stop from play()'s implicit reset never happens on an idle
        // engine, so the backend saw exactly one stop.
        assert_eq!(calls.borrow().stops, 1);
    }

    #[test]
    fn recording_on_idle_engine_is_refused() {
        let (mut player, calls, _tx) = player_with_stub(false);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("rec.mp3");
        assert!(!player.start_recording(&target));
        assert!(calls.borrow().recorded.is_empty());
        assert!(!target.exists());
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn recording_reopens_the_stream_with_a_sink() {
        let (mut player, calls, _tx) = player_with_stub(false);
        player.play("http://a").unwrap();
        assert!(player.start_recording(Path::new("/tmp/rec.mp3")));
        assert_eq!(player.state(), PlaybackState::Recording);
        {
            let calls = calls.borrow();
            // The consumption handle was released before the sink opened.
            assert_eq!(calls.stops, 1);
            assert_eq!(calls.recorded.len(), 1);
            assert_eq!(calls.recorded[0].0, "http://a");
        }
        player.stop_recording();
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn recording_while_recording_fails_fast() {
        let (mut player, calls, _tx) = player_with_stub(false);
        player.play("http://a").unwrap();
        assert!(player.start_recording(Path::new("/tmp/rec.mp3")));
        assert!(!player.start_recording(Path::new("/tmp/other.mp3")));
        assert_eq!(calls.borrow().recorded.len(), 1);
    }

    #[test]
    fn failed_sink_returns_false_and_goes_idle() {
        let (mut player, calls, _tx) = player_with_stub(true);
        player.play("http://a").unwrap();
        assert!(!player.start_recording(Path::new("/tmp/rec.mp3")));
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(calls.borrow().recorded.is_empty());
    }

    #[test]
    fn volume_is_clamped_defensively() {
        let (mut player, calls, _tx) = player_with_stub(false);
        player.set_volume(150);
        player.set_volume(-20);
        player.set_volume(40);
        assert_eq!(calls.borrow().volumes, [100, 0, 40]);
    }

    #[test]
    fn backend_error_forces_idle() {
        let (mut player, _, tx) = player_with_stub(false);
        player.play("http://a").unwrap();
        tx.send(PlayerEvent::Error("codec error".to_string())).unwrap();
        let event = player.poll_event().unwrap();
        let PlayerEvent::Error(message) = event;
        assert_eq!(message, "codec error");
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(player.poll_event().is_none());
    }
}

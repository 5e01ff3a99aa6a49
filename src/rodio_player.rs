//! Fallback playback engine: an in-process rodio sink fed by a blocking HTTP
//! reader thread. Buffers an initial window before the first decode so live
//! streams start without underruns, then keeps appending fixed-size
//! segments. Recording duplicates the fetched bytes to a file from the same
//! thread.

use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::player::{PlaybackBackend, PlayerError, PlayerEvent};
use crate::record::RecordSpec;

const INITIAL_BUFFER_BYTES: usize = 256 * 1024;
const SEGMENT_BYTES: usize = 512 * 1024;

pub struct RodioBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Arc<Sink>>,
    feeder_stop: Option<Arc<AtomicBool>>,
    events: Sender<PlayerEvent>,
    volume: i32,
    muted: bool,
}

impl RodioBackend {
    pub fn start(events: Sender<PlayerEvent>) -> Result<Self, PlayerError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| PlayerError::NoBackend(format!("audio device unavailable: {}", e)))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
            feeder_stop: None,
            events,
            volume: 100,
            muted: false,
        })
    }

    fn start_stream(&mut self, url: &str, record: Option<File>) -> Result<(), PlayerError> {
        self.stop();
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| PlayerError::Stream(format!("audio sink failed: {}", e)))?;
        let sink = Arc::new(sink);
        self.apply_volume(&sink);

        let stop = Arc::new(AtomicBool::new(false));
        let feeder_sink = Arc::clone(&sink);
        let feeder_stop_flag = Arc::clone(&stop);
        let feeder_events = self.events.clone();
        let feeder_url = url.to_string();
        thread::spawn(move || {
            feeder(feeder_url, feeder_sink, feeder_stop_flag, feeder_events, record)
        });

        self.sink = Some(sink);
        self.feeder_stop = Some(stop);
        Ok(())
    }

    fn apply_volume(&self, sink: &Sink) {
        let effective = if self.muted { 0.0 } else { self.volume as f32 / 100.0 };
        sink.set_volume(effective);
    }
}

impl PlaybackBackend for RodioBackend {
    fn name(&self) -> &'static str {
        "rodio"
    }

    fn play(&mut self, url: &str) -> Result<(), PlayerError> {
        self.start_stream(url, None)
    }

    fn play_with_record(&mut self, url: &str, spec: &RecordSpec) -> Result<(), PlayerError> {
        let file = File::create(&spec.path)
            .map_err(|e| PlayerError::Record(format!("cannot open record target: {}", e)))?;
        self.start_stream(url, Some(file))
    }

    fn stop(&mut self) {
        if let Some(stop) = self.feeder_stop.take() {
            stop.store(true, Ordering::SeqCst);
        }
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn set_volume(&mut self, volume: i32) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            self.apply_volume(sink);
        }
    }

    fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        if let Some(sink) = &self.sink {
            self.apply_volume(sink);
        }
    }

    fn is_playing(&mut self) -> bool {
        self.sink.as_ref().map(|s| !s.empty()).unwrap_or(false)
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

fn feeder(
    url: String,
    sink: Arc<Sink>,
    stop: Arc<AtomicBool>,
    events: Sender<PlayerEvent>,
    mut record: Option<File>,
) {
    let response = reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .and_then(|client| client.get(&url).send());
    let mut response = match response {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            let _ = events.send(PlayerEvent::Error(format!(
                "stream returned HTTP {}",
                r.status()
            )));
            return;
        }
        Err(e) => {
            let _ = events.send(PlayerEvent::Error(format!("stream open failed: {}", e)));
            return;
        }
    };

    let mut staged: Vec<u8> = Vec::with_capacity(INITIAL_BUFFER_BYTES);
    let mut primed = false;
    let mut chunk = [0u8; 8192];
    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if let Some(f) = record.as_mut() {
                    let _ = f.write_all(&chunk[..n]);
                }
                staged.extend_from_slice(&chunk[..n]);
                let threshold = if primed { SEGMENT_BYTES } else { INITIAL_BUFFER_BYTES };
                if staged.len() >= threshold {
                    let data = std::mem::take(&mut staged);
                    match Decoder::new(Cursor::new(data)) {
                        Ok(source) => {
                            sink.append(source);
                            primed = true;
                        }
                        Err(e) => {
                            // A later segment that fails to sync is dropped;
                            // an undecodable stream head is fatal.
                            if !primed {
                                let _ = events.send(PlayerEvent::Error(format!(
                                    "stream decode failed: {}",
                                    e
                                )));
                                return;
                            }
                        }
                    }
                }
            }
            Err(e) => {
                if !stop.load(Ordering::SeqCst) {
                    let _ =
                        events.send(PlayerEvent::Error(format!("stream read failed: {}", e)));
                }
                return;
            }
        }
    }
    // Stream ended; decode whatever is left.
    if !staged.is_empty() {
        if let Ok(source) = Decoder::new(Cursor::new(staged)) {
            sink.append(source);
        }
    }
}

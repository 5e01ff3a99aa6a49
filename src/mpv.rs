//! Native playback engine: an mpv child process driven over its JSON IPC
//! socket. One reader thread owns the socket's read half and routes
//! request-id replies back to the caller; unsolicited `end-file` errors go to
//! the engine's event channel.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

use crate::player::{PlaybackBackend, PlayerError, PlayerEvent};
use crate::record::RecordSpec;

const IPC_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MpvBackend {
    child: Child,
    socket_path: PathBuf,
    stream: UnixStream,
    replies: Receiver<Value>,
    next_req: u64,
}

impl MpvBackend {
    /// Spawns mpv and connects to its IPC socket. Unavailable binary or a
    /// socket that never appears both mean "native engine missing" and the
    /// caller falls back to the toolkit sink.
    pub fn start(events: Sender<PlayerEvent>) -> Result<Self, PlayerError> {
        let binary = find_mpv_binary()
            .ok_or_else(|| PlayerError::NoBackend("mpv binary not found".to_string()))?;
        let socket_path =
            std::env::temp_dir().join(format!("amwaj-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let child = Command::new(binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--quiet")
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PlayerError::NoBackend(format!("mpv spawn failed: {}", e)))?;

        let mut stream = None;
        for _ in 0..50 {
            thread::sleep(Duration::from_millis(100));
            if let Ok(s) = UnixStream::connect(&socket_path) {
                stream = Some(s);
                break;
            }
        }
        let stream = match stream {
            Some(s) => s,
            None => {
                let mut child = child;
                let _ = child.kill();
                let _ = child.wait();
                return Err(PlayerError::NoBackend(
                    "mpv IPC socket did not appear".to_string(),
                ));
            }
        };

        let read_half = stream
            .try_clone()
            .map_err(|e| PlayerError::NoBackend(format!("mpv socket clone failed: {}", e)))?;
        let (reply_tx, replies) = mpsc::channel();
        thread::spawn(move || reader_loop(BufReader::new(read_half), reply_tx, events));

        Ok(Self {
            child,
            socket_path,
            stream,
            replies,
            next_req: 1,
        })
    }

    fn command(&mut self, cmd: Value) -> Result<Value, PlayerError> {
        let req_id = self.next_req;
        self.next_req += 1;
        let msg = json!({ "command": cmd, "request_id": req_id });
        let mut raw = msg.to_string();
        raw.push('\n');
        self.stream
            .write_all(raw.as_bytes())
            .map_err(|e| PlayerError::Stream(format!("mpv IPC write failed: {}", e)))?;

        // Stale replies from a timed-out earlier request may still be queued;
        // drain until ours arrives.
        loop {
            let reply = self
                .replies
                .recv_timeout(IPC_REPLY_TIMEOUT)
                .map_err(|_| PlayerError::Stream("mpv IPC reply timed out".to_string()))?;
            if reply.get("request_id").and_then(Value::as_u64) != Some(req_id) {
                continue;
            }
            let error = reply.get("error").and_then(Value::as_str).unwrap_or("");
            if error == "success" {
                return Ok(reply);
            }
            return Err(PlayerError::Stream(format!("mpv: {}", error)));
        }
    }
}

impl PlaybackBackend for MpvBackend {
    fn name(&self) -> &'static str {
        "mpv"
    }

    fn play(&mut self, url: &str) -> Result<(), PlayerError> {
        self.command(json!(["loadfile", url, "replace"]))?;
        Ok(())
    }

    fn play_with_record(&mut self, url: &str, spec: &RecordSpec) -> Result<(), PlayerError> {
        // Per-file option: the record sink lives and dies with this load.
        self.command(json!(["loadfile", url, "replace", spec.loadfile_options()]))
            .map_err(|e| PlayerError::Record(e.to_string()))?;
        Ok(())
    }

    fn stop(&mut self) {
        let _ = self.command(json!(["stop"]));
    }

    fn set_volume(&mut self, volume: i32) {
        let _ = self.command(json!(["set_property", "volume", volume]));
    }

    fn toggle_mute(&mut self) {
        let _ = self.command(json!(["cycle", "mute"]));
    }

    fn is_playing(&mut self) -> bool {
        match self.command(json!(["get_property", "core-idle"])) {
            Ok(reply) => !reply.get("data").and_then(Value::as_bool).unwrap_or(true),
            Err(_) => false,
        }
    }
}

impl Drop for MpvBackend {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

fn reader_loop(
    mut reader: BufReader<UnixStream>,
    replies: Sender<Value>,
    events: Sender<PlayerEvent>,
) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let value: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                if value.get("request_id").is_some() {
                    if replies.send(value).is_err() {
                        break;
                    }
                } else if value.get("event").and_then(Value::as_str) == Some("end-file") {
                    let reason = value.get("reason").and_then(Value::as_str).unwrap_or("");
                    if reason == "error" {
                        let detail = value
                            .get("file_error")
                            .and_then(Value::as_str)
                            .unwrap_or("stream ended with an error");
                        let _ = events.send(PlayerEvent::Error(format!("mpv: {}", detail)));
                    }
                }
            }
            Err(_) => break,
        }
    }
}

fn find_mpv_binary() -> Option<String> {
    let which = Command::new("which")
        .arg("mpv")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if which.is_some() {
        return which;
    }
    let candidates = [
        "/opt/homebrew/bin/mpv",
        "/usr/local/bin/mpv",
        "/usr/bin/mpv",
        "/Applications/mpv.app/Contents/MacOS/mpv",
    ];
    candidates
        .iter()
        .find(|p| std::path::Path::new(p).exists())
        .map(|p| p.to_string())
}

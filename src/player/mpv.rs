//! mpv を JSON IPC で操作するメディア要素
//!
//! 初回の読み込み時に mpv をアイドル状態で起動し、
//! `loadfile` / `seek` / `set_property` コマンドを送る。
//! mpv が発行する `file-loaded` と `end-file` イベントを MediaEvent に変換する。
//!
//! イベントは `loadfile` の応答で得たプレイリスト項目ID（`playlist_entry_id`）で
//! 動画に対応付ける。置き換え前のファイルのイベントは新しい動画には付かない。

use crate::api::InfraError;
use crate::domain::playback::{MediaElement, MediaEvent};
use crate::domain::session::VideoId;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::OwnedWriteHalf;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_INTERVAL: Duration = Duration::from_millis(100);

type SharedTranslator = Arc<Mutex<EventTranslator>>;

pub struct MpvPlayer {
    mpv_path: String,
    events: mpsc::Sender<MediaEvent>,
    socket_path: PathBuf,
    child: Option<Child>,
    writer: Option<OwnedWriteHalf>,
    reader: Option<JoinHandle<()>>,
    translator: SharedTranslator,
    next_request_id: u64,
}

impl MpvPlayer {
    pub fn new(mpv_path: impl Into<String>, events: mpsc::Sender<MediaEvent>) -> Self {
        let socket_path =
            std::env::temp_dir().join(format!("vidsearch-mpv-{}.sock", std::process::id()));
        Self {
            mpv_path: mpv_path.into(),
            events,
            socket_path,
            child: None,
            writer: None,
            reader: None,
            translator: Arc::new(Mutex::new(EventTranslator::default())),
            next_request_id: 1,
        }
    }

    /// mpv が動作中でなければ起動してIPCに接続する
    async fn ensure_running(&mut self) -> Result<(), InfraError> {
        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(None) => return Ok(()),
                Ok(Some(status)) => warn!(%status, "mpv: process exited, restarting"),
                Err(e) => warn!(error = %e, "mpv: failed to query process state"),
            }
            self.shutdown();
        }

        // 前回のクラッシュで残ったソケットを消す
        let _ = std::fs::remove_file(&self.socket_path);

        let mut cmd = Command::new(&self.mpv_path);
        cmd.args([
            "--idle=yes",
            "--force-window=yes",
            "--keep-open=yes",
            "--pause",
            &format!("--input-ipc-server={}", self.socket_path.display()),
        ]);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InfraError::media(format!(
                    "mpv not found at '{}'. Install mpv or set player.mpv_path",
                    self.mpv_path
                ))
            } else {
                InfraError::io("failed to spawn mpv", e)
            }
        })?;
        self.child = Some(child);

        let stream = self.connect().await?;
        let (read_half, write_half) = stream.into_split();

        // 新しいプロセスのプレイリストIDは前回と無関係
        self.translator = Arc::new(Mutex::new(EventTranslator::default()));

        let events = self.events.clone();
        let translator = Arc::clone(&self.translator);
        self.reader = Some(tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let event = translator
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .translate(&line);
                if let Some(event) = event {
                    debug!(?event, "mpv: event");
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }));
        self.writer = Some(write_half);
        Ok(())
    }

    /// 起動直後はソケットがまだ無いため一定回数リトライする
    async fn connect(&self) -> Result<UnixStream, InfraError> {
        let mut last_error = None;
        for _ in 0..CONNECT_ATTEMPTS {
            match UnixStream::connect(&self.socket_path).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
            tokio::time::sleep(CONNECT_INTERVAL).await;
        }
        let detail = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(InfraError::media(format!(
            "could not connect to mpv IPC socket: {}",
            detail
        )))
    }

    fn take_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    async fn send_command(&mut self, request_id: u64, command: Value) -> Result<(), InfraError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| InfraError::media("mpv is not running"))?;

        let mut payload = json!({ "command": command, "request_id": request_id }).to_string();
        payload.push('\n');
        writer
            .write_all(payload.as_bytes())
            .await
            .map_err(|e| InfraError::io("failed to send command to mpv", e))
    }

    fn shutdown(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.writer = None;
        // kill_on_drop によりプロセスも終了する
        self.child = None;
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// mpv のIPC出力を MediaEvent に変換する
///
/// `loadfile` の応答でプレイリスト項目IDと動画を結び付け、
/// `start-file` で現在の項目を切り替える。対応の取れない行は無視する。
#[derive(Debug, Default)]
struct EventTranslator {
    /// 応答待ちの `loadfile`（request_id → 動画）
    pending_loads: HashMap<u64, VideoId>,
    /// playlist_entry_id → 動画
    entries: HashMap<i64, VideoId>,
    /// `start-file` で開始された項目
    active_entry: Option<i64>,
}

impl EventTranslator {
    fn expect_load(&mut self, request_id: u64, video_id: VideoId) {
        self.pending_loads.insert(request_id, video_id);
    }

    fn translate(&mut self, line: &str) -> Option<MediaEvent> {
        let value: Value = serde_json::from_str(line).ok()?;

        let Some(event) = value.get("event").and_then(Value::as_str) else {
            return self.on_reply(&value);
        };

        let entry_id = value.get("playlist_entry_id").and_then(Value::as_i64);
        match event {
            "start-file" => {
                self.active_entry = entry_id;
                None
            }
            "file-loaded" => {
                let video_id = self.entries.get(&self.active_entry?)?.clone();
                Some(MediaEvent::MetadataLoaded(video_id))
            }
            "end-file" => {
                let entry_id = entry_id?;
                if self.active_entry == Some(entry_id) {
                    self.active_entry = None;
                }
                let video_id = self.entries.remove(&entry_id)?;
                if value.get("reason").and_then(Value::as_str) != Some("error") {
                    return None;
                }
                let detail = value
                    .get("file_error")
                    .and_then(Value::as_str)
                    .unwrap_or("playback error")
                    .to_string();
                Some(MediaEvent::Failed { video_id, detail })
            }
            _ => None,
        }
    }

    /// コマンド応答。`loadfile` 以外の応答は無視する
    fn on_reply(&mut self, value: &Value) -> Option<MediaEvent> {
        let request_id = value.get("request_id").and_then(Value::as_u64)?;
        let video_id = self.pending_loads.remove(&request_id)?;

        let status = value.get("error").and_then(Value::as_str).unwrap_or("unknown");
        if status != "success" {
            return Some(MediaEvent::Failed {
                video_id,
                detail: format!("loadfile failed: {}", status),
            });
        }

        match value
            .get("data")
            .and_then(|d| d.get("playlist_entry_id"))
            .and_then(Value::as_i64)
        {
            Some(entry_id) => {
                self.entries.insert(entry_id, video_id);
            }
            // playlist_entry_id を返さない古い mpv ではイベントを対応付けられない
            None => warn!(video = %video_id, "mpv: loadfile reply has no playlist_entry_id"),
        }
        None
    }
}

impl MediaElement for MpvPlayer {
    async fn load(&mut self, video_id: &VideoId, source_url: &str) -> Result<(), InfraError> {
        self.ensure_running().await?;

        let request_id = self.take_request_id();
        self.translator
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .expect_load(request_id, video_id.clone());
        self.send_command(request_id, json!(["loadfile", source_url, "replace"]))
            .await
    }

    async fn seek_and_play(&mut self, seconds: f64) -> Result<(), InfraError> {
        let request_id = self.take_request_id();
        self.send_command(request_id, json!(["seek", seconds, "absolute"]))
            .await?;
        let request_id = self.take_request_id();
        self.send_command(request_id, json!(["set_property", "pause", false]))
            .await
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

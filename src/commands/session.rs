//! 対話セッション
//!
//! stdinの行入力、メディア要素からのイベント、アップロード・検索タスクの完了を
//! 1つのループで順に処理する。アップロードと検索は互いに独立したタスクとして走る。
//! `quit` で抜けると実行中のタスクは中断される。入力が終わった（EOF）場合は
//! 実行中のタスクの完了を待ってから終了する。

use crate::api::{ApiClient, VideoSearchApi};
use crate::commands::result::{CommandResult, MatchEntry, SessionResult};
use crate::config::UserConfig;
use crate::domain::error::DomainError;
use crate::domain::playback::{MediaElement, MediaEvent, PlaybackSynchronizer, SeekAction};
use crate::domain::progress::{ProgressEstimator, ProgressSettings};
use crate::domain::search::{SearchController, SearchOutcome};
use crate::domain::session::{SearchResultSet, SessionHandle, StatusKind, VideoId};
use crate::domain::upload::{UploadController, UploadOutcome};
use crate::domain::validator;
use crate::player::Player;
use crate::presentation::input::{self, SessionCommand};
use crate::presentation::output;
use crate::presentation::progress::{ProgressFormat, ProgressRenderer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

/// メディアイベントのバッファ
const EVENT_BUFFER: usize = 16;

/// 対話セッションを実行する
pub async fn execute() -> Result<CommandResult> {
    // ユーザー設定を読み込み（自動検証される）
    let user_config = UserConfig::load()
        .context("Failed to load user configuration. Please check your config.toml file.")?;
    let client = ApiClient::production().context("Failed to create API client")?;

    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let player = Player::from_config(&user_config, client.clone(), events_tx);
    debug!(
        endpoint = client.base_url(),
        player = ?player.kind(),
        "session: started"
    );

    output::print_session_help();
    let stdin = BufReader::new(tokio::io::stdin()).lines();
    let stats = SessionLoop::new(Arc::new(client), player, events_rx, SessionHandle::new())
        .run(stdin)
        .await?;

    Ok(CommandResult::Session(stats))
}

/// バックグラウンドタスクの完了通知
enum TaskDone {
    Upload(UploadOutcome),
    Search(SearchOutcome),
}

enum Flow {
    Continue,
    Quit,
}

struct SessionLoop<A, M> {
    api: Arc<A>,
    session: SessionHandle,
    uploads: Arc<UploadController<A>>,
    searches: Arc<SearchController<A>>,
    playback: PlaybackSynchronizer<M>,
    events: mpsc::Receiver<MediaEvent>,
    tasks: JoinSet<TaskDone>,
    renderer: Option<ProgressRenderer>,
    stats: SessionResult,
}

impl<A, M> SessionLoop<A, M>
where
    A: VideoSearchApi + 'static,
    M: MediaElement,
{
    fn new(
        api: Arc<A>,
        media: M,
        events: mpsc::Receiver<MediaEvent>,
        session: SessionHandle,
    ) -> Self {
        let progress = ProgressEstimator::new(ProgressSettings::from_config());
        Self {
            uploads: Arc::new(UploadController::new(
                Arc::clone(&api),
                session.clone(),
                progress,
            )),
            searches: Arc::new(SearchController::new(Arc::clone(&api), session.clone())),
            playback: PlaybackSynchronizer::new(media, session.clone()),
            api,
            session,
            events,
            tasks: JoinSet::new(),
            renderer: None,
            stats: SessionResult::default(),
        }
    }

    async fn run<R>(mut self, mut lines: Lines<R>) -> Result<SessionResult>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut input_open = true;
        output::print_prompt();

        loop {
            if !input_open && self.tasks.is_empty() {
                break;
            }

            tokio::select! {
                line = lines.next_line(), if input_open => {
                    match line.context("Failed to read from stdin")? {
                        Some(line) => {
                            if let Flow::Quit = self.handle_line(&line).await {
                                break;
                            }
                            output::print_prompt();
                        }
                        None => {
                            debug!(pending = self.tasks.len(), "session: input closed");
                            input_open = false;
                        }
                    }
                }
                Some(event) = self.events.recv() => {
                    self.on_media_event(event);
                }
                Some(joined) = self.tasks.join_next() => {
                    self.on_task_done(joined).await;
                }
                else => break,
            }
        }

        if !self.tasks.is_empty() {
            debug!(pending = self.tasks.len(), "session: aborting in-flight tasks");
            self.tasks.abort_all();
        }
        self.stop_renderer();
        Ok(self.stats)
    }

    async fn handle_line(&mut self, line: &str) -> Flow {
        let command = match input::parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                eprintln!("{}", e);
                return Flow::Continue;
            }
        };

        match command {
            SessionCommand::Open(path) => self.open(&path),
            SessionCommand::Clear => {
                self.uploads.clear_file();
                eprintln!("Selection cleared.");
            }
            SessionCommand::Upload => self.start_upload(),
            SessionCommand::Query(text) => self.searches.set_query(text),
            SessionCommand::Search(text) => self.start_search(text),
            SessionCommand::Play(name) => {
                let video_id = VideoId::new(name);
                let url = self.api.video_url(&video_id);
                self.playback.on_video_identifier_changed(video_id, &url).await;
            }
            SessionCommand::Seek(number) => self.seek(number).await,
            SessionCommand::Results => self.print_results(),
            SessionCommand::Status => output::print_status(&self.session.snapshot()),
            SessionCommand::Help => output::print_session_help(),
            SessionCommand::Quit => return Flow::Quit,
        }

        Flow::Continue
    }

    /// ファイル選択（ピッカー・ドロップ共通の経路）
    fn open(&self, path: &str) {
        let selected = validator::inspect_file(path).and_then(|file| {
            let name = file.name().to_string();
            self.uploads.select_file(file).map(|()| name)
        });

        match selected {
            Ok(name) => eprintln!("Selected: {}", name),
            Err(e) => report_domain_error(&e),
        }
    }

    fn start_upload(&mut self) {
        if !self.session.read(|s| s.can_upload()) {
            let reason = if self.session.read(|s| s.is_uploading()) {
                "An upload is already in progress."
            } else {
                "Select a video first with 'open <file>'."
            };
            eprintln!("{}", reason);
            return;
        }

        self.stop_renderer();
        self.renderer = Some(ProgressRenderer::spawn(
            self.uploads.progress(),
            ProgressFormat::Human,
        ));

        let uploads = Arc::clone(&self.uploads);
        self.tasks
            .spawn(async move { TaskDone::Upload(uploads.upload().await) });
    }

    fn start_search(&mut self, text: Option<String>) {
        let searches = Arc::clone(&self.searches);
        self.tasks.spawn(async move {
            let outcome = match text {
                Some(text) => searches.submit(text).await,
                None => searches.search().await,
            };
            TaskDone::Search(outcome)
        });
    }

    async fn seek(&mut self, number: usize) {
        let result = self.session.read(|s| {
            s.search_results()
                .and_then(|set| set.results().get(number - 1).cloned())
        });

        let Some(result) = result else {
            eprintln!("There is no result #{}.", number);
            return;
        };

        match self.playback.seek_action(&result) {
            SeekAction::Disabled => {
                eprintln!("The video is still loading. Seeking is enabled once it is ready.");
            }
            SeekAction::Enabled { seconds } => {
                if let Err(e) = self.playback.seek_to(seconds).await {
                    eprintln!("✗ {}", e);
                    if let Some(hint) = e.hint() {
                        eprintln!("  Hint: {}", hint);
                    }
                }
            }
        }
    }

    fn on_media_event(&mut self, event: MediaEvent) {
        let ready = matches!(event, MediaEvent::MetadataLoaded(_));
        if !self.playback.handle_event(event) {
            return;
        }

        eprintln!();
        if ready {
            output::print_status_message(StatusKind::Success, "Video ready. Seeking is enabled.");
        } else if let Some(status) = self.session.read(|s| s.status().cloned()) {
            output::print_status_message(status.kind, &status.text);
        }
        output::print_prompt();
    }

    async fn on_task_done(&mut self, joined: Result<TaskDone, JoinError>) {
        let done = match joined {
            Ok(done) => done,
            Err(e) if e.is_cancelled() => return,
            Err(e) => {
                warn!(err = %e, "session: background task failed");
                return;
            }
        };

        eprintln!();
        match done {
            TaskDone::Upload(outcome) => self.on_upload_done(outcome).await,
            TaskDone::Search(outcome) => self.on_search_done(outcome),
        }
        output::print_prompt();
    }

    async fn on_upload_done(&mut self, outcome: UploadOutcome) {
        self.stop_renderer();
        self.print_current_status();

        match outcome {
            UploadOutcome::Succeeded { video_id } => {
                self.stats.uploads += 1;
                if let Some(analysis) = self.session.read(|s| s.analysis().cloned()) {
                    output::print_label_summary(&analysis.summary());
                }
                let url = self.api.video_url(&video_id);
                eprintln!("Stream URL: {}", url);
                self.playback.on_video_identifier_changed(video_id, &url).await;
            }
            UploadOutcome::Failed { error } => eprintln!("  ({})", error),
            UploadOutcome::Skipped => {}
        }
    }

    fn on_search_done(&mut self, outcome: SearchOutcome) {
        match outcome {
            SearchOutcome::Completed { matches } => {
                self.stats.searches += 1;
                if matches > 0 {
                    eprintln!("{} result(s):", matches);
                }
                self.print_results();
            }
            SearchOutcome::Failed { error } => {
                self.print_current_status();
                eprintln!("  ({})", error);
            }
            SearchOutcome::Skipped => {
                debug!("session: search skipped");
            }
        }
    }

    fn print_results(&self) {
        let set: Option<SearchResultSet> = self.session.read(|s| s.search_results().cloned());
        let rows: Result<Vec<(MatchEntry, SeekAction)>, DomainError> = set
            .as_ref()
            .map(|set| {
                set.results()
                    .iter()
                    .map(|r| {
                        let entry = MatchEntry::from_result(r)?;
                        Ok::<_, DomainError>((entry, self.playback.seek_action(r)))
                    })
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()));
        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };

        if matches!(set, Some(SearchResultSet::NotSearched)) {
            eprintln!("No search yet. Use 'search <label>'.");
            return;
        }
        output::print_search_results(set.as_ref(), &rows);
    }

    fn print_current_status(&self) {
        if let Some(status) = self.session.read(|s| s.status().cloned()) {
            output::print_status_message(status.kind, &status.text);
        }
    }

    fn stop_renderer(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            renderer.finish();
        }
    }
}

fn report_domain_error(error: &DomainError) {
    eprintln!("✗ {}", error);
    if let Some(hint) = error.hint() {
        eprintln!("  Hint: {}", hint);
    }
}

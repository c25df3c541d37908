//! ドメイン層: アップロードの疑似進捗
//!
//! 解析エンドポイントは1回のリクエストで完結し途中経過を返さないため、
//! 応答待ちの間は一定間隔でランダムに進捗を進める。
//! 応答待ちの間は上限（90未満）で頭打ちにし、完了時にだけ100にする。
//! 完了・失敗のどちらでも、一定時間後に表示を0へ戻す。
//!
//! ティッカーは [`ProgressRun`] が所有し、どの経路で抜けても Drop で停止する。

use crate::config::APP_CONFIG;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// 完了時の進捗(%)
pub const COMPLETE_PERCENT: f64 = 100.0;

/// 疑似進捗のパラメータ
#[derive(Debug, Clone)]
pub struct ProgressSettings {
    pub tick_interval: Duration,
    pub max_increment: f64,
    pub in_flight_cap: f64,
    pub decay_delay: Duration,
}

impl ProgressSettings {
    /// APP_CONFIG の [progress] から作成
    pub fn from_config() -> Self {
        let progress = &APP_CONFIG.progress;
        Self {
            tick_interval: Duration::from_millis(progress.tick_interval_ms),
            max_increment: progress.max_increment,
            in_flight_cap: progress.in_flight_cap,
            decay_delay: Duration::from_millis(progress.decay_delay_ms),
        }
    }
}

type IncrementFn = Arc<dyn Fn() -> f64 + Send + Sync>;

/// 疑似進捗の発生源
///
/// 値は `watch` チャネルで配信され、表示側は [`ProgressEstimator::subscribe`] で購読する。
pub struct ProgressEstimator {
    settings: ProgressSettings,
    sender: Arc<watch::Sender<f64>>,
    increment: IncrementFn,
    decay: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressEstimator {
    /// `0..max_increment` の一様乱数で進める推定器を作成
    pub fn new(settings: ProgressSettings) -> Self {
        let max_increment = settings.max_increment;
        Self::with_increment(settings, move || rand::random::<f64>() * max_increment)
    }

    /// 増分の発生方法を指定して作成
    pub fn with_increment(
        settings: ProgressSettings,
        increment: impl Fn() -> f64 + Send + Sync + 'static,
    ) -> Self {
        let (sender, _) = watch::channel(0.0);
        Self {
            settings,
            sender: Arc::new(sender),
            increment: Arc::new(increment),
            decay: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.sender.subscribe()
    }

    #[cfg(test)]
    pub fn current(&self) -> f64 {
        *self.sender.borrow()
    }

    /// 進捗を0から開始する
    ///
    /// 前回分の減衰タイマーが残っていれば取り消す。
    pub fn start(&self) -> ProgressRun<'_> {
        self.cancel_decay();
        self.sender.send_replace(0.0);

        let sender = Arc::clone(&self.sender);
        let increment = Arc::clone(&self.increment);
        let tick = self.settings.tick_interval;
        let cap = self.settings.in_flight_cap;

        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
            loop {
                interval.tick().await;
                let step = increment().max(0.0);
                sender.send_modify(|progress| *progress = advance(*progress, step, cap));
            }
        });

        debug!(tick_ms = tick.as_millis() as u64, cap, "progress: ticker started");
        ProgressRun {
            estimator: self,
            ticker: Some(ticker),
        }
    }

    fn lock_decay(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.decay.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cancel_decay(&self) {
        if let Some(handle) = self.lock_decay().take() {
            handle.abort();
        }
    }

    fn schedule_decay(&self) {
        let sender = Arc::clone(&self.sender);
        let delay = self.settings.decay_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sender.send_replace(0.0);
        });

        if let Some(previous) = self.lock_decay().replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for ProgressEstimator {
    fn drop(&mut self) {
        self.cancel_decay();
    }
}

/// 1ティック分進める。上限に達していれば据え置く
fn advance(current: f64, step: f64, cap: f64) -> f64 {
    if current >= cap {
        current
    } else {
        (current + step).min(cap)
    }
}

/// 実行中の疑似進捗
///
/// `complete` / `abandon` で終了する。どちらも呼ばれずに破棄された場合も
/// ティッカーは停止する。
#[must_use = "dropping a ProgressRun stops the ticker immediately"]
pub struct ProgressRun<'a> {
    estimator: &'a ProgressEstimator,
    ticker: Option<JoinHandle<()>>,
}

impl ProgressRun<'_> {
    fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            debug!("progress: ticker stopped");
        }
    }

    /// 応答を受信した: 100にしてから減衰させる
    pub fn complete(mut self) {
        self.stop();
        self.estimator.sender.send_replace(COMPLETE_PERCENT);
        self.estimator.schedule_decay();
    }

    /// 失敗した: 現在値のまま減衰させる
    pub fn abandon(mut self) {
        self.stop();
        self.estimator.schedule_decay();
    }
}

impl Drop for ProgressRun<'_> {
    fn drop(&mut self) {
        self.stop();
    }
}

//! ライブ監視の状態機械（Idle / Running）とtickスケジューラ
//!
//! Running になる条件は「監視フラグON かつ キャプチャあり」。
//! Running を抜けるときは停止シグナルを送ってタスクの終了を待つので、
//! 遷移が戻った時点で以降のイベント追加は起きない。

use super::{next_delay, step, LiveFeed, RandomSource, SimulatedEvent};
use chrono::Local;
use defect_inspect_common::LiveStats;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Running,
}

/// 疑似キャプチャストリーム
#[derive(Debug, PartialEq, Eq)]
pub struct CaptureStream {
    source: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl CaptureStream {
    pub fn open(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            width: 1280,
            height: 720,
            fps: 30,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// キャプチャを解放する
    pub fn release(self) -> String {
        self.source
    }
}

struct RunningTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Monitor<R> {
    feed: Arc<Mutex<LiveFeed>>,
    rng: Arc<Mutex<R>>,
    active: bool,
    capture: Option<CaptureStream>,
    task: Option<RunningTask>,
    subscriber: Option<mpsc::UnboundedSender<SimulatedEvent>>,
}

impl<R> Monitor<R>
where
    R: RandomSource + Send + 'static,
{
    pub fn new(rng: R) -> Self {
        Self {
            feed: Arc::new(Mutex::new(LiveFeed::new())),
            rng: Arc::new(Mutex::new(rng)),
            active: false,
            capture: None,
            task: None,
            subscriber: None,
        }
    }

    /// 発生したイベントを受け取るチャネルを登録
    pub fn with_subscriber(mut self, tx: mpsc::UnboundedSender<SimulatedEvent>) -> Self {
        self.subscriber = Some(tx);
        self
    }

    pub fn state(&self) -> MonitorState {
        if self.task.is_some() {
            MonitorState::Running
        } else {
            MonitorState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn capture(&self) -> Option<&CaptureStream> {
        self.capture.as_ref()
    }

    pub async fn set_active(&mut self, active: bool) {
        self.active = active;
        self.reconcile().await;
    }

    /// キャプチャを差し替える（古いものは解放）
    pub async fn attach_capture(&mut self, capture: CaptureStream) {
        if let Some(old) = self.capture.replace(capture) {
            old.release();
        }
        self.reconcile().await;
    }

    pub async fn detach_capture(&mut self) -> Option<CaptureStream> {
        let capture = self.capture.take();
        self.reconcile().await;
        capture
    }

    /// キャプチャを開いて監視開始
    pub async fn start(&mut self, capture: CaptureStream) {
        self.active = true;
        self.attach_capture(capture).await;
    }

    /// 監視停止。予約済みtickを取り消し、キャプチャも解放する
    pub async fn stop(&mut self) {
        self.active = false;
        self.reconcile().await;
        if let Some(capture) = self.capture.take() {
            capture.release();
        }
    }

    /// 統計とログをリセット（状態に関わらず）
    pub fn reset_stats(&self) {
        lock(&self.feed).reset();
    }

    pub fn stats(&self) -> LiveStats {
        lock(&self.feed).stats()
    }

    /// 現在のログ・統計のコピー
    pub fn snapshot(&self) -> LiveFeed {
        lock(&self.feed).clone()
    }

    async fn reconcile(&mut self) {
        let should_run = self.active && self.capture.is_some();
        match (should_run, self.task.is_some()) {
            (true, false) => self.spawn(),
            (false, true) => self.shutdown().await,
            _ => {}
        }
    }

    fn spawn(&mut self) {
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(run(
            Arc::clone(&self.feed),
            Arc::clone(&self.rng),
            self.subscriber.clone(),
            stop_rx,
        ));
        self.task = Some(RunningTask { stop: stop_tx, handle });
    }

    async fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.stop.send(());
            if let Err(e) = task.handle.await {
                eprintln!("監視タスクが異常終了しました: {}", e);
            }
        }
    }
}

impl<R> Drop for Monitor<R> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.handle.abort();
        }
    }
}

async fn run<R: RandomSource>(
    feed: Arc<Mutex<LiveFeed>>,
    rng: Arc<Mutex<R>>,
    subscriber: Option<mpsc::UnboundedSender<SimulatedEvent>>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut delay = next_delay(&mut *lock(&rng));

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            _ = tokio::time::sleep(delay) => {}
        }

        let tick = step(&mut *lock(&rng), Local::now());
        if let Some(event) = tick.event {
            lock(&feed).apply(&event);
            if let Some(tx) = &subscriber {
                let _ = tx.send(event);
            }
        }
        delay = tick.next_delay;
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Scripted;
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_needs_flag_and_capture() {
        let mut monitor = Monitor::new(Scripted::new(&[]));
        assert_eq!(monitor.state(), MonitorState::Idle);

        monitor.set_active(true).await;
        assert_eq!(monitor.state(), MonitorState::Idle);

        monitor.attach_capture(CaptureStream::open("cam0")).await;
        assert_eq!(monitor.state(), MonitorState::Running);

        let capture = monitor.detach_capture().await;
        assert_eq!(capture.map(|c| c.release()), Some("cam0".to_string()));
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert!(monitor.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_releases_capture() {
        let mut monitor = Monitor::new(Scripted::new(&[]));
        monitor.start(CaptureStream::open("cam0")).await;
        assert_eq!(monitor.capture().map(|c| c.source()), Some("cam0"));

        monitor.stop().await;
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert!(monitor.capture().is_none());
        assert!(!monitor.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_while_running() {
        // 初回待ち0.0 → 2000ms、以降 gate 0.0 / normal / ... を繰り返す
        let mut values = vec![0.0];
        for _ in 0..5 {
            values.extend_from_slice(&[0.0, 0.9, 0.5, 0.5, 0.0]);
        }
        let mut monitor = Monitor::new(Scripted::new(&values));
        monitor.start(CaptureStream::open("cam0")).await;

        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(monitor.stats().items_scanned, 2);

        monitor.reset_stats();
        assert_eq!(monitor.stats(), LiveStats::default());
        assert!(monitor.snapshot().is_empty());
        assert_eq!(monitor.state(), MonitorState::Running);

        monitor.stop().await;
    }
}

//! ライブ監視の状態（直近ログ + 累積統計）

use super::SimulatedEvent;
use defect_inspect_common::{Detection, LiveStats};
use std::collections::VecDeque;

/// 保持する直近イベント数
pub const MAX_LOG_LEN: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct LiveFeed {
    /// 新しい順
    log: VecDeque<Detection>,
    stats: LiveStats,
    processing_ms: f64,
}

impl LiveFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// イベントを先頭に追加して統計を更新
    pub fn apply(&mut self, event: &SimulatedEvent) {
        self.log.push_front(event.detection.clone());
        self.log.truncate(MAX_LOG_LEN);
        self.stats.record(event.detection.is_defect());
        self.processing_ms = event.processing_ms;
    }

    /// ログを消し、統計を初期値（0件・合格率100%）に戻す
    pub fn reset(&mut self) {
        self.log.clear();
        self.stats = LiveStats::default();
    }

    pub fn detections(&self) -> impl Iterator<Item = &Detection> {
        self.log.iter()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn latest(&self) -> Option<&Detection> {
        self.log.front()
    }

    pub fn stats(&self) -> LiveStats {
        self.stats
    }

    /// 直近の疑似処理時間 (ms)
    pub fn processing_ms(&self) -> f64 {
        self.processing_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defect_inspect_common::Severity;

    fn event(id: i64, defect: bool) -> SimulatedEvent {
        let detection = if defect {
            Detection::defect(id, "12:00:00".into(), "scratches", 80.0, Severity::High)
        } else {
            Detection::normal(id, "12:00:00".into(), 95.0)
        };
        SimulatedEvent { detection, processing_ms: 3.0 }
    }

    #[test]
    fn test_newest_first() {
        let mut feed = LiveFeed::new();
        feed.apply(&event(1, false));
        feed.apply(&event(2, true));

        let ids: Vec<i64> = feed.detections().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(feed.latest().map(|d| d.id), Some(2));
    }

    #[test]
    fn test_log_bounded() {
        let mut feed = LiveFeed::new();
        for i in 0..45 {
            feed.apply(&event(i, i % 5 == 0));
            assert!(feed.len() <= MAX_LOG_LEN);
        }
        assert_eq!(feed.len(), MAX_LOG_LEN);
        // 最古は 25
        assert_eq!(feed.detections().last().map(|d| d.id), Some(25));
        // 統計は捨てたイベントも含む
        assert_eq!(feed.stats().items_scanned, 45);
        assert_eq!(feed.stats().defects_found, 9);
        assert_eq!(feed.stats().pass_rate, 80.0);
    }

    #[test]
    fn test_reset() {
        let mut feed = LiveFeed::new();
        feed.apply(&event(1, true));
        feed.reset();

        assert!(feed.is_empty());
        assert_eq!(feed.stats(), LiveStats::default());
    }
}

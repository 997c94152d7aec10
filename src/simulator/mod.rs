//! ライブ監視の疑似検出ジェネレータ
//!
//! 1tick分の処理は純粋関数 [`step`] で表し、乱数源と現在時刻だけに依存する。
//! タイマーでの再スケジュールは [`monitor::Monitor`] が受け持つ。
//!
//! 乱数の消費順（1tickあたり）:
//! 1. 発生判定 (< 0.3 でイベントあり)
//! 2. 欠陥判定 (< 0.2 で defect)
//! 3. defect: クラス選択 → 信頼度 → 重大度 / normal: 信頼度
//! 4. 処理時間
//! 5. 次回までの待ち時間（イベントの有無に関わらず必ず最後）

pub mod feed;
pub mod monitor;

pub use feed::{LiveFeed, MAX_LOG_LEN};
pub use monitor::{CaptureStream, Monitor, MonitorState};

use chrono::{DateTime, Local};
use defect_inspect_common::{Detection, Severity, DEFECT_CLASSES};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;

pub const DETECTION_PROBABILITY: f64 = 0.3;
pub const DEFECT_PROBABILITY: f64 = 0.2;

/// 次tickまでの待ち時間 [MIN, MAX) ミリ秒
pub const MIN_DELAY_MS: f64 = 2000.0;
pub const MAX_DELAY_MS: f64 = 5000.0;

/// [0, 1) の一様乱数源
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl RandomSource for StdRng {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// 発生した疑似イベント
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedEvent {
    pub detection: Detection,
    /// 疑似処理時間 [1, 6) ms
    pub processing_ms: f64,
}

/// 1tickの結果
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub event: Option<SimulatedEvent>,
    pub next_delay: Duration,
}

fn uniform<R: RandomSource + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    rng.next_f64() * (high - low) + low
}

fn severity_from(draw: f64) -> Severity {
    if draw < 0.3 {
        Severity::High
    } else if draw < 0.6 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// 1tick分の乱数を引いてイベントと次回待ち時間を決める
pub fn step<R: RandomSource + ?Sized>(rng: &mut R, now: DateTime<Local>) -> Tick {
    let event = if rng.next_f64() < DETECTION_PROBABILITY {
        Some(generate_event(rng, now))
    } else {
        None
    };

    Tick {
        event,
        next_delay: next_delay(rng),
    }
}

/// 次tickまでの待ち時間
pub fn next_delay<R: RandomSource + ?Sized>(rng: &mut R) -> Duration {
    let ms = uniform(rng, MIN_DELAY_MS, MAX_DELAY_MS);
    Duration::from_nanos((ms * 1_000_000.0).round() as u64)
}

fn generate_event<R: RandomSource + ?Sized>(rng: &mut R, now: DateTime<Local>) -> SimulatedEvent {
    let id = now.timestamp_millis();
    let time = now.format("%H:%M:%S").to_string();

    let detection = if rng.next_f64() < DEFECT_PROBABILITY {
        let idx = ((rng.next_f64() * DEFECT_CLASSES.len() as f64) as usize).min(DEFECT_CLASSES.len() - 1);
        let confidence = uniform(rng, 70.0, 100.0);
        let severity = severity_from(rng.next_f64());
        Detection::defect(id, time, DEFECT_CLASSES[idx], confidence, severity)
    } else {
        Detection::normal(id, time, uniform(rng, 90.0, 100.0))
    };

    SimulatedEvent {
        detection,
        processing_ms: uniform(rng, 1.0, 6.0),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::RandomSource;
    use std::collections::VecDeque;

    /// 決められた値を順に返す乱数源（尽きたら0.99）
    pub struct Scripted(pub VecDeque<f64>);

    impl Scripted {
        pub fn new(values: &[f64]) -> Self {
            Self(values.iter().copied().collect())
        }
    }

    impl RandomSource for Scripted {
        fn next_f64(&mut self) -> f64 {
            self.0.pop_front().unwrap_or(0.99)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Scripted;
    use super::*;
    use defect_inspect_common::DetectionStatus;
    use rand::SeedableRng;

    fn now() -> DateTime<Local> {
        Local::now()
    }

    #[test]
    fn test_gate_blocks_above_threshold() {
        let mut rng = Scripted::new(&[0.35, 0.1, 0.5]);
        let tick = step(&mut rng, now());
        assert!(tick.event.is_none());
        // 2番目の値は待ち時間に使われる: 2000 + 0.1 * 3000
        assert_eq!(tick.next_delay, Duration::from_millis(2300));
        assert_eq!(rng.0.len(), 1);
    }

    #[test]
    fn test_defect_event_draws() {
        // gate, defect, class(0.5 -> idx 3), confidence, severity(0.45 -> medium), processing, delay
        let mut rng = Scripted::new(&[0.1, 0.1, 0.5, 0.5, 0.45, 0.2, 0.0]);
        let tick = step(&mut rng, now());
        let event = tick.event.expect("イベントが発生するはず");

        assert_eq!(event.detection.status, DetectionStatus::Defect);
        assert_eq!(event.detection.kind, "pitted_surface");
        assert_eq!(event.detection.confidence, 85.0);
        assert_eq!(event.detection.severity(), Some(Severity::Medium));
        assert_eq!(event.processing_ms, 2.0);
        assert_eq!(tick.next_delay, Duration::from_millis(2000));
        assert!(rng.0.is_empty());
    }

    #[test]
    fn test_normal_event_draws() {
        // gate, normal(0.5), confidence, processing, delay
        let mut rng = Scripted::new(&[0.29, 0.5, 0.5, 0.0, 0.5]);
        let tick = step(&mut rng, now());
        let event = tick.event.expect("イベントが発生するはず");

        assert_eq!(event.detection.status, DetectionStatus::Normal);
        assert_eq!(event.detection.kind, "Normal");
        assert_eq!(event.detection.confidence, 95.0);
        assert_eq!(event.detection.severity(), None);
        assert_eq!(event.processing_ms, 1.0);
        assert_eq!(tick.next_delay, Duration::from_millis(3500));
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(severity_from(0.0), Severity::High);
        assert_eq!(severity_from(0.299), Severity::High);
        assert_eq!(severity_from(0.3), Severity::Medium);
        assert_eq!(severity_from(0.599), Severity::Medium);
        assert_eq!(severity_from(0.6), Severity::Low);
    }

    #[test]
    fn test_id_and_time_from_clock() {
        let at = Local::now();
        let mut rng = Scripted::new(&[0.0, 0.9, 0.0, 0.0, 0.0]);
        let event = step(&mut rng, at).event.unwrap();
        assert_eq!(event.detection.id, at.timestamp_millis());
        assert_eq!(event.detection.time, at.format("%H:%M:%S").to_string());
    }

    #[test]
    fn test_seeded_ranges_hold() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let tick = step(&mut rng, now());
            assert!(tick.next_delay >= Duration::from_millis(2000));
            assert!(tick.next_delay < Duration::from_millis(5000));

            if let Some(ev) = tick.event {
                let d = &ev.detection;
                assert_eq!(d.severity().is_some(), d.is_defect());
                assert!((1.0..6.0).contains(&ev.processing_ms));
                if d.is_defect() {
                    assert!((70.0..100.0).contains(&d.confidence));
                    assert!(DEFECT_CLASSES.contains(&d.kind.as_str()));
                } else {
                    assert!((90.0..100.0).contains(&d.confidence));
                }
            }
        }
    }
}

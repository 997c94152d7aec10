//! 検査結果の型定義
//!
//! CLIとシミュレータで共有される型:
//! - DetectionResult / PredictionResponse: 推論バックエンド（/predict）のレスポンス
//! - HealthStatus / ModelInfo / BatchResponse: その他エンドポイントのレスポンス
//! - Detection / LiveStats: ライブ監視（疑似フィード）のイベントと統計

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// モデルが認識する欠陥クラス（NEU-DET）
pub const DEFECT_CLASSES: [&str; 6] = [
    "crazing",
    "inclusion",
    "patches",
    "pitted_surface",
    "rolled-in_scale",
    "scratches",
];

/// 欠陥の重大度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// 推奨処置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Accept,
    Review,
    Reject,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Accept => "Accept",
            Action::Review => "Review",
            Action::Reject => "Reject",
        };
        f.pad(s)
    }
}

/// 画像1枚から検出された欠陥
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub id: u32,

    #[serde(rename = "type")]
    pub kind: String,             // 欠陥クラス

    pub confidence: f64,          // 0-100 (%)

    pub area: String,             // バックエンド定義の文字列

    pub severity: Severity,

    pub action: Action,

    pub bbox: [f64; 4],           // バックエンド定義の座標
}

/// /predict のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub success: bool,

    /// バックエンドの返却順のまま（ソートしない）
    #[serde(default)]
    pub detections: Vec<DetectionResult>,

    #[serde(default)]
    pub total_defects: u32,

    /// 注釈付き画像（base64）
    #[serde(default)]
    pub image_base64: String,

    /// 画像のMIMEタイプ（例: image/jpeg）
    #[serde(default)]
    pub image_type: String,
}

impl PredictionResponse {
    /// total_defects と検出件数が一致しているか
    pub fn is_consistent(&self) -> bool {
        self.total_defects as usize == self.detections.len()
    }
}

/// /health のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
}

/// /model-info のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_loaded: bool,
    #[serde(default)]
    pub defect_classes: Vec<String>,
    #[serde(default)]
    pub num_classes: u32,
    #[serde(default)]
    pub model_path: String,
}

/// /batch-predict のレスポンス
///
/// 各要素の形はバックエンド依存のため `Value` のまま保持する。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub results: Vec<Value>,
}

/// バッチ結果1件分の簡易ビュー
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatchItem {
    pub filename: String,
    pub detections: Vec<BatchDetection>,
    pub total_defects: u32,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatchDetection {
    #[serde(rename = "type")]
    pub kind: String,
    pub confidence: f64,
    pub bbox: Vec<f64>,
}

impl BatchItem {
    /// 解釈できない要素は None
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

impl BatchResponse {
    pub fn items(&self) -> Vec<BatchItem> {
        self.results.iter().filter_map(BatchItem::from_value).collect()
    }
}

/// /test-images の一覧要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTestImage {
    pub filename: String,
    #[serde(default)]
    pub defect_type: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteTestImageList {
    #[serde(default)]
    pub images: Vec<RemoteTestImage>,
}

/// ライブ監視イベントの判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionStatus {
    Defect,
    Normal,
}

/// ライブ監視の疑似検出イベント
///
/// `severity` は `status == Defect` のときだけ Some。
/// 生成は [`Detection::defect`] / [`Detection::normal`] 経由に限る。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: i64,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: DetectionStatus,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
}

/// 正常品イベントの type
pub const NORMAL_LABEL: &str = "Normal";

impl Detection {
    pub fn defect(id: i64, time: String, kind: impl Into<String>, confidence: f64, severity: Severity) -> Self {
        Self {
            id,
            time,
            kind: kind.into(),
            status: DetectionStatus::Defect,
            confidence,
            severity: Some(severity),
        }
    }

    pub fn normal(id: i64, time: String, confidence: f64) -> Self {
        Self {
            id,
            time,
            kind: NORMAL_LABEL.to_string(),
            status: DetectionStatus::Normal,
            confidence,
            severity: None,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity
    }

    pub fn is_defect(&self) -> bool {
        self.status == DetectionStatus::Defect
    }
}

/// ライブ監視の累積統計
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub items_scanned: u64,
    pub defects_found: u64,
    pub pass_rate: f64,
}

impl Default for LiveStats {
    fn default() -> Self {
        Self {
            items_scanned: 0,
            defects_found: 0,
            pass_rate: 100.0,
        }
    }
}

impl LiveStats {
    /// 1件を集計に加える
    pub fn record(&mut self, is_defect: bool) {
        self.items_scanned += 1;
        if is_defect {
            self.defects_found += 1;
        }
        self.pass_rate = pass_rate(self.items_scanned, self.defects_found);
    }
}

/// 合格率（%、小数1桁に丸め）。未検査なら100
pub fn pass_rate(items_scanned: u64, defects_found: u64) -> f64 {
    if items_scanned == 0 {
        return 100.0;
    }
    let passed = items_scanned.saturating_sub(defects_found) as f64;
    let rate = passed / items_scanned as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

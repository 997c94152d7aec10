//! Defect Inspect Common Library
//!
//! 推論クライアントとライブ監視シミュレータで共有される型とユーティリティ

pub mod types;
pub mod view;
pub mod catalog;
pub mod error;

pub use types::{
    Action, BatchDetection, BatchItem, BatchResponse, Detection, DetectionResult,
    DetectionStatus, HealthStatus, LiveStats, ModelInfo, PredictionResponse,
    RemoteTestImage, RemoteTestImageList, Severity, DEFECT_CLASSES, NORMAL_LABEL,
    pass_rate,
};
pub use view::View;
pub use catalog::{ImageCategory, TestImage, TEST_IMAGES};
pub use error::{Error, Result};

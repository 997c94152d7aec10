//! 解析結果の保存と集計

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use defect_inspect_common::{Action, DetectionResult, PredictionResponse, Severity};
use std::path::{Path, PathBuf};

/// レスポンスをJSONで保存
pub fn write_json(path: &Path, response: &PredictionResponse) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(response)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// MIMEタイプから拡張子
pub fn extension_for(image_type: &str) -> &'static str {
    let subtype = image_type.rsplit('/').next().unwrap_or(image_type);
    match subtype.to_lowercase().as_str() {
        "jpeg" | "jpg" | "pjpeg" => "jpg",
        "png" => "png",
        "webp" => "webp",
        "bmp" => "bmp",
        "gif" => "gif",
        _ => "bin",
    }
}

/// 画像データをデコードして保存し、書き込んだパスを返す
///
/// `path` に拡張子がなければ `image_type` から補う。
pub fn save_annotated_image(response: &PredictionResponse, path: &Path) -> Result<PathBuf> {
    let bytes = STANDARD.decode(response.image_base64.trim())?;

    let target = if path.extension().is_none() {
        path.with_extension(extension_for(&response.image_type))
    } else {
        path.to_path_buf()
    };

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, bytes)?;
    Ok(target)
}

/// 重大度・推奨処置ごとの件数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub accept: usize,
    pub review: usize,
    pub reject: usize,
}

pub fn summarize(detections: &[DetectionResult]) -> Summary {
    let mut s = Summary {
        total: detections.len(),
        ..Default::default()
    };
    for d in detections {
        match d.severity {
            Severity::High => s.high += 1,
            Severity::Medium => s.medium += 1,
            Severity::Low => s.low += 1,
        }
        match d.action {
            Action::Accept => s.accept += 1,
            Action::Review => s.review += 1,
            Action::Reject => s.reject += 1,
        }
    }
    s
}

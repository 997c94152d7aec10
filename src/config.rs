use crate::error::{InspectError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// ベースURLを上書きする環境変数
pub const API_URL_ENV: &str = "DEFECT_API_URL";

/// バックエンドが1リクエストで受け付ける最大ファイル数
pub const MAX_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub default_batch_size: usize,
    pub save_annotated: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            default_batch_size: MAX_BATCH_SIZE,
            save_annotated: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| InspectError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("defect-inspect").join("config.json"))
    }

    /// ベースURLを解決する（起動時に1回だけ呼ぶ）
    ///
    /// 優先順位: コマンドライン > 環境変数 > 設定ファイル > 既定値
    pub fn resolve_base_url(&self, flag: Option<&str>) -> Result<String> {
        let env = std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty());
        let raw = flag
            .map(str::to_string)
            .or(env)
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        normalize_base_url(&raw)
    }

    pub fn set_api_base_url(&mut self, url: &str) -> Result<()> {
        self.api_base_url = Some(normalize_base_url(url)?);
        Ok(())
    }

    pub fn set_batch_size(&mut self, size: usize) -> Result<()> {
        if size == 0 || size > MAX_BATCH_SIZE {
            return Err(InspectError::Config(format!(
                "バッチサイズは1〜{}で指定してください: {}",
                MAX_BATCH_SIZE, size
            )));
        }
        self.default_batch_size = size;
        Ok(())
    }

    /// 1〜MAX_BATCH_SIZE に丸めたバッチサイズ
    pub fn batch_size(&self) -> usize {
        self.default_batch_size.clamp(1, MAX_BATCH_SIZE)
    }
}

/// http/https のURLか検証し、末尾のスラッシュを除く
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| InspectError::Config(format!("URLが不正です: {} ({})", trimmed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(InspectError::Config(format!("http/https のURLを指定してください: {}", trimmed)));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

//! 画面（ビュー）識別子
//!
//! 文字列での画面切替をやめ、閉じた列挙型で表現する。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Home,
    Dashboard,
    Detection,
    Monitoring,
    Analytics,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Home,
        View::Dashboard,
        View::Detection,
        View::Monitoring,
        View::Analytics,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            View::Home => "home",
            View::Dashboard => "dashboard",
            View::Detection => "detection",
            View::Monitoring => "monitoring",
            View::Analytics => "analytics",
        }
    }

    /// 画面タイトル
    pub fn title(&self) -> &'static str {
        match self {
            View::Home => "ホーム",
            View::Dashboard => "ダッシュボード",
            View::Detection => "欠陥検出",
            View::Monitoring => "ライブ監視",
            View::Analytics => "分析",
        }
    }
}

impl std::str::FromStr for View {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        View::ALL
            .into_iter()
            .find(|v| v.key() == key)
            .ok_or_else(|| Error::UnknownView(s.to_string()))
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

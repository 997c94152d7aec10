use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが選択されていません")]
    NoFileSelected,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("未対応のメディア形式です（画像または動画のみ）: {0}")]
    UnsupportedMedia(String),

    #[error("テスト画像名が不正: {0}")]
    InvalidTestImageName(String),

    #[error("バッチが大きすぎます: {count}件（上限{max}件）")]
    BatchTooLarge { count: usize, max: usize },

    /// バックエンドが非2xxを返した。メッセージはそのまま表示する
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("通信エラー: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("画像デコードエラー: {0}")]
    ImageDecode(#[from] base64::DecodeError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] defect_inspect_common::Error),
}

impl InspectError {
    /// HTTPステータス（バックエンド起因の場合のみ）
    pub fn status(&self) -> Option<u16> {
        match self {
            InspectError::Backend { status, .. } => Some(*status),
            InspectError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, InspectError>;

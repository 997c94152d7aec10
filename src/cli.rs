use clap::{Parser, Subcommand};
use defect_inspect_common::{ImageCategory, View};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "defect-inspect")]
#[command(about = "外観検査AIバックエンド用クライアント・ライブ監視シミュレータ", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 推論バックエンドのベースURL（環境変数・設定ファイルより優先）
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// バックエンドの稼働状況を確認
    Health,

    /// 読み込まれているモデルの情報を表示
    ModelInfo,

    /// 画像/動画1件を解析
    Detect {
        /// 解析するファイル
        file: Option<PathBuf>,

        /// 結果JSONの保存先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 注釈付き画像の保存先（拡張子省略可）
        #[arg(short, long)]
        annotated: Option<PathBuf>,
    },

    /// フォルダ内の画像を一括解析
    Batch {
        /// 画像フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 1リクエストあたりの枚数（1〜10、省略時は設定値）
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// 結果JSONの保存先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 評価用テスト画像の一覧・取得
    TestImages {
        /// 欠陥クラスで絞り込み（all で全件）
        #[arg(short, long, default_value = "all")]
        defect_type: String,

        /// 区分で絞り込み (defect/normal)
        #[arg(short, long)]
        category: Option<ImageCategory>,

        /// バックエンド側の一覧を取得
        #[arg(long)]
        remote: bool,

        /// 指定ファイルをダウンロード
        #[arg(long)]
        fetch: Option<String>,

        /// カタログからランダムに1枚選んでダウンロード
        #[arg(long, conflicts_with = "fetch")]
        random: bool,

        /// ダウンロード先フォルダ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ダウンロード後そのまま解析
        #[arg(long)]
        analyze: bool,
    },

    /// 疑似カメラでライブ監視を実行
    Monitor {
        /// 監視時間（秒、省略時はCtrl-Cまで）
        #[arg(short, long)]
        duration: Option<u64>,

        /// 乱数シード（再現用）
        #[arg(long)]
        seed: Option<u64>,

        /// キャプチャソース名
        #[arg(long, default_value = "camera0")]
        source: String,
    },

    /// 設定を表示/編集
    Config {
        /// ベースURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 既定のバッチサイズを設定
        #[arg(long)]
        set_batch_size: Option<usize>,

        /// 注釈付き画像を既定で保存する
        #[arg(long)]
        save_annotated: Option<bool>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

impl Commands {
    /// コマンドに対応する画面
    pub fn view(&self) -> View {
        match self {
            Commands::Health | Commands::ModelInfo => View::Dashboard,
            Commands::Detect { .. } | Commands::Batch { .. } | Commands::TestImages { .. } => View::Detection,
            Commands::Monitor { .. } => View::Monitoring,
            Commands::Config { .. } => View::Home,
        }
    }
}

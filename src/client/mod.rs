//! 推論バックエンドのHTTPクライアント
//!
//! 1操作 = 1リクエスト。リトライ・タイムアウト上書き・キャンセルは行わない。
//! 必要なら呼び出し側でラップする。

mod error_body;

pub use error_body::{backend_message, FALLBACK_UNKNOWN};

use crate::config::Config;
use crate::error::{InspectError, Result};
use crate::scanner::MediaFile;
use defect_inspect_common::{
    BatchResponse, HealthStatus, ModelInfo, PredictionResponse, RemoteTestImage,
    RemoteTestImageList,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

const HEALTH_PATH: &str = "/health";
const MODEL_INFO_PATH: &str = "/model-info";
const PREDICT_PATH: &str = "/predict";
const BATCH_PREDICT_PATH: &str = "/batch-predict";
const TEST_IMAGES_PATH: &str = "/test-images";

#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
    verbose: bool,
}

impl InferenceClient {
    /// `base_url` は検証済み（末尾スラッシュなし）を想定
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            verbose: false,
        }
    }

    pub fn from_config(config: &Config, api_url_flag: Option<&str>) -> Result<Self> {
        Ok(Self::new(config.resolve_base_url(api_url_flag)?))
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn log(&self, method: &str, url: &str, status: StatusCode) {
        if self.verbose {
            println!("  {} {} -> {}", method, url, status);
        }
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        let response = self.http.get(&url).send().await?;
        self.log("GET", &url, response.status());
        Ok(response)
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<Response> {
        let url = self.url(path);
        let response = self.http.post(&url).multipart(form).send().await?;
        self.log("POST", &url, response.status());
        Ok(response)
    }

    /// ステータスのみで失敗を判定する（エラーボディは見ない）
    async fn read_json<T: DeserializeOwned>(response: Response, failure: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(InspectError::Backend {
                status: status.as_u16(),
                message: failure.to_string(),
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// 失敗時はエラーボディの `detail` をメッセージにする
    async fn read_json_with_detail<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(InspectError::Backend {
                status: status.as_u16(),
                message: backend_message(&body, fallback),
            });
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn health_check(&self) -> Result<HealthStatus> {
        let response = self.get(HEALTH_PATH).await?;
        Self::read_json(response, "Health check failed").await
    }

    pub async fn model_info(&self) -> Result<ModelInfo> {
        let response = self.get(MODEL_INFO_PATH).await?;
        Self::read_json(response, "Failed to get model info").await
    }

    /// 1ファイルを `file` フィールドで送信して欠陥を推論
    pub async fn predict_defects(&self, file: &MediaFile) -> Result<PredictionResponse> {
        let form = Form::new().part("file", media_part(file)?);
        let response = self.post_form(PREDICT_PATH, form).await?;
        Self::read_json_with_detail(response, "Prediction failed").await
    }

    /// 複数ファイルを `files` フィールドの繰り返しで送信
    pub async fn batch_predict(&self, files: &[MediaFile]) -> Result<BatchResponse> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files", media_part(file)?);
        }
        let response = self.post_form(BATCH_PREDICT_PATH, form).await?;
        Self::read_json_with_detail(response, "Batch prediction failed").await
    }

    pub async fn list_test_images(&self) -> Result<Vec<RemoteTestImage>> {
        let response = self.get(TEST_IMAGES_PATH).await?;
        let list: RemoteTestImageList = Self::read_json(response, "Failed to list test images").await?;
        Ok(list.images)
    }

    pub fn test_image_url(&self, filename: &str) -> String {
        self.url(&format!("{}/{}", TEST_IMAGES_PATH, filename))
    }

    /// テスト画像をダウンロード
    pub async fn fetch_test_image(&self, filename: &str) -> Result<Vec<u8>> {
        validate_test_image_name(filename)?;

        let response = self.get(&format!("{}/{}", TEST_IMAGES_PATH, filename)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InspectError::Backend {
                status: status.as_u16(),
                message: "Failed to load test image".to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn media_part(file: &MediaFile) -> Result<Part> {
    let part = Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.mime_type)?;
    Ok(part)
}

/// バックエンドと同じ規則: `.jpg` で終わり、`..` と `/` を含まない
pub fn validate_test_image_name(filename: &str) -> Result<()> {
    if !filename.ends_with(".jpg") || filename.contains("..") || filename.contains('/') {
        return Err(InspectError::InvalidTestImageName(filename.to_string()));
    }
    Ok(())
}

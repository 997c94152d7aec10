//! 非2xxレスポンスのエラーボディ解釈

use serde_json::Value;

/// ボディがJSONとして読めなかった場合のメッセージ
pub const FALLBACK_UNKNOWN: &str = "Unknown error";

/// エラーボディから表示用メッセージを取り出す
///
/// - `detail` が文字列ならそのまま
/// - `detail` がそれ以外の値（FastAPIの検証エラー配列など）ならJSON文字列
/// - `detail` がない / null なら `fallback`
/// - JSONでなければ [`FALLBACK_UNKNOWN`]
pub fn backend_message(body: &[u8], fallback: &str) -> String {
    let parsed: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => return FALLBACK_UNKNOWN.to_string(),
    };

    match parsed.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::String(_)) | Some(Value::Null) | None => fallback.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string() {
        assert_eq!(backend_message(br#"{"detail":"model not loaded"}"#, "x"), "model not loaded");
    }

    #[test]
    fn test_unparseable_body() {
        assert_eq!(backend_message(b"<html>502 Bad Gateway</html>", "Prediction failed"), FALLBACK_UNKNOWN);
        assert_eq!(backend_message(b"", "Prediction failed"), FALLBACK_UNKNOWN);
    }

    #[test]
    fn test_missing_detail() {
        assert_eq!(backend_message(br#"{"error":"boom"}"#, "Prediction failed"), "Prediction failed");
        assert_eq!(backend_message(br#"{"detail":null}"#, "Prediction failed"), "Prediction failed");
        assert_eq!(backend_message(br#"{"detail":""}"#, "Prediction failed"), "Prediction failed");
    }

    #[test]
    fn test_structured_detail() {
        let msg = backend_message(br#"{"detail":[{"loc":["body","file"],"msg":"field required"}]}"#, "x");
        assert!(msg.contains("field required"));
    }
}

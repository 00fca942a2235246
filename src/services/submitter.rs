//! 结果提交服务 - 业务能力层
//!
//! 只负责"构建提交内容并交给持久化方"能力，不关心流程。
//! 失败时直接返回错误，由调用方决定是否手动重试，不做自动退避。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::SubmissionError;
use crate::models::{
    Answer, AnswerRecord, ClassificationResult, SubmissionPayload, SubmissionReceipt,
};

/// 计算准确率（四舍五入到整数百分比），总数为 0 时返回 0
pub fn accuracy(correct_plates: u32, total_plates: u32) -> u32 {
    if total_plates == 0 {
        return 0;
    }
    (f64::from(correct_plates) * 100.0 / f64::from(total_plates)).round() as u32
}

/// 构建提交内容
///
/// # 参数
/// - `answers`: 最终作答列表
/// - `results`: 分类结果
/// - `diagnosis`: 诊断文字
/// - `test_date`: 测试时间
pub fn build_payload(
    answers: &[Answer],
    results: &[ClassificationResult],
    diagnosis: &str,
    test_date: DateTime<Utc>,
) -> SubmissionPayload {
    let correct_plates = results.iter().filter(|r| r.is_correct).count() as u32;
    let total_plates = results.len() as u32;

    SubmissionPayload {
        answers: answers
            .iter()
            .map(|a| AnswerRecord {
                plate_number: a.plate.plate_number,
                user_answer: a.user_answer.clone(),
            })
            .collect(),
        correct_plates,
        total_plates,
        accuracy: accuracy(correct_plates, total_plates),
        test_result: diagnosis.to_string(),
        plate_results: results.to_vec(),
        test_date,
    }
}

/// 持久化方
///
/// 以幂等键去重：同一个键重复提交只会保存一次。
#[allow(async_fn_in_trait)]
pub trait ResultSink {
    async fn persist(
        &self,
        payload: &SubmissionPayload,
        idempotency_key: &str,
        bearer_token: Option<&str>,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

/// 通过 HTTP 提交到结果服务
pub struct HttpResultSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpResultSink {
    /// 创建新的 HTTP 提交服务
    ///
    /// `base_url` 例如 `https://clinic.example.com`
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// 使用指定的 HTTP 客户端
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/api/color-vision/results",
                base_url.trim_end_matches('/')
            ),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 从响应中提取记录 ID（兼容 `_id` / `id` / `data._id`）
    fn extract_record_id(body: &JsonValue) -> Option<String> {
        let candidates = [
            body.get("_id"),
            body.get("id"),
            body.get("data").and_then(|d| d.get("_id")),
            body.get("data").and_then(|d| d.get("id")),
        ];
        candidates.into_iter().flatten().find_map(|v| match v {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

impl ResultSink for HttpResultSink {
    async fn persist(
        &self,
        payload: &SubmissionPayload,
        idempotency_key: &str,
        bearer_token: Option<&str>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        debug!("提交测试结果: {} (幂等键: {})", self.endpoint, idempotency_key);

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Idempotency-Key", idempotency_key)
            .json(payload);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| SubmissionError::RequestFailed {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        // 409 表示同一幂等键已保存过
        if status == reqwest::StatusCode::CONFLICT {
            warn!("⚠️ 结果已存在 (幂等键: {})", idempotency_key);
            return Ok(SubmissionReceipt {
                idempotency_key: idempotency_key.to_string(),
                record_id: None,
                duplicate: true,
            });
        }

        let body: JsonValue = response.json().await.unwrap_or(JsonValue::Null);

        if !status.is_success() {
            return Err(SubmissionError::BadResponse {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                message: body
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
            });
        }

        let record_id = Self::extract_record_id(&body);
        info!("✓ 测试结果提交成功 (记录: {:?})", record_id);

        Ok(SubmissionReceipt {
            idempotency_key: idempotency_key.to_string(),
            record_id,
            duplicate: false,
        })
    }
}

/// 结果文件中的一行
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSubmission {
    idempotency_key: String,
    payload: SubmissionPayload,
}

/// 写入本地结果文件
///
/// 每次提交追加一行 JSON；已存在的幂等键不会重复写入。
pub struct FileResultSink {
    path: PathBuf,
}

impl FileResultSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn write_failed(&self, source: std::io::Error) -> SubmissionError {
        SubmissionError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// 文件中是否已有该幂等键
    async fn contains_key(&self, idempotency_key: &str) -> Result<bool, SubmissionError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(self.write_failed(e)),
        };

        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str::<StoredSubmission>(line).ok())
            .any(|stored| stored.idempotency_key == idempotency_key))
    }
}

impl ResultSink for FileResultSink {
    async fn persist(
        &self,
        payload: &SubmissionPayload,
        idempotency_key: &str,
        _bearer_token: Option<&str>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        if self.contains_key(idempotency_key).await? {
            warn!(
                "⚠️ 结果文件中已有该测试 (幂等键: {})，跳过写入",
                idempotency_key
            );
            return Ok(SubmissionReceipt {
                idempotency_key: idempotency_key.to_string(),
                record_id: None,
                duplicate: true,
            });
        }

        let stored = StoredSubmission {
            idempotency_key: idempotency_key.to_string(),
            payload: payload.clone(),
        };
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.write_failed(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.write_failed(e))?;
        file.flush().await.map_err(|e| self.write_failed(e))?;

        info!("✓ 测试结果已写入: {}", self.path.display());

        Ok(SubmissionReceipt {
            idempotency_key: idempotency_key.to_string(),
            record_id: None,
            duplicate: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Evaluation, ExpectedAnswers, Plate};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn answer(plate_number: u32, text: &str) -> Answer {
        Answer::new(
            Plate {
                plate_number,
                question: "What number do you see?".to_string(),
                answers: ExpectedAnswers {
                    normal: "12".to_string(),
                    protanopia: "12".to_string(),
                    deuteranopia: "12".to_string(),
                    protanomaly: None,
                    deuteranomaly: None,
                    total_color_blindness: None,
                },
                image: String::new(),
            },
            text,
        )
    }

    fn sample_payload() -> SubmissionPayload {
        let answers = vec![answer(1, "12"), answer(2, "3"), answer(3, "5")];
        let results = vec![
            ClassificationResult::new(&answers[0], Evaluation::Normal, "ok"),
            ClassificationResult::new(&answers[1], Evaluation::Protanopia, "red"),
            ClassificationResult::new(&answers[2], Evaluation::Normal, "ok"),
        ];
        build_payload(&answers, &results, "Severe Protanopia (Red-Blind)", Utc::now())
    }

    #[test]
    fn test_accuracy_rounding() {
        assert_eq!(accuracy(2, 3), 67);
        assert_eq!(accuracy(1, 3), 33);
        assert_eq!(accuracy(1, 8), 13); // 12.5 四舍五入
        assert_eq!(accuracy(10, 10), 100);
        assert_eq!(accuracy(0, 10), 0);
        assert_eq!(accuracy(0, 0), 0);
    }

    #[test]
    fn test_accuracy_matches_formula() {
        for total in 1..=40u32 {
            for correct in 0..=total {
                let expected = ((100 * correct) as f64 / total as f64).round() as u32;
                assert_eq!(accuracy(correct, total), expected);
            }
        }
    }

    #[test]
    fn test_build_payload() {
        let payload = sample_payload();
        assert_eq!(payload.correct_plates, 2);
        assert_eq!(payload.total_plates, 3);
        assert_eq!(payload.accuracy, 67);
        assert_eq!(payload.answers[1].user_answer, "3");
        assert_eq!(payload.test_result, "Severe Protanopia (Red-Blind)");
        assert_eq!(payload.plate_results.len(), 3);
    }

    #[test]
    fn test_http_endpoint() {
        let sink = HttpResultSink::new("https://clinic.example.com/");
        assert_eq!(
            sink.endpoint(),
            "https://clinic.example.com/api/color-vision/results"
        );
    }

    #[test]
    fn test_extract_record_id() {
        let body = serde_json::json!({"data": {"_id": "65f0c2"}});
        assert_eq!(
            HttpResultSink::extract_record_id(&body),
            Some("65f0c2".to_string())
        );
        assert_eq!(HttpResultSink::extract_record_id(&JsonValue::Null), None);
    }

    /// 只应答一次的本地 HTTP 服务
    ///
    /// 返回服务地址和一个任务句柄，句柄结束时给出收到的完整请求（小写）。
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];

            // 读完请求头，再按 content-length 读完请求体
            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
                    let content_length = headers
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;

            String::from_utf8_lossy(&request).to_lowercase()
        });

        (format!("http://{}", addr), handle)
    }

    fn local_sink(base_url: &str) -> HttpResultSink {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpResultSink::with_client(base_url, client)
    }

    #[tokio::test]
    async fn test_http_sink_forwards_token_and_key() {
        let (base_url, server) = serve_once("201 Created", r#"{"_id": "rec-9"}"#).await;
        let sink = local_sink(&base_url);

        let receipt = sink
            .persist(&sample_payload(), "key-42", Some("jwt-token"))
            .await
            .unwrap();
        assert_eq!(receipt.idempotency_key, "key-42");
        assert_eq!(receipt.record_id.as_deref(), Some("rec-9"));
        assert!(!receipt.duplicate);

        let request = server.await.unwrap();
        assert!(request.starts_with("post /api/color-vision/results "));
        assert!(request.contains("idempotency-key: key-42"));
        assert!(request.contains("authorization: bearer jwt-token"));
        assert!(request.contains("\"testresult\":\"severe protanopia (red-blind)\""));
    }

    #[tokio::test]
    async fn test_http_sink_without_token_sends_no_authorization() {
        let (base_url, server) = serve_once("200 OK", "{}").await;
        let sink = local_sink(&base_url);

        let receipt = sink.persist(&sample_payload(), "key-1", None).await.unwrap();
        assert_eq!(receipt.record_id, None);

        let request = server.await.unwrap();
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn test_http_sink_conflict_is_duplicate() {
        let (base_url, server) =
            serve_once("409 Conflict", r#"{"message": "already stored"}"#).await;
        let sink = local_sink(&base_url);

        let receipt = sink
            .persist(&sample_payload(), "key-7", Some("jwt"))
            .await
            .unwrap();
        assert!(receipt.duplicate);
        assert_eq!(receipt.idempotency_key, "key-7");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_sink_error_status_is_bad_response() {
        let (base_url, server) =
            serve_once("503 Service Unavailable", r#"{"message": "maintenance"}"#).await;
        let sink = local_sink(&base_url);

        let err = sink
            .persist(&sample_payload(), "key-1", Some("jwt"))
            .await
            .unwrap_err();
        match err {
            SubmissionError::BadResponse {
                ref endpoint,
                status,
                ref message,
            } => {
                assert_eq!(endpoint, sink.endpoint());
                assert_eq!(status, 503);
                assert_eq!(message.as_deref(), Some("maintenance"));
            }
            ref other => panic!("unexpected error: {:?}", other),
        }
        assert!(crate::error::AppError::from(err).is_retryable());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_file_sink_deduplicates_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileResultSink::new(dir.path().join("results.jsonl"));
        let payload = sample_payload();

        let first = sink.persist(&payload, "key-1", None).await.unwrap();
        assert!(!first.duplicate);

        let retry = sink.persist(&payload, "key-1", None).await.unwrap();
        assert!(retry.duplicate);

        let other = sink.persist(&payload, "key-2", None).await.unwrap();
        assert!(!other.duplicate);

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_file_sink_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // 路径是目录，无法写入
        let sink = FileResultSink::new(dir.path());
        let err = sink
            .persist(&sample_payload(), "key", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::WriteFailed { .. }));
    }
}

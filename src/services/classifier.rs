//! 答案分类服务 - 业务能力层
//!
//! 把整场测试的所有作答打包成一次 LLM 请求，并解析返回的 JSON 数组。
//!
//! - 批次级失败（网络、空响应、非 JSON、非数组）直接返回错误，不计分
//! - 单张色板缺失或条目不可用时，用 `Incorrect` 兜底，不影响其他色板

use regex::Regex;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::{AppResult, ClassificationError};
use crate::models::{Answer, ClassificationResult, Evaluation};
use crate::utils::logging::truncate_text;

/// 文本生成模型
///
/// 测试中可替换为固定返回的桩实现。
#[allow(async_fn_in_trait)]
pub trait TextOracle {
    /// 发送 system / user 消息，返回模型的原始文本
    async fn complete(&self, system: &str, user: &str) -> Result<String, ClassificationError>;

    /// 模型名称（用于日志）
    fn name(&self) -> &str;
}

/// 答案分类器
#[allow(async_fn_in_trait)]
pub trait Classifier {
    /// 对整批作答分类，结果与输入一一对应、顺序一致
    async fn classify(&self, batch: &[Answer]) -> AppResult<Vec<ClassificationResult>>;
}

const SYSTEM_MESSAGE: &str = "You are an ophthalmology assistant that grades Ishihara color-vision \
plate answers. You compare each patient answer with the expected answers for every vision \
category and respond with JSON only.";

/// 基于 LLM 的分类器
pub struct LlmClassifier<O> {
    oracle: O,
}

impl<O: TextOracle> LlmClassifier<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}

impl<O: TextOracle> Classifier for LlmClassifier<O> {
    async fn classify(&self, batch: &[Answer]) -> AppResult<Vec<ClassificationResult>> {
        if batch.is_empty() {
            return Err(ClassificationError::EmptyBatch.into());
        }

        info!(
            "🤖 正在使用 {} 分类 {} 个答案...",
            self.oracle.name(),
            batch.len()
        );

        let user_message = build_prompt(batch);
        let response = self.oracle.complete(SYSTEM_MESSAGE, &user_message).await?;

        debug!("LLM 原始响应: {}", truncate_text(&response, 500));

        let results = parse_response(&response, batch)?;

        info!("✓ 分类完成，共 {} 条结果", results.len());
        Ok(results)
    }
}

/// 构建分类提示词
///
/// 每张色板包含编号、问题、用户答案和该色板上存在的各类别期望答案。
pub fn build_prompt(batch: &[Answer]) -> String {
    let plates: Vec<JsonValue> = batch
        .iter()
        .map(|answer| {
            let expected: serde_json::Map<String, JsonValue> = answer
                .plate
                .answers
                .iter()
                .map(|(category, text)| (category.to_string(), json!(text)))
                .collect();

            json!({
                "plateNumber": answer.plate.plate_number,
                "question": answer.plate.question,
                "userAnswer": answer.user_answer,
                "expectedAnswers": expected,
            })
        })
        .collect();

    let plates_json = serde_json::to_string_pretty(&plates).unwrap_or_default();

    format!(
        r#"A patient has just finished an Ishihara color-vision test. For every plate below, decide which vision category the patient's answer matches.

Plates (with the expected answer for each vision category):
{}

Rules:
- Compare the userAnswer with the expectedAnswers of that plate. Ignore case, spacing and spelled-out numbers ("twelve" equals "12").
- "nothing" or "I can't see anything" matches an expected answer of "nothing".
- If the answer matches the normal answer, the evaluation is "Normal".
- If it matches the protanopia answer (and not the normal one), the evaluation is "Protanopia".
- If it matches the deuteranopia answer (and not the normal one), the evaluation is "Deuteranopia".
- When several categories expect the same answer, prefer them in this order: Normal, Protanopia, Deuteranopia.
- Otherwise the evaluation is "Incorrect".

Respond with a JSON array only, one object per plate, with exactly these keys:
[{{"plateNumber": <integer>, "evaluation": "Normal" | "Protanopia" | "Deuteranopia" | "Incorrect", "reasoning": "<one short sentence>"}}]"#,
        plates_json
    )
}

/// 去除 Markdown 代码块标记
pub fn strip_code_fences(response: &str) -> &str {
    if let Ok(re) = Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```") {
        if let Some(inner) = re.captures(response).and_then(|caps| caps.get(1)) {
            return inner.as_str();
        }
    }

    // 只有开头或只有结尾的代码块标记
    let mut body = response.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    }
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// 解析 LLM 响应
///
/// 返回的结果与 `batch` 一一对应；缺失或无法使用的条目用兜底结果填充。
pub fn parse_response(
    response: &str,
    batch: &[Answer],
) -> Result<Vec<ClassificationResult>, ClassificationError> {
    let body = strip_code_fences(response);

    let value: JsonValue =
        serde_json::from_str(body).map_err(|source| ClassificationError::MalformedResponse {
            response: truncate_text(response, 200),
            source,
        })?;

    let entries = value
        .as_array()
        .ok_or_else(|| ClassificationError::NotAnArray {
            response: truncate_text(response, 200),
        })?;

    let mut by_plate: HashMap<u32, (Evaluation, String)> = HashMap::new();
    for entry in entries {
        match parse_entry(entry) {
            Some((plate_number, evaluation, reasoning)) => {
                by_plate
                    .entry(plate_number)
                    .or_insert((evaluation, reasoning));
            }
            None => warn!("⚠️ 忽略无法解析的分类条目: {}", entry),
        }
    }

    let results = batch
        .iter()
        .map(|answer| match by_plate.remove(&answer.plate.plate_number) {
            Some((evaluation, reasoning)) => ClassificationResult::new(answer, evaluation, reasoning),
            None => {
                warn!(
                    "⚠️ 色板 {} 没有可用的分类结果，按 Incorrect 处理",
                    answer.plate.plate_number
                );
                ClassificationResult::fallback(answer)
            }
        })
        .collect();

    Ok(results)
}

/// 解析单个条目：(plateNumber, evaluation, reasoning)
fn parse_entry(entry: &JsonValue) -> Option<(u32, Evaluation, String)> {
    let plate_number = match entry.get("plateNumber")? {
        JsonValue::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok())?,
        JsonValue::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };

    let evaluation: Evaluation = entry.get("evaluation")?.as_str()?.parse().ok()?;

    let reasoning = entry
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Some((plate_number, evaluation, reasoning))
}

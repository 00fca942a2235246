use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::answer::{ClassificationResult, Evaluation};

/// 诊断规则的输入计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisCounts {
    pub normal_vision_count: u32,
    pub protanopia_count: u32,
    pub deuteranopia_count: u32,
    pub total_color_blindness_count: u32,
    pub total_questions: u32,
}

impl DiagnosisCounts {
    /// 汇总分类结果
    ///
    /// Protanomaly 计入红色盲，Deuteranomaly 计入绿色盲。
    /// 分类提示词从不要求全色盲标签，所以 `total_color_blindness_count` 恒为 0，
    /// "Total Color Blindness" 分支在完整流程中不会触发。
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        let mut counts = Self {
            total_questions: results.len() as u32,
            ..Self::default()
        };

        for result in results {
            match result.evaluation {
                Evaluation::Normal => counts.normal_vision_count += 1,
                Evaluation::Protanopia | Evaluation::Protanomaly => counts.protanopia_count += 1,
                Evaluation::Deuteranopia | Evaluation::Deuteranomaly => {
                    counts.deuteranopia_count += 1
                }
                Evaluation::Incorrect => {}
            }
        }

        counts
    }
}

/// 测试汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub normal_vision_count: u32,
    pub protanopia_count: u32,
    pub deuteranopia_count: u32,
    pub total_color_blindness_count: u32,
    pub total_questions: u32,
    pub diagnosis: String,
}

impl SessionSummary {
    pub fn new(counts: DiagnosisCounts, diagnosis: impl Into<String>) -> Self {
        Self {
            normal_vision_count: counts.normal_vision_count,
            protanopia_count: counts.protanopia_count,
            deuteranopia_count: counts.deuteranopia_count,
            total_color_blindness_count: counts.total_color_blindness_count,
            total_questions: counts.total_questions,
            diagnosis: diagnosis.into(),
        }
    }
}

/// 提交内容中的单条作答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub plate_number: u32,
    pub user_answer: String,
}

/// 提交给持久化服务的内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub answers: Vec<AnswerRecord>,
    pub correct_plates: u32,
    pub total_plates: u32,
    pub accuracy: u32,
    pub test_result: String,
    pub plate_results: Vec<ClassificationResult>,
    pub test_date: DateTime<Utc>,
}

/// 提交回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// 本次提交使用的幂等键
    pub idempotency_key: String,
    /// 服务端返回的记录 ID（如有）
    pub record_id: Option<String>,
    /// 是否为重复提交（已存在同一幂等键）
    pub duplicate: bool,
}

/// 一次测试的完整评估结果
///
/// 分类、诊断完成后冻结，提交失败重试时复用，不需要重新分类。
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningReport {
    pub results: Vec<ClassificationResult>,
    pub summary: SessionSummary,
    pub payload: SubmissionPayload,
}

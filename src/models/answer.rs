use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::plate::Plate;

/// 单张色板的作答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub plate: Plate,
    pub user_answer: String,
}

impl Answer {
    pub fn new(plate: Plate, user_answer: impl Into<String>) -> Self {
        Self {
            plate,
            user_answer: user_answer.into(),
        }
    }
}

/// 外部 LLM 给出的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Evaluation {
    Normal,
    Protanopia,
    Deuteranopia,
    Protanomaly,
    Deuteranomaly,
    Incorrect,
}

impl Evaluation {
    pub const ALL: [Evaluation; 6] = [
        Evaluation::Normal,
        Evaluation::Protanopia,
        Evaluation::Deuteranopia,
        Evaluation::Protanomaly,
        Evaluation::Deuteranomaly,
        Evaluation::Incorrect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Evaluation::Normal => "Normal",
            Evaluation::Protanopia => "Protanopia",
            Evaluation::Deuteranopia => "Deuteranopia",
            Evaluation::Protanomaly => "Protanomaly",
            Evaluation::Deuteranomaly => "Deuteranomaly",
            Evaluation::Incorrect => "Incorrect",
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Evaluation {
    type Err = String;

    /// 大小写不敏感，首尾空白忽略
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Evaluation::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("未知的判定标签: {}", s))
    }
}

/// 单张色板的分类结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub plate_number: u32,
    pub user_answer: String,
    pub evaluation: Evaluation,
    pub is_correct: bool,
    pub reasoning: String,
    pub normal_vision_answer: String,
}

/// LLM 未给出可用判定时的固定理由
pub const FALLBACK_REASONING: &str = "AI evaluation failed.";

impl ClassificationResult {
    pub fn new(answer: &Answer, evaluation: Evaluation, reasoning: impl Into<String>) -> Self {
        Self {
            plate_number: answer.plate.plate_number,
            user_answer: answer.user_answer.clone(),
            evaluation,
            is_correct: evaluation == Evaluation::Normal,
            reasoning: reasoning.into(),
            normal_vision_answer: answer.plate.normal_answer().to_string(),
        }
    }

    /// 兜底结果：判定为 Incorrect
    pub fn fallback(answer: &Answer) -> Self {
        Self::new(answer, Evaluation::Incorrect, FALLBACK_REASONING)
    }
}

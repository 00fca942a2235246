use serde::{Deserialize, Serialize};
use std::fmt;

/// 色觉类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionCategory {
    Normal,
    Protanopia,
    Deuteranopia,
    Protanomaly,
    Deuteranomaly,
    TotalColorBlindness,
}

impl VisionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisionCategory::Normal => "normal",
            VisionCategory::Protanopia => "protanopia",
            VisionCategory::Deuteranopia => "deuteranopia",
            VisionCategory::Protanomaly => "protanomaly",
            VisionCategory::Deuteranomaly => "deuteranomaly",
            VisionCategory::TotalColorBlindness => "total_color_blindness",
        }
    }
}

impl fmt::Display for VisionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 每个色觉类别对应的期望答案
///
/// normal / protanopia / deuteranopia 必填，其余类别按色板可选。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedAnswers {
    pub normal: String,
    pub protanopia: String,
    pub deuteranopia: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protanomaly: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deuteranomaly: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_color_blindness: Option<String>,
}

impl ExpectedAnswers {
    /// 按固定顺序列出该色板上存在的类别及其期望答案
    pub fn iter(&self) -> impl Iterator<Item = (VisionCategory, &str)> {
        [
            (VisionCategory::Normal, Some(self.normal.as_str())),
            (VisionCategory::Protanopia, Some(self.protanopia.as_str())),
            (VisionCategory::Deuteranopia, Some(self.deuteranopia.as_str())),
            (VisionCategory::Protanomaly, self.protanomaly.as_deref()),
            (VisionCategory::Deuteranomaly, self.deuteranomaly.as_deref()),
            (
                VisionCategory::TotalColorBlindness,
                self.total_color_blindness.as_deref(),
            ),
        ]
        .into_iter()
        .filter_map(|(category, answer)| answer.map(|a| (category, a)))
    }

    pub fn get(&self, category: VisionCategory) -> Option<&str> {
        self.iter()
            .find(|(c, _)| *c == category)
            .map(|(_, answer)| answer)
    }
}

/// 石原氏色板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plate {
    /// 色板编号（唯一）
    pub plate_number: u32,
    /// 提示问题
    pub question: String,
    /// 各类别的期望答案
    pub answers: ExpectedAnswers,
    /// 图片资源（对本模块不透明）
    pub image: String,
}

impl Plate {
    /// 正常色觉的期望答案，用于结果展示
    pub fn normal_answer(&self) -> &str {
        &self.answers.normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_skips_missing_categories() {
        let answers = ExpectedAnswers {
            normal: "26".to_string(),
            protanopia: "6".to_string(),
            deuteranopia: "2".to_string(),
            protanomaly: None,
            deuteranomaly: Some("2 (6 faint)".to_string()),
            total_color_blindness: None,
        };

        let categories: Vec<_> = answers.iter().map(|(c, _)| c).collect();
        assert_eq!(
            categories,
            vec![
                VisionCategory::Normal,
                VisionCategory::Protanopia,
                VisionCategory::Deuteranopia,
                VisionCategory::Deuteranomaly,
            ]
        );
        assert_eq!(answers.get(VisionCategory::Deuteranomaly), Some("2 (6 faint)"));
        assert_eq!(answers.get(VisionCategory::TotalColorBlindness), None);
    }

    #[test]
    fn test_category_display_honors_width() {
        assert_eq!(format!("[{:<8}]", VisionCategory::Normal), "[normal  ]");
    }
}

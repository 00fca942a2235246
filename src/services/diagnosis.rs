//! 诊断规则 - 业务能力层
//!
//! 纯函数：根据各类别计数给出诊断文字

use crate::models::DiagnosisCounts;

pub const NORMAL_COLOR_VISION: &str = "Normal Color Vision";
pub const MILD_PROTANOPIA: &str = "Mild Protanopia (Red-Blind)";
pub const MILD_DEUTERANOPIA: &str = "Mild Deuteranopia (Green-Blind)";
pub const MILD_DEFICIENCY: &str = "Mild Color Vision Deficiency";
pub const TOTAL_COLOR_BLINDNESS: &str = "Total Color Blindness";
pub const SEVERE_PROTANOPIA: &str = "Severe Protanopia (Red-Blind)";
pub const SEVERE_DEUTERANOPIA: &str = "Severe Deuteranopia (Green-Blind)";
pub const SEVERE_DEFICIENCY: &str = "Severe Color Vision Deficiency";

/// 正常率达到此百分比判定为正常
const NORMAL_THRESHOLD_PCT: f64 = 90.0;
/// 正常率达到此百分比判定为轻度
const MILD_THRESHOLD_PCT: f64 = 70.0;
/// 全色盲计数占比
const TOTAL_BLINDNESS_RATIO: f64 = 0.8;

/// 根据计数给出诊断
///
/// 红绿计数相同时落到中性的 "Color Vision Deficiency" 标签。
/// `total_questions` 为 0 时按正常率 0% 处理。
pub fn diagnose(counts: &DiagnosisCounts) -> &'static str {
    let total = f64::from(counts.total_questions);
    let normal_pct = if counts.total_questions == 0 {
        0.0
    } else {
        f64::from(counts.normal_vision_count) / total * 100.0
    };

    if normal_pct >= NORMAL_THRESHOLD_PCT {
        return NORMAL_COLOR_VISION;
    }

    let protan = counts.protanopia_count;
    let deutan = counts.deuteranopia_count;

    if normal_pct >= MILD_THRESHOLD_PCT {
        return if protan > deutan {
            MILD_PROTANOPIA
        } else if deutan > protan {
            MILD_DEUTERANOPIA
        } else {
            MILD_DEFICIENCY
        };
    }

    if f64::from(counts.total_color_blindness_count) >= total * TOTAL_BLINDNESS_RATIO {
        TOTAL_COLOR_BLINDNESS
    } else if protan > deutan {
        SEVERE_PROTANOPIA
    } else if deutan > protan {
        SEVERE_DEUTERANOPIA
    } else {
        SEVERE_DEFICIENCY
    }
}

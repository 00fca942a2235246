/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::SessionSummary;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；否则详细模式为 debug，普通模式为 info。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `plate_count`: 色板数量
/// - `model`: 分类使用的模型
pub fn log_startup(plate_count: usize, model: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 色觉检查程序启动");
    info!("🎨 色板数量: {}", plate_count);
    info!("🤖 分类模型: {}", model);
    info!("{}", "=".repeat(60));
}

/// 记录测试汇总信息
pub fn log_summary(summary: &SessionSummary, accuracy: u32) {
    info!("\n{}", "=".repeat(60));
    info!("📊 测试完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "✅ 正常: {}/{}",
        summary.normal_vision_count, summary.total_questions
    );
    info!("🔴 红色盲倾向: {}", summary.protanopia_count);
    info!("🟢 绿色盲倾向: {}", summary.deuteranopia_count);
    info!("🎯 准确率: {}%", accuracy);
    info!("🩺 诊断: {}", summary.diagnosis);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

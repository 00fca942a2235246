use anyhow::Result;
use tracing::info;
use vision_screening::utils::logging;
use vision_screening::{App, Config, RunOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let outcome = App::initialize(config).await?.run().await?;

    match outcome {
        RunOutcome::Submitted(report) => info!("✅ 测试完成: {}", report.summary.diagnosis),
        RunOutcome::NotSubmitted(report) => {
            info!("⚠️ 测试完成但未提交: {}", report.summary.diagnosis)
        }
        RunOutcome::Abandoned => info!("测试已放弃"),
    }

    Ok(())
}

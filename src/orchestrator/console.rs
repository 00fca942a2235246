//! 控制台测试程序 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：加载色板目录、创建 LLM 服务和结果持有方
//! 2. **交互**：逐张展示色板、读取答案、处理"上一张"命令
//! 3. **重试**：分类或提交失败时询问是否重试，不需要重新作答
//! 4. **输出**：逐张结果、计数、准确率和诊断
//!
//! 输入输出通过泛型传入，测试中可以用内存缓冲区驱动整场测试。

use anyhow::Result;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppResult, SubmissionError};
use crate::models::{load_catalog, Plate, ScreeningReport, SubmissionPayload, SubmissionReceipt};
use crate::services::{
    load_deck, Classifier, FileResultSink, HttpResultSink, LlmClassifier, LlmService, ResultSink,
};
use crate::utils::logging::{log_startup, log_summary};
use crate::workflow::{ScreeningFlow, SessionCtx, TestSession};

/// 回到上一张的命令
const BACK_COMMANDS: [&str; 2] = ["<", ":back"];
/// 放弃测试的命令
const QUIT_COMMAND: &str = ":quit";

/// 一场控制台测试的结局
#[derive(Debug)]
pub enum RunOutcome {
    /// 已评估并提交
    Submitted(ScreeningReport),
    /// 已评估，但用户放弃了提交
    NotSubmitted(ScreeningReport),
    /// 测试中途放弃或放弃分类，没有任何结果写入
    Abandoned,
}

/// 结果持有方：有服务地址时走 HTTP，否则写本地文件
pub enum Sink {
    Http(HttpResultSink),
    File(FileResultSink),
}

impl ResultSink for Sink {
    async fn persist(
        &self,
        payload: &SubmissionPayload,
        idempotency_key: &str,
        bearer_token: Option<&str>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        match self {
            Sink::Http(sink) => sink.persist(payload, idempotency_key, bearer_token).await,
            Sink::File(sink) => sink.persist(payload, idempotency_key, bearer_token).await,
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    catalog: Vec<Plate>,
    flow: ScreeningFlow<LlmClassifier<LlmService>, Sink>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        let catalog = load_catalog(Path::new(&config.catalog_path)).await?;

        let llm_service = LlmService::new(&config);
        log_startup(catalog.len(), llm_service.model_name());

        let sink = match &config.results_api_base_url {
            Some(base_url) => {
                let sink = HttpResultSink::new(base_url);
                info!("📡 结果将提交到: {}", sink.endpoint());
                Sink::Http(sink)
            }
            None => {
                info!("💾 未配置结果服务，结果将写入: {}", config.results_file);
                Sink::File(FileResultSink::new(&config.results_file))
            }
        };

        let flow = ScreeningFlow::new(LlmClassifier::new(llm_service), sink);

        Ok(Self {
            config,
            catalog,
            flow,
        })
    }

    /// 使用标准输入输出运行一场测试
    pub async fn run(&self) -> Result<RunOutcome> {
        let ctx = SessionCtx::new(self.config.results_api_token.clone(), None);
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        run_with_io(&self.flow, &self.catalog, &ctx, stdin, &mut stdout).await
    }
}

/// 用给定的输入输出驱动一场完整测试
pub async fn run_with_io<C, S, R, W>(
    flow: &ScreeningFlow<C, S>,
    catalog: &[Plate],
    ctx: &SessionCtx,
    mut input: R,
    output: &mut W,
) -> Result<RunOutcome>
where
    C: Classifier,
    S: ResultSink,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = TestSession::new(load_deck(catalog)?);
    info!("{} 🎨 测试开始，共 {} 张色板", ctx, session.deck().len());

    // ========== 阶段 1: 逐张作答 ==========
    if !collect_answers(&mut session, &mut input, output).await? {
        warn!("{} ⚠️ 测试被放弃，不保存任何结果", ctx);
        writeln!(output, "Test abandoned. Nothing was saved.")?;
        return Ok(RunOutcome::Abandoned);
    }

    // ========== 阶段 2: 分类 + 诊断 ==========
    writeln!(output, "\nEvaluating your answers...")?;
    let report = match with_retry(&mut input, output, || flow.evaluate(&session, ctx)).await? {
        Some(report) => report,
        None => return Ok(RunOutcome::Abandoned),
    };
    print_report(output, &report)?;
    log_summary(&report.summary, report.payload.accuracy);

    // ========== 阶段 3: 提交 ==========
    match with_retry(&mut input, output, || flow.submit(&report, ctx)).await? {
        Some(receipt) => {
            if receipt.duplicate {
                writeln!(output, "Result was already saved.")?;
            } else {
                writeln!(output, "Result saved.")?;
            }
            Ok(RunOutcome::Submitted(report))
        }
        None => Ok(RunOutcome::NotSubmitted(report)),
    }
}

/// 逐张读取答案，返回是否完成（`false` 表示放弃或输入结束）
async fn collect_answers<R, W>(
    session: &mut TestSession,
    input: &mut R,
    output: &mut W,
) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    while let Some(plate) = session.current_plate() {
        let (answered, total) = session.progress();
        writeln!(
            output,
            "\nPlate {}/{} [{}] {}",
            answered + 1,
            total,
            plate.image,
            plate.question
        )?;
        if !session.input().is_empty() {
            writeln!(output, "Previous answer: {}", session.input())?;
        }
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = read_line(input).await? else {
            return Ok(false);
        };
        let line = line.trim();

        if line == QUIT_COMMAND {
            return Ok(false);
        }

        if BACK_COMMANDS.contains(&line) {
            if session.go_to_previous().is_none() {
                writeln!(output, "Already at the first plate.")?;
            }
            continue;
        }

        // 回到上一张后直接回车表示保留原答案
        let text = if line.is_empty() {
            session.input().to_string()
        } else {
            line.to_string()
        };

        if let Err(e) = session.submit_answer(&text) {
            writeln!(output, "{}", e)?;
        }
    }

    Ok(true)
}

/// 执行一个可重试的步骤
///
/// 可重试的错误会询问用户；用户拒绝时返回 `None`。
async fn with_retry<T, F, Fut, R, W>(
    input: &mut R,
    output: &mut W,
    mut step: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        match step().await {
            Ok(value) => return Ok(Some(value)),
            Err(e) if e.is_retryable() => {
                writeln!(output, "{}", e)?;
                write!(output, "retry? [y/N] ")?;
                output.flush()?;

                let answer = read_line(input).await?.unwrap_or_default();
                if !answer.trim().eq_ignore_ascii_case("y") {
                    return Ok(None);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// 读取一行，输入结束时返回 `None`
async fn read_line<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).await?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// 输出评估结果
fn print_report<W: Write>(output: &mut W, report: &ScreeningReport) -> std::io::Result<()> {
    writeln!(output, "\n{}", "=".repeat(60))?;
    for result in &report.results {
        writeln!(
            output,
            "Plate {:>2}: you saw {:<12} expected {:<6} {:<12} {}",
            result.plate_number,
            format!("\"{}\"", result.user_answer),
            result.normal_vision_answer,
            result.evaluation,
            result.reasoning
        )?;
    }
    writeln!(output, "{}", "-".repeat(60))?;
    writeln!(
        output,
        "Correct plates: {}/{} ({}%)",
        report.payload.correct_plates, report.payload.total_plates, report.payload.accuracy
    )?;
    writeln!(
        output,
        "Protanopia: {}  Deuteranopia: {}",
        report.summary.protanopia_count, report.summary.deuteranopia_count
    )?;
    writeln!(output, "Diagnosis: {}", report.summary.diagnosis)?;
    writeln!(output, "{}", "=".repeat(60))?;
    Ok(())
}

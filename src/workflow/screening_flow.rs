//! 色觉测试流程 - 流程层
//!
//! 核心职责：定义"一场测试作答完成之后"的处理流程
//!
//! 流程顺序：
//! 1. 一次批量分类（LLM）
//! 2. 汇总计数 → 诊断
//! 3. 构建提交内容并提交
//!
//! 分类成功后生成的 `ScreeningReport` 会被冻结；提交失败时用同一份报告重试，
//! 不需要重新分类，也不会换幂等键。

use chrono::Utc;
use tracing::{error, info};

use crate::error::{AppResult, ClassificationError};
use crate::models::{DiagnosisCounts, ScreeningReport, SessionSummary, SubmissionReceipt};
use crate::services::{build_payload, diagnose, Classifier, ResultSink};
use crate::workflow::session::TestSession;
use crate::workflow::session_ctx::SessionCtx;

/// 色觉测试流程
///
/// - 编排分类、诊断、提交的顺序
/// - 不持有会话（会话由调用方持有）
/// - 只依赖业务能力（services）
pub struct ScreeningFlow<C, S> {
    classifier: C,
    sink: S,
}

impl<C: Classifier, S: ResultSink> ScreeningFlow<C, S> {
    pub fn new(classifier: C, sink: S) -> Self {
        Self { classifier, sink }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// 分类并诊断
    ///
    /// 会话必须已完成；失败时会话不受影响，可直接重试。
    pub async fn evaluate(&self, session: &TestSession, ctx: &SessionCtx) -> AppResult<ScreeningReport> {
        if !session.is_completed() {
            let (answered, total) = session.progress();
            return Err(ClassificationError::IncompleteSession { answered, total }.into());
        }

        let answers = session.answers();
        info!("{} 📝 开始评估 {} 个答案", ctx, answers.len());

        let results = self.classifier.classify(answers).await.map_err(|e| {
            error!("{} ❌ 分类失败: {}", ctx, e);
            e
        })?;

        let counts = DiagnosisCounts::from_results(&results);
        let diagnosis = diagnose(&counts);
        info!("{} 🩺 诊断结果: {}", ctx, diagnosis);

        let summary = SessionSummary::new(counts, diagnosis);
        let payload = build_payload(answers, &results, diagnosis, Utc::now());

        Ok(ScreeningReport {
            results,
            summary,
            payload,
        })
    }

    /// 提交评估结果
    ///
    /// 可在失败后用同一份报告再次调用。
    pub async fn submit(&self, report: &ScreeningReport, ctx: &SessionCtx) -> AppResult<SubmissionReceipt> {
        info!("{} 📤 正在提交测试结果...", ctx);

        let receipt = self
            .sink
            .persist(
                &report.payload,
                &ctx.idempotency_key(),
                ctx.bearer_token.as_deref(),
            )
            .await
            .map_err(|e| {
                error!("{} ❌ 提交失败: {}", ctx, e);
                e
            })?;

        Ok(receipt)
    }

    /// 评估并提交
    pub async fn run(
        &self,
        session: &TestSession,
        ctx: &SessionCtx,
    ) -> AppResult<(ScreeningReport, SubmissionReceipt)> {
        let report = self.evaluate(session, ctx).await?;
        let receipt = self.submit(&report, ctx).await?;
        Ok((report, receipt))
    }
}

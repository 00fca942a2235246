//! # Vision Screening
//!
//! 石原氏色觉检查：洗牌展示色板、收集答案、由 LLM 批量分类、按阈值给出诊断并提交结果
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 色板、答案、分类结果、提交内容
//! - `load_catalog` - 从 TOML 文件加载色板目录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `load_deck` - 洗牌
//! - `LlmClassifier` / `LlmService` - LLM 批量分类能力
//! - `diagnose` - 诊断规则
//! - `HttpResultSink` / `FileResultSink` - 结果持久化能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场测试"的完整流程
//! - `TestSession` - 作答状态机
//! - `SessionCtx` - 上下文封装（会话 ID + token）
//! - `ScreeningFlow` - 流程编排（classify → diagnose → submit）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/console` - 控制台交互、资源管理、重试提示
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Answer, ClassificationResult, Evaluation, Plate, ScreeningReport};
pub use orchestrator::{App, RunOutcome};
pub use services::{diagnose, load_deck, Classifier, ResultSink, TextOracle};
pub use workflow::{ScreeningFlow, SessionCtx, SessionState, TestSession};

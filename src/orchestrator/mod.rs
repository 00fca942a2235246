//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责资源和交互，是整个系统的"指挥中心"。
//!
//! ### `console` - 控制台测试程序
//! - 管理应用生命周期（初始化、运行）
//! - 加载色板目录，持有 LLM 服务和结果持有方
//! - 驱动一场测试的输入输出和重试提示
//!
//! ## 层次关系
//!
//! ```text
//! console (一场测试的交互)
//!     ↓
//! workflow::TestSession / ScreeningFlow (作答 → 分类 → 诊断 → 提交)
//!     ↓
//! services (能力层：deck / classifier / diagnosis / submitter / llm)
//!     ↓
//! models (色板、答案、报告)
//! ```

pub mod console;

pub use console::{run_with_io, App, RunOutcome, Sink};

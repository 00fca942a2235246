//! 测试会话控制器 - 流程层
//!
//! 单线程状态机：依次展示洗好的色板，每张收集一个文本答案，
//! 支持回到上一张修改答案，最后一张作答后进入 `Completed`。
//!
//! ```text
//! Presenting(0) → Presenting(1) → … → Presenting(n-1) → Completed
//!        ↖────────── reopen / go_to_previous ──────────┘
//! ```

use tracing::debug;

use crate::error::{AppResult, ValidationError};
use crate::models::{Answer, Plate};
use crate::services::Deck;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 正在展示第 index 张色板（从 0 开始）
    Presenting(usize),
    /// 所有色板已作答
    Completed,
}

/// 一场色觉测试
#[derive(Debug, Clone)]
pub struct TestSession {
    deck: Deck,
    answers: Vec<Answer>,
    input: String,
    state: SessionState,
}

impl TestSession {
    /// 从洗好的色板开始新的测试
    pub fn new(deck: Deck) -> Self {
        let state = if deck.is_empty() {
            SessionState::Completed
        } else {
            SessionState::Presenting(0)
        };

        Self {
            deck,
            answers: Vec::new(),
            input: String::new(),
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// 当前正在展示的色板
    pub fn current_plate(&self) -> Option<&Plate> {
        match self.state {
            SessionState::Presenting(index) => self.deck.get(index),
            SessionState::Completed => None,
        }
    }

    /// 输入框内容（回到上一张时会填入原答案）
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// (已作答数量, 色板总数)
    pub fn progress(&self) -> (usize, usize) {
        (self.answers.len(), self.deck.len())
    }

    /// 提交当前色板的答案
    ///
    /// 去除首尾空白后为空时返回 `EmptyAnswer`，状态不变。
    /// 成功后清空输入框，前进到下一张或进入 `Completed`。
    pub fn submit_answer(&mut self, text: &str) -> AppResult<SessionState> {
        let index = match self.state {
            SessionState::Presenting(index) => index,
            SessionState::Completed => return Err(ValidationError::SessionCompleted.into()),
        };

        let plate = self
            .deck
            .get(index)
            .cloned()
            .ok_or(ValidationError::SessionCompleted)?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyAnswer {
                plate_number: plate.plate_number,
            }
            .into());
        }

        debug!("色板 {} 作答: {}", plate.plate_number, text);

        self.answers.push(Answer::new(plate, text));
        self.input.clear();

        self.state = if index + 1 >= self.deck.len() {
            SessionState::Completed
        } else {
            SessionState::Presenting(index + 1)
        };

        Ok(self.state)
    }

    /// 提交输入框中的内容
    pub fn submit_input(&mut self) -> AppResult<SessionState> {
        let text = self.input.clone();
        self.submit_answer(&text)
    }

    /// 回到上一张色板
    ///
    /// 第一张或测试已完成时什么也不做，返回 `None`；
    /// 否则移除上一张的答案并返回其文本，供修改。
    pub fn go_to_previous(&mut self) -> Option<String> {
        match self.state {
            SessionState::Presenting(index) if index > 0 => self.reopen(index - 1).ok(),
            _ => None,
        }
    }

    /// 重新打开第 `index` 张色板
    ///
    /// `index` 必须小于当前位置。该色板及其后的答案都会被移除，
    /// 原答案放回输入框并返回。
    pub fn reopen(&mut self, index: usize) -> AppResult<String> {
        let current = match self.state {
            SessionState::Presenting(current) => current,
            SessionState::Completed => return Err(ValidationError::SessionCompleted.into()),
        };

        if index >= current || index >= self.answers.len() {
            return Err(ValidationError::ReopenOutOfRange { index, current }.into());
        }

        let previous = self
            .answers
            .drain(index..)
            .next()
            .map(|answer| answer.user_answer)
            .unwrap_or_default();

        debug!("重新打开第 {} 张色板，原答案: {}", index + 1, previous);

        self.state = SessionState::Presenting(index);
        self.input = previous.clone();

        Ok(previous)
    }
}

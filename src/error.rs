use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 用户输入校验错误（本地恢复，状态不变）
    #[error("输入错误: {0}")]
    Validation(#[from] ValidationError),
    /// 配置错误（启动时致命）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 答案分类错误（可重试）
    #[error("分类错误: {0}")]
    Classification(#[from] ClassificationError),
    /// 结果提交错误（可重试）
    #[error("提交错误: {0}")]
    Submission(#[from] SubmissionError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 测试过程中的输入错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 答案为空或只有空白
    #[error("色板 {plate_number} 的答案不能为空")]
    EmptyAnswer { plate_number: u32 },
    /// 测试已结束，答案不可再修改
    #[error("测试已完成，答案不可修改")]
    SessionCompleted,
    /// 只能重新打开已经作答过的色板
    #[error("无法重新打开第 {index} 张色板 (当前位置: {current})")]
    ReopenOutOfRange { index: usize, current: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 色板目录为空
    #[error("色板目录为空，无法开始测试")]
    EmptyCatalog,
    /// 色板编号重复
    #[error("色板编号 {plate_number} 重复")]
    DuplicatePlate { plate_number: u32 },
    /// 必填的期望答案为空
    #[error("色板 {plate_number} 缺少 {category} 的期望答案")]
    BlankExpectedAnswer {
        plate_number: u32,
        category: &'static str,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

/// 答案分类（外部 LLM）错误
///
/// 这些错误作用于整个批次：任何一个发生时都不会计分，
/// 已收集的答案保留在内存中，可以直接重试。
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// API 调用失败（网络、超时、鉴权等）
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 返回内容不是合法 JSON
    #[error("无法解析LLM返回的JSON (响应: {response}): {source}")]
    MalformedResponse {
        response: String,
        #[source]
        source: serde_json::Error,
    },
    /// JSON 顶层不是数组
    #[error("LLM返回的JSON不是数组: {response}")]
    NotAnArray { response: String },
    /// 没有任何答案可供分类
    #[error("没有可分类的答案")]
    EmptyBatch,
    /// 测试尚未完成
    #[error("测试尚未完成 (已作答 {answered}/{total})")]
    IncompleteSession { answered: usize, total: usize },
}

/// 结果提交错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 网络请求失败
    #[error("提交请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务端返回错误响应
    #[error("提交返回错误响应 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// 写入结果文件失败
    #[error("写入结果文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化提交内容失败
    #[error("序列化提交内容失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl AppError {
    /// 是否可以由用户手动重试
    ///
    /// 分类和提交失败都保留了之前的状态，重试不需要重新做测试。
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Classification(e) => !matches!(
                e,
                ClassificationError::EmptyBatch | ClassificationError::IncompleteSession { .. }
            ),
            AppError::Submission(_) => true,
            _ => false,
        }
    }
}

impl ClassificationError {
    /// 创建LLM API调用错误
    pub fn api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ClassificationError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        let err: AppError = ClassificationError::EmptyResponse {
            model: "gemini".to_string(),
        }
        .into();
        assert!(err.is_retryable());

        let err: AppError = SubmissionError::BadResponse {
            endpoint: "/api".to_string(),
            status: 502,
            message: None,
        }
        .into();
        assert!(err.is_retryable());

        let err: AppError = ValidationError::EmptyAnswer { plate_number: 3 }.into();
        assert!(!err.is_retryable());

        let err: AppError = ClassificationError::IncompleteSession {
            answered: 2,
            total: 5,
        }
        .into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_display_keeps_context() {
        let err: AppError = ConfigError::DuplicatePlate { plate_number: 7 }.into();
        assert!(err.to_string().contains('7'));
    }
}

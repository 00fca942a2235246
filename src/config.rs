use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 色板目录 TOML 文件
    pub catalog_path: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- 结果提交配置 ---
    /// 结果服务地址，为空时写入本地文件
    pub results_api_base_url: Option<String>,
    /// 转发给结果服务的 bearer token
    pub results_api_token: Option<String>,
    /// 本地结果文件（每行一条 JSON）
    pub results_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: "data/plates.toml".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.0-flash".to_string(),
            llm_temperature: 0.2,
            llm_max_tokens: 4096,
            results_api_base_url: None,
            results_api_token: None,
            results_file: "results.jsonl".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            catalog_path: std::env::var("CATALOG_PATH").unwrap_or(default.catalog_path),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_temperature),
            llm_max_tokens: std::env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_tokens),
            results_api_base_url: std::env::var("RESULTS_API_BASE_URL").ok().filter(|v| !v.trim().is_empty()),
            results_api_token: std::env::var("RESULTS_API_TOKEN").ok().filter(|v| !v.trim().is_empty()),
            results_file: std::env::var("RESULTS_FILE").unwrap_or(default.results_file),
        }
    }

    /// 检查启动必需的配置项
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "LLM_API_KEY".to_string(),
            });
        }
        // 配置了结果服务时必须有 token
        if self.results_api_base_url.is_some() && self.results_api_token.is_none() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "RESULTS_API_TOKEN".to_string(),
            });
        }
        Ok(())
    }
}

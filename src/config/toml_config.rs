use crate::utils::error::{Result, WisherError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub store: StoreConfig,
    pub notifier: NotifierConfig,
    pub channel: ChannelConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "birthdays.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub post_send_delay_seconds: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            post_send_delay_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Console,
    Command,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    pub settle_seconds: u64,
    pub timeout_seconds: u64,
    pub program: Option<String>,
    pub args: Vec<String>,
    pub endpoint: Option<String>,
    pub headers: HashMap<String, String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            kind: ChannelKind::Console,
            settle_seconds: 0,
            timeout_seconds: 60,
            program: None,
            args: Vec::new(),
            endpoint: None,
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(WisherError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值，由呼叫端負責提示
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| WisherError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GATEWAY_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| WisherError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn post_send_delay(&self) -> Duration {
        Duration::from_secs(self.notifier.post_send_delay_seconds)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("store.path", &self.store.path)?;
        validation::validate_range(
            "notifier.post_send_delay_seconds",
            self.notifier.post_send_delay_seconds,
            0,
            3600,
        )?;
        validation::validate_range("channel.settle_seconds", self.channel.settle_seconds, 0, 600)?;
        validation::validate_range("channel.timeout_seconds", self.channel.timeout_seconds, 1, 3600)?;

        match self.channel.kind {
            ChannelKind::Console => {}
            ChannelKind::Command => {
                let program = validation::validate_required_field("channel.program", &self.channel.program)?;
                validation::validate_non_empty_string("channel.program", program)?;
            }
            ChannelKind::Webhook => {
                let endpoint =
                    validation::validate_required_field("channel.endpoint", &self.channel.endpoint)?;
                validation::validate_url("channel.endpoint", endpoint)?;
            }
        }

        Ok(())
    }
}

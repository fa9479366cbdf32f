use crate::config::toml_config::{ChannelConfig, ChannelKind};
use crate::domain::ports::NotificationChannel;
use crate::utils::error::{Result, WisherError};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

const PHONE_PLACEHOLDER: &str = "{phone}";
const MESSAGE_PLACEHOLDER: &str = "{message}";

/// Wait for the external system to settle after it accepted a message.
async fn settle(duration: Duration) {
    if !duration.is_zero() {
        tracing::debug!("Settling for {:?}", duration);
        tokio::time::sleep(duration).await;
    }
}

/// Prints greetings to stdout instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct ConsoleChannel {
    settle: Duration,
}

impl ConsoleChannel {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    async fn send(&self, address: &str, message: &str) -> Result<()> {
        println!("📨 To {}:\n{}\n", address, message);
        settle(self.settle).await;
        Ok(())
    }
}

/// Hands each greeting to an external program, e.g. a browser automation script.
///
/// `{phone}` and `{message}` in the arguments are replaced per call. When no
/// argument mentions either placeholder, phone and message are appended as
/// the last two arguments. Exit status 0 counts as delivered; the process is
/// killed if it outlives `timeout`.
#[derive(Debug, Clone)]
pub struct CommandChannel {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    settle: Duration,
}

impl CommandChannel {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(60),
            settle: Duration::ZERO,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    fn render_args(&self, address: &str, message: &str) -> Vec<String> {
        let templated = self
            .args
            .iter()
            .any(|a| a.contains(PHONE_PLACEHOLDER) || a.contains(MESSAGE_PLACEHOLDER));

        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(PHONE_PLACEHOLDER, address).replace(MESSAGE_PLACEHOLDER, message))
            .collect();
        if !templated {
            args.push(address.to_string());
            args.push(message.to_string());
        }
        args
    }
}

#[async_trait]
impl NotificationChannel for CommandChannel {
    async fn send(&self, address: &str, message: &str) -> Result<()> {
        let args = self.render_args(address, message);
        tracing::debug!("Running {} for {}", self.program, address);

        let child = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WisherError::delivery(format!("could not start '{}': {}", self.program, e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                WisherError::delivery(format!("'{}' timed out after {:?}", self.program, self.timeout))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WisherError::delivery(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        settle(self.settle).await;
        Ok(())
    }
}

/// POSTs `{"phone": .., "message": ..}` to a messaging gateway.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
    settle: Duration,
}

impl WebhookChannel {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            settle: Duration::ZERO,
        })
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, address: &str, message: &str) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(&serde_json::json!({
            "phone": address,
            "message": message,
        }));
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        tracing::debug!("POST {} for {}", self.endpoint, address);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Webhook response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WisherError::delivery(format!(
                "webhook returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        settle(self.settle).await;
        Ok(())
    }
}

/// The channel selected in the configuration file.
#[derive(Debug, Clone)]
pub enum ConfiguredChannel {
    Console(ConsoleChannel),
    Command(CommandChannel),
    Webhook(WebhookChannel),
}

impl ConfiguredChannel {
    pub fn from_config(config: &ChannelConfig) -> Result<Self> {
        let settle = Duration::from_secs(config.settle_seconds);
        let timeout = Duration::from_secs(config.timeout_seconds);

        Ok(match config.kind {
            ChannelKind::Console => ConfiguredChannel::Console(ConsoleChannel::new(settle)),
            ChannelKind::Command => {
                let program = crate::utils::validation::validate_required_field(
                    "channel.program",
                    &config.program,
                )?;
                ConfiguredChannel::Command(
                    CommandChannel::new(program.clone(), config.args.clone())
                        .with_timeout(timeout)
                        .with_settle(settle),
                )
            }
            ChannelKind::Webhook => {
                let endpoint = crate::utils::validation::validate_required_field(
                    "channel.endpoint",
                    &config.endpoint,
                )?;
                ConfiguredChannel::Webhook(
                    WebhookChannel::new(endpoint.clone(), timeout)?
                        .with_headers(config.headers.clone())
                        .with_settle(settle),
                )
            }
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConfiguredChannel::Console(_) => "console",
            ConfiguredChannel::Command(_) => "command",
            ConfiguredChannel::Webhook(_) => "webhook",
        }
    }
}

#[async_trait]
impl NotificationChannel for ConfiguredChannel {
    async fn send(&self, address: &str, message: &str) -> Result<()> {
        match self {
            ConfiguredChannel::Console(c) => c.send(address, message).await,
            ConfiguredChannel::Command(c) => c.send(address, message).await,
            ConfiguredChannel::Webhook(c) => c.send(address, message).await,
        }
    }
}

//! Notification channels.
//!
//! - `CommandNotifier`: local alert through an external command
//! - `DesktopNotifier`: local alert through notify-rust (`desktop` feature)
//! - `NtfyNotifier`: remote push through an ntfy relay topic
//! - `MockNotifier`: records deliveries for tests

use std::{
    process::ExitStatus,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, header::HeaderValue};
use thiserror::Error;

use crate::config::{CommandConfig, LocalBackend, NetworkConfig, NotificationConfig};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to run notification command '{program}': {source}")]
    Command {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Notification command '{program}' exited with {status}")]
    CommandStatus { program: String, status: ExitStatus },
    #[error("Desktop notification failed: {0}")]
    Desktop(String),
    #[error("Push notification request failed: {0}")]
    Push(#[from] reqwest::Error),
    #[error("Push relay returned error status {0}")]
    PushStatus(StatusCode),
    #[error("Invalid push header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

/// Where a notifier delivers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Alert on the machine running the monitor.
    Local,
    /// Push to the operator's phone.
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub urgency: Urgency,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, urgency: Urgency) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            urgency,
        }
    }
}

/// A best-effort notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> Channel;

    /// Short name used in log lines.
    fn name(&self) -> &str;

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

// ==================== Local: external command ====================

/// Runs a configured program, e.g. `notify-send "{title}" "{message}"`.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    pub fn new(config: &CommandConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    /// Argument list with placeholders filled in.
    pub fn render_args(&self, notification: &Notification) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{title}", &notification.title)
                    .replace("{message}", &notification.message)
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    fn channel(&self) -> Channel {
        Channel::Local
    }

    fn name(&self) -> &str {
        "local alert"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let status = tokio::process::Command::new(&self.program)
            .args(self.render_args(notification))
            .status()
            .await
            .map_err(|source| NotifyError::Command {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(NotifyError::CommandStatus {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

// ==================== Local: desktop notification ====================

/// Desktop notification via notify-rust.
#[cfg(feature = "desktop")]
#[derive(Debug, Clone, Default)]
pub struct DesktopNotifier;

#[cfg(feature = "desktop")]
#[async_trait]
impl Notifier for DesktopNotifier {
    fn channel(&self) -> Channel {
        Channel::Local
    }

    fn name(&self) -> &str {
        "desktop alert"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let title = notification.title.clone();
        let message = notification.message.clone();

        // notify-rust blocks on the platform notification service
        tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .summary(&title)
                .body(&message)
                .appname("Park Monitor")
                .show()
                .map(|_| ())
                .map_err(|e| NotifyError::Desktop(e.to_string()))
        })
        .await
        .map_err(|e| NotifyError::Desktop(e.to_string()))?
    }
}

// ==================== Remote: ntfy push ====================

/// Push notification to `{server}/{topic}` on an ntfy relay.
#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    client: reqwest::Client,
    url: String,
}

impl NtfyNotifier {
    pub fn new(server: &str, topic: &str, network_config: &NetworkConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: format!("{}/{}", server.trim_end_matches('/'), topic),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// ntfy `Priority` and `Tags` header values for an urgency.
pub fn ntfy_metadata(urgency: Urgency) -> (&'static str, &'static str) {
    match urgency {
        Urgency::High => ("urgent", "tada,calendar"),
        Urgency::Low => ("low", "x"),
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    fn channel(&self) -> Channel {
        Channel::Remote
    }

    fn name(&self) -> &str {
        "push notification"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let (priority, tags) = ntfy_metadata(notification.urgency);

        let response = self
            .client
            .post(&self.url)
            .header("Title", HeaderValue::from_str(&notification.title)?)
            .header("Priority", priority)
            .header("Tags", tags)
            .body(notification.message.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::PushStatus(status));
        }
        Ok(())
    }
}

/// Build the configured notifiers: the local alert (if any), then the push.
pub fn build_notifiers(
    config: &NotificationConfig,
    network_config: &NetworkConfig,
) -> anyhow::Result<Vec<Box<dyn Notifier>>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    match config.local_backend {
        LocalBackend::Command => notifiers.push(Box::new(CommandNotifier::new(&config.command))),
        #[cfg(feature = "desktop")]
        LocalBackend::Desktop => notifiers.push(Box::new(DesktopNotifier)),
        #[cfg(not(feature = "desktop"))]
        LocalBackend::Desktop => {
            tracing::warn!("Built without desktop support, using notification command instead");
            notifiers.push(Box::new(CommandNotifier::new(&config.command)));
        }
        LocalBackend::Off => {}
    }

    notifiers.push(Box::new(NtfyNotifier::new(
        &config.ntfy_server,
        &config.ntfy_topic,
        network_config,
    )?));

    Ok(notifiers)
}

// ==================== Mock ====================

/// Mock notifier for testing that records all notifications.
#[derive(Debug, Clone)]
pub struct MockNotifier {
    channel: Channel,
    fail: bool,
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl MockNotifier {
    /// Create a new mock notifier on the given channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            fail: false,
            notifications: Arc::default(),
        }
    }

    /// A mock that records the attempt and then reports a failure.
    pub fn failing(channel: Channel) -> Self {
        Self {
            fail: true,
            ..Self::new(channel)
        }
    }

    /// Get all notifications that have been attempted.
    pub fn get_notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    pub fn was_called(&self) -> bool {
        !self.notifications.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.notifications.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(NotifyError::PushStatus(StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(())
    }
}

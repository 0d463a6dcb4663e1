use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dealhound_models::config::NotifierConfig;
use dealhound_models::listing::Opportunity;
use tracing::{info, warn};

use crate::error::AgentError;

/// Delivers a chosen opportunity. Delivery failures are logged, never returned.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn alert(&self, opportunity: &Opportunity);
}

/// One delivery transport (push, SMS).
#[async_trait]
pub trait AlertChannel: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, text: &str) -> Result<(), AgentError>;
}

/// Human-readable alert text with the description cut to `description_chars`.
pub fn format_alert(opportunity: &Opportunity, description_chars: usize) -> String {
    let description: String = opportunity
        .listing
        .description
        .chars()
        .take(description_chars)
        .collect();
    format!(
        "Deal Alert! Price=${:.2}, Estimate=${:.2}, Discount=${:.2} :{}... {}",
        opportunity.listing.asking_price,
        opportunity.estimate,
        opportunity.discount,
        description,
        opportunity.url()
    )
}

/// Channel secrets, read from the environment by the binary.
#[derive(Debug, Clone, Default)]
pub struct NotifierCredentials {
    pub pushover_user: Option<String>,
    pub pushover_token: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from: Option<String>,
    pub sms_to: Option<String>,
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, AgentError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {e}")))
}

fn required(value: &Option<String>, var: &str) -> Result<String, AgentError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AgentError::Config(format!("{var} is not set")))
}

/// Pushover push notifications.
pub struct PushoverChannel {
    client: reqwest::Client,
    base_url: String,
    user: String,
    token: String,
}

impl PushoverChannel {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: user.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl AlertChannel for PushoverChannel {
    fn name(&self) -> &str {
        "pushover"
    }

    async fn send(&self, text: &str) -> Result<(), AgentError> {
        let form = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("message", text),
            ("sound", "cashregister"),
        ];
        let response = self
            .client
            .post(format!("{}/1/messages.json", self.base_url))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AgentError::Notify(format!(
                "Pushover status: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Twilio SMS.
pub struct TwilioChannel {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}

impl TwilioChannel {
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from: from.into(),
            to: to.into(),
        })
    }
}

#[async_trait]
impl AlertChannel for TwilioChannel {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn send(&self, text: &str) -> Result<(), AgentError> {
        let form = [
            ("From", self.from.as_str()),
            ("To", self.to.as_str()),
            ("Body", text),
        ];
        let response = self
            .client
            .post(format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                self.base_url, self.account_sid
            ))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AgentError::Notify(format!(
                "Twilio status: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Fans an alert out to every configured channel.
pub struct Messenger {
    channels: Vec<Arc<dyn AlertChannel>>,
    description_chars: usize,
}

impl Messenger {
    pub fn new(channels: Vec<Arc<dyn AlertChannel>>, description_chars: usize) -> Self {
        Self {
            channels,
            description_chars,
        }
    }

    /// Build the enabled channels. An enabled channel without credentials is a
    /// configuration error.
    pub fn from_config(
        config: &NotifierConfig,
        credentials: &NotifierCredentials,
    ) -> Result<Self, AgentError> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let mut channels: Vec<Arc<dyn AlertChannel>> = Vec::new();

        if config.enable_push {
            channels.push(Arc::new(PushoverChannel::new(
                &config.pushover_base_url,
                required(&credentials.pushover_user, "PUSHOVER_USER")?,
                required(&credentials.pushover_token, "PUSHOVER_TOKEN")?,
                timeout,
            )?));
        }
        if config.enable_sms {
            channels.push(Arc::new(TwilioChannel::new(
                &config.twilio_base_url,
                required(&credentials.twilio_account_sid, "TWILIO_ACCOUNT_SID")?,
                required(&credentials.twilio_auth_token, "TWILIO_AUTH_TOKEN")?,
                required(&credentials.twilio_from, "TWILIO_FROM")?,
                required(&credentials.sms_to, "MY_PHONE_NUMBER")?,
                timeout,
            )?));
        }

        if channels.is_empty() {
            warn!("No alert channels enabled; alerts will only be logged");
        }
        Ok(Self::new(channels, config.description_chars))
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }
}

#[async_trait]
impl Notifier for Messenger {
    async fn alert(&self, opportunity: &Opportunity) {
        let text = format_alert(opportunity, self.description_chars);
        info!(url = %opportunity.url(), discount = %opportunity.discount, "Sending deal alert");

        for channel in &self.channels {
            match channel.send(&text).await {
                Ok(()) => info!(channel = %channel.name(), "Alert delivered"),
                Err(e) => warn!(channel = %channel.name(), error = %e, "Alert delivery failed"),
            }
        }
    }
}

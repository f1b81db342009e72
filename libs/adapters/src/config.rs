//! Per-platform adapter configuration.
//!
//! Every config deserializes with serde and can be read from the environment. Secrets are
//! plain strings supplied by the operator; nothing here acquires or refreshes tokens.

use std::env;

use serde::{Deserialize, Serialize};

use crate::AdapterError;

pub const INSTANCE_ID_ENV: &str = "ASH_INSTANCE_ID";

const SLACK_API_BASE: &str = "https://slack.com/api";
const KIK_API_BASE: &str = "https://api.kik.com";
const MESSENGER_API_BASE: &str = "https://graph.facebook.com/v18.0";
const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Generator instance id: `ASH_INSTANCE_ID` when set, a fresh v4 uuid otherwise.
pub fn instance_id<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(lookup(INSTANCE_ID_ENV)).unwrap_or_else(new_instance_id)
}

fn new_instance_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AdapterError>
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(lookup(key)).ok_or_else(|| AdapterError::Config(format!("{key} is not configured")))
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlackConfig {
    pub bot_token: String,
    #[serde(default)]
    pub signing_secret: Option<String>,
    #[serde(default = "default_slack_api_base")]
    pub api_base: String,
    #[serde(default = "new_instance_id")]
    pub instance_id: String,
}

fn default_slack_api_base() -> String {
    SLACK_API_BASE.into()
}

impl SlackConfig {
    /// Reads `SLACK_BOT_TOKEN`, `SLACK_SIGNING_SECRET` and `SLACK_API_BASE`.
    pub fn from_env() -> Result<Self, AdapterError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AdapterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bot_token: required(&lookup, "SLACK_BOT_TOKEN")?,
            signing_secret: non_blank(lookup("SLACK_SIGNING_SECRET")),
            api_base: non_blank(lookup("SLACK_API_BASE")).unwrap_or_else(default_slack_api_base),
            instance_id: instance_id(&lookup),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KikConfig {
    pub username: String,
    pub api_key: String,
    #[serde(default = "default_kik_api_base")]
    pub api_base: String,
    #[serde(default = "new_instance_id")]
    pub instance_id: String,
}

fn default_kik_api_base() -> String {
    KIK_API_BASE.into()
}

impl KikConfig {
    /// Reads `KIK_USERNAME`, `KIK_API_KEY` and `KIK_API_BASE`.
    pub fn from_env() -> Result<Self, AdapterError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AdapterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            username: required(&lookup, "KIK_USERNAME")?,
            api_key: required(&lookup, "KIK_API_KEY")?,
            api_base: non_blank(lookup("KIK_API_BASE")).unwrap_or_else(default_kik_api_base),
            instance_id: instance_id(&lookup),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessengerConfig {
    pub page_access_token: String,
    #[serde(default)]
    pub app_secret: Option<String>,
    #[serde(default)]
    pub verify_token: Option<String>,
    #[serde(default = "default_messenger_api_base")]
    pub api_base: String,
    #[serde(default = "new_instance_id")]
    pub instance_id: String,
}

fn default_messenger_api_base() -> String {
    MESSENGER_API_BASE.into()
}

impl MessengerConfig {
    /// Reads `MESSENGER_PAGE_ACCESS_TOKEN`, `MESSENGER_APP_SECRET`, `MESSENGER_VERIFY_TOKEN`
    /// and `MESSENGER_API_BASE`.
    pub fn from_env() -> Result<Self, AdapterError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AdapterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            page_access_token: required(&lookup, "MESSENGER_PAGE_ACCESS_TOKEN")?,
            app_secret: non_blank(lookup("MESSENGER_APP_SECRET")),
            verify_token: non_blank(lookup("MESSENGER_VERIFY_TOKEN")),
            api_base: non_blank(lookup("MESSENGER_API_BASE"))
                .unwrap_or_else(default_messenger_api_base),
            instance_id: instance_id(&lookup),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Number (or messaging service sender) replies are sent from.
    pub from_number: String,
    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,
    #[serde(default = "new_instance_id")]
    pub instance_id: String,
}

fn default_twilio_api_base() -> String {
    TWILIO_API_BASE.into()
}

impl SmsConfig {
    /// Reads `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_FROM_NUMBER` and
    /// `TWILIO_API_BASE`.
    pub fn from_env() -> Result<Self, AdapterError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AdapterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            account_sid: required(&lookup, "TWILIO_ACCOUNT_SID")?,
            auth_token: required(&lookup, "TWILIO_AUTH_TOKEN")?,
            from_number: required(&lookup, "TWILIO_FROM_NUMBER")?,
            api_base: non_blank(lookup("TWILIO_API_BASE")).unwrap_or_else(default_twilio_api_base),
            instance_id: instance_id(&lookup),
        })
    }
}

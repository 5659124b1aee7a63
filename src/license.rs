//! Gumroad license verification.
//!
//! One POST per verification against the product-permalink-scoped endpoint,
//! retried plainly on transport failure up to `max_retries`. The verdict is
//! rebuilt from the raw envelope on every call, never diffed against a prior
//! value: a `success: true` envelope can still verify invalid when the
//! purchase was refunded, disputed, or its subscription has ended.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseErrorCode {
    InvalidKey,
    Expired,
    NetworkError,
    InvalidResponse,
}

impl LicenseErrorCode {
    pub fn default_message(&self) -> &'static str {
        match self {
            LicenseErrorCode::InvalidKey => "This license key is not valid.",
            LicenseErrorCode::Expired => "This license has expired.",
            LicenseErrorCode::NetworkError => {
                "Could not reach the license server. Check your connection."
            }
            LicenseErrorCode::InvalidResponse => "The license server returned an unexpected response.",
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(self, LicenseErrorCode::NetworkError)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_id: String,
    pub activated_at: DateTime<Utc>,
}

/// Verified-license record, rebuilt on each verification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    pub email: Option<String>,
    pub uses: Option<u32>,
    pub purchased_at: Option<DateTime<Utc>>,
    pub subscription_ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub devices: Vec<DeviceInfo>,
    /// Grace period granted after a transient verification failure.
    pub grace_period_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct LicenseResult {
    pub valid: bool,
    pub error_code: Option<LicenseErrorCode>,
    pub info: Option<LicenseInfo>,
}

impl LicenseResult {
    fn invalid(code: LicenseErrorCode) -> Self {
        LicenseResult {
            valid: false,
            error_code: Some(code),
            info: None,
        }
    }
}

/// Raw Gumroad verify envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GumroadResponse {
    #[serde(default)]
    pub success: bool,
    pub uses: Option<u32>,
    pub message: Option<String>,
    pub purchase: Option<GumroadPurchase>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GumroadPurchase {
    pub email: Option<String>,
    #[serde(default)]
    pub refunded: bool,
    #[serde(default)]
    pub disputed: bool,
    pub created_at: Option<String>,
    pub subscription_ended_at: Option<String>,
}

/// Apply the verification rules to a raw envelope. Pure, so the rules are
/// testable without HTTP.
pub fn evaluate(response: &GumroadResponse, now: DateTime<Utc>) -> LicenseResult {
    if !response.success {
        return LicenseResult::invalid(LicenseErrorCode::InvalidKey);
    }
    let Some(purchase) = &response.purchase else {
        return LicenseResult::invalid(LicenseErrorCode::InvalidResponse);
    };
    if purchase.refunded || purchase.disputed {
        return LicenseResult::invalid(LicenseErrorCode::InvalidKey);
    }

    let subscription_ended_at = purchase
        .subscription_ended_at
        .as_deref()
        .and_then(parse_timestamp);
    if let Some(ended) = subscription_ended_at {
        if ended <= now {
            return LicenseResult::invalid(LicenseErrorCode::Expired);
        }
    }

    LicenseResult {
        valid: true,
        error_code: None,
        info: Some(LicenseInfo {
            email: purchase.email.clone(),
            uses: response.uses,
            purchased_at: purchase.created_at.as_deref().and_then(parse_timestamp),
            subscription_ended_at,
            devices: Vec::new(),
            grace_period_until: None,
        }),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

pub struct GumroadClient {
    endpoint: String,
    product_permalink: String,
    max_retries: u32,
    http: reqwest::blocking::Client,
}

impl GumroadClient {
    pub fn new(
        endpoint: impl Into<String>,
        product_permalink: impl Into<String>,
        max_retries: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent("postvault")
            .timeout(timeout)
            .build()?;
        Ok(GumroadClient {
            endpoint: endpoint.into(),
            product_permalink: product_permalink.into(),
            max_retries,
            http,
        })
    }

    /// Verify a license key. Never returns an Err: failures fold into an
    /// invalid [`LicenseResult`] with an error code.
    pub fn verify(&self, license_key: &str) -> LicenseResult {
        let mut attempts = 0;
        loop {
            match self.post_once(license_key) {
                Ok(response) => return evaluate(&response, Utc::now()),
                Err(code) => {
                    attempts += 1;
                    if !code.retryable() || attempts > self.max_retries {
                        return LicenseResult::invalid(code);
                    }
                }
            }
        }
    }

    fn post_once(&self, license_key: &str) -> Result<GumroadResponse, LicenseErrorCode> {
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[
                ("product_permalink", self.product_permalink.as_str()),
                ("license_key", license_key),
            ])
            .send()
            .map_err(|_| LicenseErrorCode::NetworkError)?;

        // Gumroad answers 404 with a success:false body for unknown keys;
        // parse the body rather than trusting the status alone.
        response
            .json::<GumroadResponse>()
            .map_err(|_| LicenseErrorCode::InvalidResponse)
    }
}

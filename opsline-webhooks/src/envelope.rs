//! Signed webhook envelopes

use chrono::{DateTime, SecondsFormat, Utc};
use opsline_events::DomainEvent;

use crate::{Result, WebhookSignature, headers};

/// One outbound webhook request, computed per delivery attempt.
///
/// Never cached between attempts: the tenant may rotate its secret in
/// between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    /// Serialized [`DomainEvent`]
    pub body: Vec<u8>,
    /// Hex HMAC-SHA256 of `body`; `None` when the tenant has no secret
    pub signature: Option<String>,
    pub event_type: String,
    pub event_id: String,
    /// RFC 3339 seal time
    pub timestamp: String,
}

impl SignedEnvelope {
    /// Serialize and sign an event.
    ///
    /// An empty secret counts as no secret.
    pub fn seal(event: &DomainEvent, secret: Option<&str>) -> Result<Self> {
        Self::seal_at(event, secret, Utc::now())
    }

    /// Like [`seal`](Self::seal) with an explicit timestamp
    pub fn seal_at(event: &DomainEvent, secret: Option<&str>, at: DateTime<Utc>) -> Result<Self> {
        let body = event.to_json_bytes()?;
        let signature = secret
            .filter(|secret| !secret.is_empty())
            .map(|secret| WebhookSignature::new(secret).sign(&body));

        Ok(Self {
            body,
            signature,
            event_type: event.event_type.clone(),
            event_id: event.event_id.to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    /// Headers to send with the body
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("Content-Type", "application/json".to_string()),
            (headers::EVENT_TYPE, self.event_type.clone()),
            (headers::TIMESTAMP, self.timestamp.clone()),
            (headers::WEBHOOK_ID, self.event_id.clone()),
        ];
        if let Some(signature) = &self.signature {
            out.push((headers::SIGNATURE, signature.clone()));
        }
        out
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

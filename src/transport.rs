use std::time::Duration;

use serde_json::Value;
use tracing::{error, trace};

use crate::logger::MessageLogger;
use crate::protocol::API_PATH;
use crate::{Error, Result};

/// Request/response channel to the device's single API endpoint.
///
/// A payload makes the request a POST with a JSON body, no payload a GET.
/// Every failure is logged here with the URI and payload before being
/// returned, so callers only need to branch on it.
pub(crate) struct Transport {
    http: reqwest::Client,
    uri: String,
    logger: Option<MessageLogger>,
}

impl Transport {
    pub fn new(
        protocol: &str,
        host: &str,
        timeout: Duration,
        logger: Option<MessageLogger>,
    ) -> Result<Self> {
        // Devices ship self-signed certificates when served over https.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .connect_timeout(timeout / 2)
            .read_timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            uri: format!("{protocol}://{host}/{API_PATH}"),
            logger,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub async fn send(&mut self, kind: &str, payload: Option<&Value>) -> Result<Value> {
        let method = if payload.is_some() { "POST" } else { "GET" };
        trace!(uri = %self.uri, method, ?payload, "sending request");
        if let Some(ref mut logger) = self.logger {
            logger.log_request(method, &self.uri, payload);
        }

        match self.exchange(payload).await {
            Ok(reply) => {
                if let Some(ref mut logger) = self.logger {
                    logger.log_reply(kind, &reply);
                }
                Ok(reply)
            }
            Err(e) => {
                error!(uri = %self.uri, ?payload, error = %e, "request to {kind} endpoint failed");
                if let Some(ref mut logger) = self.logger {
                    logger.log_failure(&self.uri, &e.to_string());
                }
                Err(e)
            }
        }
    }

    async fn exchange(&self, payload: Option<&Value>) -> Result<Value> {
        let request = match payload {
            Some(body) => self.http.post(&self.uri).json(body),
            None => self.http.get(&self.uri),
        };

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

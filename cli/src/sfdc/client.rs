//! HTTP transport for SOAP calls

use std::time::Duration;

use reqwest::{header, Client};
use tracing::{debug, error};

use crate::errors::CommandError;
use crate::sfdc::soap::{self, Fault};

/// Outcome of a SOAP POST: either the response body or a parsed fault
#[derive(Debug)]
pub enum SoapResponse {
    Ok(String),
    Fault(Fault),
}

/// HTTP client for SOAP endpoints
pub struct SoapClient {
    client: Client,
}

impl SoapClient {
    /// Create a new client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, CommandError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mavensmate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// POST an envelope to `url`.
    ///
    /// SOAP faults arrive with a 500 status, so the body is inspected for a
    /// fault before the status is treated as a transport failure.
    pub async fn post(&self, url: &str, action: &str, envelope: String) -> Result<SoapResponse, CommandError> {
        debug!("POST {} ({})", url, action);

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", action)
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if let Some(fault) = soap::fault(&body) {
            debug!("SOAP fault from {}: {}", url, fault.code);
            return Ok(SoapResponse::Fault(fault));
        }

        if !status.is_success() {
            error!("SOAP POST failed: {} - {}", status, body);
            return Err(CommandError::remote(format!("{}: {}", status, body)));
        }

        Ok(SoapResponse::Ok(body))
    }
}

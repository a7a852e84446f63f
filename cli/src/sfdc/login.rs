//! Partner API login

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::errors::CommandError;
use crate::sfdc::client::{SoapClient, SoapResponse};
use crate::sfdc::soap;
use crate::sfdc::{Authenticator, Credentials, Session};

const PARTNER_NS: &str = "urn:partner.soap.sforce.com";

/// Username/password login against the partner SOAP endpoint
pub struct SalesforceAuthenticator {
    client: Arc<SoapClient>,
    default_login_url: String,
    api_version: String,
}

impl SalesforceAuthenticator {
    pub fn new(client: Arc<SoapClient>, default_login_url: &str, api_version: &str) -> Self {
        Self {
            client,
            default_login_url: default_login_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
        }
    }

    fn login_endpoint(&self, credentials: &Credentials) -> String {
        let base = credentials
            .login_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(&self.default_login_url);
        format!("{}/services/Soap/u/{}", base, self.api_version)
    }

    fn metadata_url(&self, server_url: &str) -> String {
        server_url.replace("/Soap/u/", "/Soap/m/")
    }
}

#[async_trait]
impl Authenticator for SalesforceAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, CommandError> {
        let endpoint = self.login_endpoint(credentials);
        info!("Authenticating {} against {}", credentials.username, endpoint);

        let body = format!(
            "<ns:login><ns:username>{}</ns:username><ns:password>{}</ns:password></ns:login>",
            soap::escape(&credentials.username),
            soap::escape(credentials.password.expose_secret()),
        );
        let envelope = soap::envelope(PARTNER_NS, None, &body);

        let response = match self.client.post(&endpoint, "login", envelope).await? {
            SoapResponse::Ok(body) => body,
            SoapResponse::Fault(fault) => return Err(CommandError::Authentication(fault.message)),
        };

        let session_id = soap::element_text(&response, "sessionId").ok_or_else(|| {
            CommandError::Authentication("Login response did not contain a session id".to_string())
        })?;
        let server_url = soap::element_text(&response, "serverUrl").ok_or_else(|| {
            CommandError::Authentication("Login response did not contain a server URL".to_string())
        })?;
        let metadata_url = soap::element_text(&response, "metadataServerUrl")
            .unwrap_or_else(|| self.metadata_url(&server_url));

        let instance_url = url::Url::parse(&server_url)
            .map(|u| u.origin().ascii_serialization())
            .map_err(|e| CommandError::Authentication(format!("Invalid server URL {}: {}", server_url, e)))?;

        debug!("Authenticated, instance: {}", instance_url);

        Ok(Session {
            access_token: SecretString::from(session_id),
            instance_url,
            metadata_url,
            user_id: soap::element_text(&response, "userId"),
        })
    }
}

//! Metadata API engine over SOAP

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use mm_api::{AsyncResult, ComponentFailure, DeployOptions, DeployResult, RetrieveResult, TestFailure};
use secrecy::ExposeSecret;
use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;

use crate::deploy::{DeployRequest, MetadataEngine, RetrieveRequest};
use crate::errors::CommandError;
use crate::project::package::render_package_xml;
use crate::sfdc::client::{SoapClient, SoapResponse};
use crate::sfdc::{soap, Session};

const METADATA_NS: &str = "http://soap.sforce.com/2006/04/metadata";

/// Top-level folder of an unpackaged retrieve archive
const RETRIEVE_ROOT: &str = "unpackaged";

/// Sibling of `src/` a retrieve is unpacked into before it replaces `src/`
const RETRIEVE_STAGING: &str = ".retrieve";

/// `DeployOptions` element order required by the Metadata WSDL
const DEPLOY_OPTION_ORDER: &[&str] = &[
    "allowMissingFiles",
    "autoUpdatePackage",
    "checkOnly",
    "ignoreWarnings",
    "performRetrieve",
    "purgeOnDelete",
    "rollbackOnError",
    "runAllTests",
    "runTests",
    "singlePackage",
    "testLevel",
];

/// Deploys and retrieves through the Metadata SOAP API.
///
/// Both calls are submitted, then polled until the remote side reports
/// `done`. A deploy resolves with its final [`DeployResult`]; a retrieve
/// replaces the project's `src/` with the returned archive.
pub struct SoapMetadataEngine {
    client: Arc<SoapClient>,
    api_version: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl SoapMetadataEngine {
    pub fn new(client: Arc<SoapClient>, api_version: &str) -> Self {
        Self {
            client,
            api_version: api_version.to_string(),
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(600),
        }
    }

    /// Status poll interval and the overall wait for `done`
    pub fn with_polling(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.timeout = timeout;
        self
    }

    /// Issue one call and return the raw response; faults become remote errors
    async fn call(&self, session: &Session, action: &str, body: &str) -> Result<String, CommandError> {
        let envelope = soap::envelope(METADATA_NS, Some(session.access_token.expose_secret()), body);
        match self.client.post(&session.metadata_url, action, envelope).await? {
            SoapResponse::Ok(response) => Ok(response),
            SoapResponse::Fault(fault) => Err(CommandError::RemoteOperation {
                message: fault.message,
                details: Some(serde_json::json!({ "faultcode": fault.code })),
            }),
        }
    }

    async fn submit(&self, session: &Session, action: &str, body: &str) -> Result<AsyncResult, CommandError> {
        let response = self.call(session, action, body).await?;
        let id = soap::element_text(&response, "id")
            .ok_or_else(|| CommandError::remote(format!("{} response did not contain an id", action)))?;

        Ok(AsyncResult {
            id,
            state: soap::element_text(&response, "state"),
            done: soap::element_text(&response, "done").as_deref() == Some("true"),
        })
    }

    /// Call `action` until `parse` reports a finished result
    async fn poll<T>(
        &self,
        session: &Session,
        id: &str,
        action: &str,
        body: &str,
        parse: fn(&str) -> Result<(T, bool), CommandError>,
    ) -> Result<T, CommandError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let response = self.call(session, action, body).await?;
            let (result, done) = parse(&response)?;
            if done {
                return Ok(result);
            }

            if Instant::now() >= deadline {
                return Err(CommandError::RemoteOperation {
                    message: format!("{} did not finish within {}s", id, self.timeout.as_secs()),
                    details: Some(serde_json::json!({ "id": id })),
                });
            }
            debug!("{} not done, checking again in {:?}", id, self.poll_interval);
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl MetadataEngine for SoapMetadataEngine {
    async fn execute_remote(
        &self,
        request: &DeployRequest,
        deploy_options: Option<&DeployOptions>,
    ) -> Result<Value, CommandError> {
        let session = request.project.require_session()?;
        let package_xml = render_package_xml(&request.package, &self.api_version);
        let src = request.project.src_dir();

        let files = if src.exists().await { src.walk_files().await? } else { Vec::new() };
        let root = src.path().to_path_buf();
        debug!("Packaging {} files from {}", files.len(), root.display());

        let archive = tokio::task::spawn_blocking(move || build_archive(root, files, package_xml))
            .await
            .map_err(|e| CommandError::Internal(format!("Packaging task failed: {}", e)))??;

        let body = format!(
            "<ns:deploy><ns:ZipFile>{}</ns:ZipFile>{}</ns:deploy>",
            BASE64.encode(archive),
            deploy_options_xml(deploy_options)
        );

        info!("Deploying {} to {}", request.project.settings().project_name, session.instance_url);
        let submitted = self.submit(session, "deploy", &body).await?;

        let check = format!(
            "<ns:checkDeployStatus><ns:asyncProcessId>{}</ns:asyncProcessId>\
             <ns:includeDetails>true</ns:includeDetails></ns:checkDeployStatus>",
            soap::escape(&submitted.id)
        );
        let result = self
            .poll(session, &submitted.id, "checkDeployStatus", &check, parse_deploy_result)
            .await?;
        info!("Deploy {} finished: {}", result.id, result.status);

        if !result.success {
            let message = result.error_message.clone().unwrap_or_else(|| {
                format!(
                    "Deploy {}: {} component error(s), {} test error(s)",
                    result.status, result.number_component_errors, result.number_test_errors
                )
            });
            return Err(CommandError::RemoteOperation {
                message,
                details: Some(serde_json::to_value(&result)?),
            });
        }

        Ok(serde_json::to_value(result)?)
    }

    async fn retrieve(&self, request: &RetrieveRequest) -> Result<Value, CommandError> {
        let session = request.project.require_session()?;

        let mut types = String::new();
        for (type_name, members) in request.package.types() {
            types.push_str("<ns:types>");
            for member in members.names() {
                types.push_str(&format!("<ns:members>{}</ns:members>", soap::escape(member)));
            }
            types.push_str(&format!("<ns:name>{}</ns:name></ns:types>", soap::escape(type_name)));
        }

        let body = format!(
            "<ns:retrieve><ns:retrieveRequest><ns:apiVersion>{}</ns:apiVersion>\
             <ns:unpackaged>{}</ns:unpackaged></ns:retrieveRequest></ns:retrieve>",
            soap::escape(&self.api_version),
            types
        );

        info!("Retrieving into {}", request.project.settings().project_name);
        let submitted = self.submit(session, "retrieve", &body).await?;

        let check = format!(
            "<ns:checkRetrieveStatus><ns:asyncProcessId>{}</ns:asyncProcessId>\
             <ns:includeZip>true</ns:includeZip></ns:checkRetrieveStatus>",
            soap::escape(&submitted.id)
        );
        let (mut result, zip_file) = self
            .poll(session, &submitted.id, "checkRetrieveStatus", &check, parse_retrieve_result)
            .await?;

        if !result.success {
            return Err(CommandError::RemoteOperation {
                message: result
                    .error_message
                    .clone()
                    .unwrap_or_else(|| format!("Retrieve {}", result.status)),
                details: Some(serde_json::to_value(&result)?),
            });
        }

        let zip_file = zip_file.ok_or_else(|| CommandError::remote("Retrieve result did not contain a zip file"))?;
        let archive = BASE64
            .decode(zip_file.split_whitespace().collect::<String>())
            .map_err(|e| CommandError::remote(format!("Retrieve returned an invalid zip file: {}", e)))?;

        let project_dir = request.project.path().to_path_buf();
        result.files = tokio::task::spawn_blocking(move || unpack_archive(archive, &project_dir))
            .await
            .map_err(|e| CommandError::Internal(format!("Unpacking task failed: {}", e)))??;
        info!("Retrieve {} unpacked {} files", result.id, result.files.len());

        Ok(serde_json::to_value(result)?)
    }
}

fn text_flag(body: &str, tag: &str) -> Option<bool> {
    soap::element_text(body, tag).map(|v| v == "true")
}

fn text_count(body: &str, tag: &str) -> u32 {
    soap::element_text(body, tag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// `checkDeployStatus` response; component records live under `details`
fn parse_deploy_result(response: &str) -> Result<(DeployResult, bool), CommandError> {
    let details = soap::elements(response, "details").first().copied().unwrap_or_default();
    let top = soap::strip_elements(response, "details");

    let id = soap::element_text(&top, "id")
        .ok_or_else(|| CommandError::remote("Deploy status did not contain an id"))?;

    let component_failures = soap::elements(details, "componentFailures")
        .into_iter()
        .map(|failure| ComponentFailure {
            component_type: soap::element_text(failure, "componentType"),
            file_name: soap::element_text(failure, "fileName"),
            full_name: soap::element_text(failure, "fullName"),
            problem: soap::element_text(failure, "problem").unwrap_or_default(),
            problem_type: soap::element_text(failure, "problemType"),
            line_number: soap::element_text(failure, "lineNumber").and_then(|n| n.parse().ok()),
        })
        .collect();

    let test_failures = soap::elements(details, "runTestResult")
        .into_iter()
        .flat_map(|run| soap::elements(run, "failures"))
        .map(|failure| TestFailure {
            name: soap::element_text(failure, "name").unwrap_or_default(),
            method_name: soap::element_text(failure, "methodName"),
            message: soap::element_text(failure, "message").unwrap_or_default(),
            stack_trace: soap::element_text(failure, "stackTrace"),
        })
        .collect();

    let done = text_flag(&top, "done").unwrap_or(false);
    let result = DeployResult {
        id,
        status: soap::element_text(&top, "status").unwrap_or_default(),
        success: text_flag(&top, "success").unwrap_or(false),
        done,
        check_only: text_flag(&top, "checkOnly").unwrap_or(false),
        error_message: soap::element_text(&top, "errorMessage"),
        number_components_deployed: text_count(&top, "numberComponentsDeployed"),
        number_component_errors: text_count(&top, "numberComponentErrors"),
        number_tests_completed: text_count(&top, "numberTestsCompleted"),
        number_test_errors: text_count(&top, "numberTestErrors"),
        component_failures,
        test_failures,
    };
    Ok((result, done))
}

/// `checkRetrieveStatus` response and its base64 archive, if present
fn parse_retrieve_result(response: &str) -> Result<((RetrieveResult, Option<String>), bool), CommandError> {
    let messages = soap::elements(response, "messages")
        .into_iter()
        .map(|m| {
            format!(
                "{}: {}",
                soap::element_text(m, "fileName").unwrap_or_default(),
                soap::element_text(m, "problem").unwrap_or_default()
            )
        })
        .collect();
    let top = soap::strip_elements(&soap::strip_elements(response, "fileProperties"), "messages");

    let id = soap::element_text(&top, "id")
        .ok_or_else(|| CommandError::remote("Retrieve status did not contain an id"))?;
    let status = soap::element_text(&top, "status").unwrap_or_default();
    let done = text_flag(&top, "done").unwrap_or(false);

    let result = RetrieveResult {
        id,
        success: text_flag(&top, "success").unwrap_or(status == "Succeeded"),
        status,
        done,
        error_message: soap::element_text(&top, "errorMessage"),
        files: Vec::new(),
        messages,
    };
    Ok(((result, soap::element_text(&top, "zipFile")), done))
}

fn zip_error(e: zip::result::ZipError) -> CommandError {
    CommandError::Internal(format!("Unable to process metadata archive: {}", e))
}

fn build_archive(root: PathBuf, files: Vec<PathBuf>, package_xml: String) -> Result<Vec<u8>, CommandError> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    zip.start_file("package.xml", options).map_err(zip_error)?;
    zip.write_all(package_xml.as_bytes())?;

    for relative in files {
        if relative == PathBuf::from("package.xml") {
            continue;
        }
        let name = relative.to_string_lossy().replace('\\', "/");
        zip.start_file(name, options).map_err(zip_error)?;
        zip.write_all(&std::fs::read(root.join(&relative))?)?;
    }

    Ok(zip.finish().map_err(zip_error)?.into_inner())
}

/// Unpack a retrieve archive and swap it in as `<project>/src`.
///
/// Returns the unpacked paths relative to `src/`, sorted.
fn unpack_archive(archive: Vec<u8>, project_dir: &Path) -> Result<Vec<String>, CommandError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive)).map_err(zip_error)?;
    let staging = project_dir.join(RETRIEVE_STAGING);
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    let mut files = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_error)?;
        let Some(name) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        let relative = name
            .strip_prefix(RETRIEVE_ROOT)
            .map(Path::to_path_buf)
            .unwrap_or(name);
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = staging.join(&relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        files.push(relative.to_string_lossy().replace('\\', "/"));
    }

    let src = project_dir.join("src");
    if src.exists() {
        std::fs::remove_dir_all(&src)?;
    }
    std::fs::rename(&staging, &src)?;

    files.sort();
    Ok(files)
}

/// `<ns:DeployOptions>` for the flags that were set, in WSDL order.
///
/// Scalar and string-list entries of `extra` are rendered under their own
/// names; unknown names follow the known ones.
fn deploy_options_xml(options: Option<&DeployOptions>) -> String {
    let Some(options) = options else {
        return String::new();
    };

    let mut fields: Vec<(String, String)> = Vec::new();
    let known = [
        ("allowMissingFiles", options.allow_missing_files),
        ("checkOnly", options.check_only),
        ("ignoreWarnings", options.ignore_warnings),
        ("purgeOnDelete", options.purge_on_delete),
        ("rollbackOnError", options.rollback_on_error),
        ("runAllTests", options.run_all_tests),
        ("singlePackage", options.single_package),
    ];
    for (name, value) in known {
        if let Some(value) = value {
            fields.push((name.to_string(), value.to_string()));
        }
    }
    for test in &options.run_tests {
        fields.push(("runTests".to_string(), soap::escape(test)));
    }
    if let Some(level) = &options.test_level {
        fields.push(("testLevel".to_string(), level.as_str().to_string()));
    }

    for (name, value) in &options.extra {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            warn!("Ignoring deploy option with invalid name: {:?}", name);
            continue;
        }
        match value {
            Value::Bool(b) => fields.push((name.clone(), b.to_string())),
            Value::Number(n) => fields.push((name.clone(), n.to_string())),
            Value::String(s) => fields.push((name.clone(), soap::escape(s))),
            Value::Array(items) => {
                for item in items.iter().filter_map(Value::as_str) {
                    fields.push((name.clone(), soap::escape(item)));
                }
            }
            _ => warn!("Ignoring deploy option {} with unsupported value", name),
        }
    }

    let rank = |name: &str| {
        DEPLOY_OPTION_ORDER
            .iter()
            .position(|known| *known == name)
            .unwrap_or(DEPLOY_OPTION_ORDER.len())
    };
    // Stable: repeated runTests keep their order, unknown extras stay sorted by name.
    fields.sort_by_key(|(name, _)| rank(name));

    let body: String = fields
        .iter()
        .map(|(name, value)| format!("<ns:{0}>{1}</ns:{0}>", name, value))
        .collect();
    format!("<ns:DeployOptions>{}</ns:DeployOptions>", body)
}

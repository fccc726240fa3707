//! Remote object access.
//!
//! The [`Transfer`] trait is the analyzer's only view of remote storage: it
//! can turn a locator into a URL the measurement tool reads directly, and it
//! can copy an object to a local path. [`DefaultTransfer`] implements both
//! for HTTP(S) URLs (streaming the body to disk with `reqwest`) and for
//! `s3://` objects (through the `aws` command-line client, which presigns
//! URLs and copies objects).
//!
//! S3 credentials are resolved by [`S3Credentials`]: `S3_*` variables take
//! priority over the standard `AWS_*` ones.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::LoudnessError;
use crate::locator::SourceLocator;

/// Lifetime of presigned URLs handed to the measurement tool.
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// Access to remote sources.
pub trait Transfer: Send + Sync {
    /// A URL the measurement tool can read `locator` from without a local
    /// copy. HTTP locators are returned as-is; S3 objects are presigned.
    fn stream_url(
        &self,
        locator: &SourceLocator,
    ) -> impl Future<Output = Result<String, LoudnessError>> + Send;

    /// Copy `locator` to `destination`, creating or truncating it.
    ///
    /// On error, `destination` may hold a partial file; the caller owns its
    /// removal.
    fn fetch(
        &self,
        locator: &SourceLocator,
        destination: &Path,
    ) -> impl Future<Output = Result<(), LoudnessError>> + Send;
}

/// S3 credentials and endpoint settings.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct S3Credentials {
    /// Access key id.
    pub access_key_id: Option<String>,
    /// Secret access key.
    pub secret_access_key: Option<String>,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
    /// Bucket region.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores.
    pub endpoint_url: Option<String>,
}

impl Debug for S3Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("has_secret_access_key", &self.secret_access_key.is_some())
            .field("has_session_token", &self.session_token.is_some())
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl S3Credentials {
    /// Resolve from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve through `lookup`, preferring `S3_*` names over `AWS_*`.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |preferred: &str, standard: &str| {
            lookup(preferred)
                .filter(|value| !value.is_empty())
                .or_else(|| lookup(standard).filter(|value| !value.is_empty()))
        };

        Self {
            access_key_id: pick("S3_ACCESS_KEY_ID", "AWS_ACCESS_KEY_ID"),
            secret_access_key: pick("S3_SECRET_ACCESS_KEY", "AWS_SECRET_ACCESS_KEY"),
            session_token: pick("S3_SESSION_TOKEN", "AWS_SESSION_TOKEN"),
            region: pick("S3_REGION", "AWS_REGION"),
            endpoint_url: pick("S3_ENDPOINT_URL", "AWS_ENDPOINT_URL"),
        }
    }

    /// Export the resolved values to the `aws` client's environment.
    fn apply(&self, command: &mut Command) {
        let pairs = [
            ("AWS_ACCESS_KEY_ID", &self.access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &self.secret_access_key),
            ("AWS_SESSION_TOKEN", &self.session_token),
            ("AWS_REGION", &self.region),
        ];
        for (name, value) in pairs {
            if let Some(value) = value {
                command.env(name, value);
            }
        }
        if let Some(endpoint) = &self.endpoint_url {
            command.arg("--endpoint-url").arg(endpoint);
        }
    }
}

/// HTTP downloads via `reqwest`, S3 access via the `aws` client.
#[derive(Debug, Clone)]
pub struct DefaultTransfer {
    http: reqwest::Client,
    credentials: S3Credentials,
    aws_cli: PathBuf,
}

impl Default for DefaultTransfer {
    fn default() -> Self {
        Self::new(S3Credentials::from_env())
    }
}

impl DefaultTransfer {
    /// Create a transfer using `credentials` for S3 objects.
    pub fn new(credentials: S3Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            aws_cli: PathBuf::from("aws"),
        }
    }

    /// Use a specific `aws` client binary.
    #[must_use]
    pub fn with_aws_cli(mut self, program: impl Into<PathBuf>) -> Self {
        self.aws_cli = program.into();
        self
    }

    async fn run_aws(&self, locator: &SourceLocator, args: &[&str]) -> Result<Vec<u8>, LoudnessError> {
        let mut command = Command::new(&self.aws_cli);
        command.args(args);
        self.credentials.apply(&mut command);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!("Running {} {}", self.aws_cli.display(), args.join(" "));

        let output = command
            .output()
            .await
            .map_err(|error| transfer_error(locator, format!("failed to run aws client: {error}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(transfer_error(
                locator,
                format!("aws client exited with {:?}: {}", output.status.code(), stderr.trim()),
            ));
        }
        Ok(output.stdout)
    }

    async fn download_http(
        &self,
        locator: &SourceLocator,
        url: &str,
        destination: &Path,
    ) -> Result<(), LoudnessError> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| transfer_error(locator, error.to_string()))?;

        let io_error = |error: std::io::Error| transfer_error(locator, error.to_string());
        let mut file = File::create(destination).await.map_err(io_error)?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|error| transfer_error(locator, error.to_string()))?
        {
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;

        log::debug!("Downloaded {written} bytes to {}", destination.display());
        Ok(())
    }
}

impl Transfer for DefaultTransfer {
    async fn stream_url(&self, locator: &SourceLocator) -> Result<String, LoudnessError> {
        match locator {
            SourceLocator::Http { url, .. } => Ok(url.clone()),
            SourceLocator::S3 { .. } => {
                let object = locator.to_string();
                let expiry = PRESIGN_EXPIRY.as_secs().to_string();
                let stdout = self
                    .run_aws(locator, &["s3", "presign", object.as_str(), "--expires-in", expiry.as_str()])
                    .await?;
                let url = String::from_utf8_lossy(&stdout).trim().to_string();
                if url.is_empty() {
                    return Err(transfer_error(locator, "aws client returned no presigned URL"));
                }
                Ok(url)
            }
            SourceLocator::Local(_) => Err(transfer_error(locator, "local paths are not remote")),
        }
    }

    async fn fetch(&self, locator: &SourceLocator, destination: &Path) -> Result<(), LoudnessError> {
        log::info!("Downloading {locator} to {}", destination.display());
        match locator {
            SourceLocator::Http { url, .. } => self.download_http(locator, url, destination).await,
            SourceLocator::S3 { .. } => {
                let object = locator.to_string();
                let target = destination.to_string_lossy().into_owned();
                self.run_aws(locator, &["s3", "cp", object.as_str(), target.as_str(), "--only-show-errors"])
                    .await
                    .map(|_| ())
            }
            SourceLocator::Local(_) => Err(transfer_error(locator, "local paths are not remote")),
        }
    }
}

fn transfer_error(locator: &SourceLocator, reason: impl Into<String>) -> LoudnessError {
    LoudnessError::TransferFailed {
        locator: locator.to_string(),
        reason: reason.into(),
    }
}

//! HTTP client for the package-firewall policy service.
//!
//! Every outcome folds into a closed result type; nothing here surfaces an
//! `Err` to its callers. Inability to prove a package safe is a block
//! (fail-closed), so transport failures, timeouts, and unexpected statuses
//! all land on the block branch.
//!
//! Endpoints consumed:
//! - `GET /simple/{package}/` — index existence check
//! - `GET /blocked/{package}` — block reasons and version list
//! - `GET /simple/` — connectivity probe

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Firewall base URL used when no override is configured.
pub const DEFAULT_FIREWALL_URL: &str = "http://127.0.0.1:8000";

/// Timeout for validation calls against the firewall.
const VALIDATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the lightweight connectivity probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ── Result types ──────────────────────────────────────────────────────────────

/// Final verdict for one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block,
}

/// Outcome of validating one package against the firewall.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub verdict: Verdict,
    /// Human-readable reason; always non-empty for a block.
    pub reason: String,
    /// Structured block details when the firewall supplied them.
    pub details: Option<BlockedInfo>,
}

impl ValidationResult {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Allow,
            reason: reason.into(),
            details: None,
        }
    }

    fn block(reason: impl Into<String>, details: Option<BlockedInfo>) -> Self {
        Self {
            verdict: Verdict::Block,
            reason: reason.into(),
            details,
        }
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.verdict == Verdict::Block
    }
}

/// Block status reported by the detail endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    Blocked,
    Allowed,
    Unknown,
    Error,
}

/// Normalized view of the detail endpoint for one package.
#[derive(Debug, Clone, Serialize)]
pub struct BlockedInfo {
    pub package: String,
    pub status: BlockStatus,
    /// Number of blocked versions reported by the firewall.
    pub blocked_versions: u64,
    /// Blocked version strings; may contain the wildcard `"*"`.
    pub blocked_versions_list: Vec<String>,
    /// One entry per blocked version or condition.
    pub reasons: Vec<String>,
    /// Raw detail payload, retained for audit output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    /// Failure detail when `status` is `Unknown` or `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BlockedInfo {
    fn allowed(package: &str) -> Self {
        Self {
            package: package.to_string(),
            status: BlockStatus::Allowed,
            blocked_versions: 0,
            blocked_versions_list: Vec::new(),
            reasons: Vec::new(),
            raw: None,
            error: None,
        }
    }

    fn failed(package: &str, status: BlockStatus, error: String) -> Self {
        Self {
            package: package.to_string(),
            status,
            blocked_versions: 0,
            blocked_versions_list: Vec::new(),
            reasons: Vec::new(),
            raw: None,
            error: Some(error),
        }
    }
}

// ── Transport classification ──────────────────────────────────────────────────

/// Transport-level failure classes, mapped once per call site.
#[derive(Debug, Error)]
enum FetchError {
    #[error("Cannot connect to firewall at {0}")]
    Connection(String),
    #[error("Firewall validation timeout")]
    Timeout,
    #[error("Firewall request failed: {0}")]
    Other(String),
}

fn classify(err: &reqwest::Error, base_url: &str) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::Connection(base_url.to_string())
    } else {
        FetchError::Other(err.to_string())
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Client for the package-firewall API.
///
/// Holds one connection pool for the whole invocation; dropping the client on
/// any exit path releases it.
pub struct FirewallClient {
    base_url: String,
    http: reqwest::Client,
}

impl FirewallClient {
    /// Build a client for the given base URL. Trailing slashes are trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(VALIDATE_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL a user can open to see why a package is blocked.
    #[must_use]
    pub fn audit_url(&self, package: &str) -> String {
        format!("{}/blocked/{}", self.base_url, package.to_lowercase())
    }

    /// Validate a package (and optionally an exact version) against the
    /// firewall. Never fails: every error class folds into a block verdict.
    pub async fn validate(&self, package: &str, version: Option<&str>) -> ValidationResult {
        let package = package.to_lowercase();
        let url = format!("{}/simple/{}/", self.base_url, package);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return ValidationResult::block(classify(&e, &self.base_url).to_string(), None),
        };

        match response.status().as_u16() {
            403 => {
                let info = self.blocked_info(&package).await;
                let reason = if info.reasons.is_empty() {
                    "Package is blocked by firewall policy".to_string()
                } else {
                    info.reasons.join("; ")
                };
                ValidationResult::block(reason, Some(info))
            }
            404 => ValidationResult::block("Package not found in index", None),
            200 => match version {
                Some(version) => self.validate_version(&package, version).await,
                None => ValidationResult::allow("Package passed security validation"),
            },
            status => ValidationResult::block(
                format!("Unexpected response from firewall: {status}"),
                None,
            ),
        }
    }

    /// The package exists at the index level; check whether this exact
    /// version is on the block list.
    async fn validate_version(&self, package: &str, version: &str) -> ValidationResult {
        let info = self.blocked_info(package).await;
        if info.status == BlockStatus::Blocked
            && info
                .blocked_versions_list
                .iter()
                .any(|v| v == version || v == "*")
        {
            let reason = info
                .reasons
                .iter()
                .find(|r| r.contains(version))
                .cloned()
                .unwrap_or_else(|| format!("Version {version} is blocked"));
            return ValidationResult::block(reason, Some(info));
        }
        ValidationResult::allow("Package passed security validation")
    }

    /// Fetch and normalize the detail endpoint for a package. Never fails;
    /// transport and protocol errors land on the `Unknown`/`Error` branches.
    ///
    /// This is the single source of truth for *why* a package is blocked —
    /// [`validate`](Self::validate) never fabricates reasons on its own.
    pub async fn blocked_info(&self, package: &str) -> BlockedInfo {
        let package = package.to_lowercase();
        let url = format!("{}/blocked/{}", self.base_url, package);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return BlockedInfo::failed(
                    &package,
                    BlockStatus::Error,
                    classify(&e, &self.base_url).to_string(),
                );
            }
        };

        match response.status().as_u16() {
            404 => BlockedInfo::allowed(&package),
            200 => match response.json::<Value>().await {
                Ok(raw) => parse_blocked_payload(&package, raw),
                Err(e) => BlockedInfo::failed(
                    &package,
                    BlockStatus::Error,
                    format!("Malformed firewall response: {e}"),
                ),
            },
            status => BlockedInfo::failed(
                &package,
                BlockStatus::Unknown,
                format!("Unexpected status code: {status}"),
            ),
        }
    }

    /// Lightweight reachability check. A 200 or 404 both prove the service
    /// is alive and routing requests; anything else counts as unreachable.
    pub async fn check_connectivity(&self) -> bool {
        let url = format!("{}/simple/", self.base_url);
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => matches!(response.status().as_u16(), 200 | 404),
            Err(_) => false,
        }
    }
}

/// Pull the known fields out of a 200 detail payload. Missing or mistyped
/// fields default to empty/zero; the raw body is retained for audit.
fn parse_blocked_payload(package: &str, raw: Value) -> BlockedInfo {
    let blocked_versions = raw
        .get("blocked_versions")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let blocked_versions_list = string_list(raw.get("blocked_versions_list"));
    let reasons = string_list(raw.get("reasons"));
    BlockedInfo {
        package: package.to_string(),
        status: BlockStatus::Blocked,
        blocked_versions,
        blocked_versions_list,
        reasons,
        raw: Some(raw),
        error: None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

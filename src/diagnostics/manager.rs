use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tracing::{error, info};

pub type ErrorContext = BTreeMap<String, String>;

/// Builds an [`ErrorContext`] from string pairs.
pub fn context(pairs: &[(&str, &str)]) -> ErrorContext {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    NetworkError,
    SyntaxError,
    TimeoutError,
    PermissionError,
    MemoryError,
    UnknownError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NetworkError => "NETWORK_ERROR",
            ErrorCategory::SyntaxError => "SYNTAX_ERROR",
            ErrorCategory::TimeoutError => "TIMEOUT_ERROR",
            ErrorCategory::PermissionError => "PERMISSION_ERROR",
            ErrorCategory::MemoryError => "MEMORY_ERROR",
            ErrorCategory::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn category_rules() -> &'static [(Regex, ErrorCategory)] {
    static RULES: OnceLock<Vec<(Regex, ErrorCategory)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?i)network|fetch|cors", ErrorCategory::NetworkError),
            (r"(?i)syntax|parse", ErrorCategory::SyntaxError),
            (r"(?i)timeout", ErrorCategory::TimeoutError),
            (r"(?i)permission|access", ErrorCategory::PermissionError),
            (r"(?i)memory|heap", ErrorCategory::MemoryError),
        ]
        .into_iter()
        .map(|(pattern, category)| (Regex::new(pattern).expect("static regex"), category))
        .collect()
    })
}

/// Keyword categorization of an error message. The first matching rule wins.
pub fn categorize(message: &str) -> ErrorCategory {
    category_rules()
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::UnknownError)
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EnvironmentSnapshot {
    pub os: &'static str,
    pub arch: &'static str,
    pub app_version: &'static str,
    pub uptime_ms: u128,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// The error's `source()` chain, one cause per line.
    pub stack: String,
    pub category: ErrorCategory,
    pub context: ErrorContext,
    pub environment: EnvironmentSnapshot,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    Failed,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EndpointProbe {
    pub status: ProbeStatus,
    /// 0 when no response was received.
    pub http_status: u16,
    pub response_time_ms: u128,
    pub status_text: String,
    pub error: Option<String>,
}

impl EndpointProbe {
    pub fn is_success(&self) -> bool {
        self.status == ProbeStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub name: String,
    pub url: String,
    pub critical: bool,
}

impl ProbeTarget {
    pub fn new(name: &str, url: &str, critical: bool) -> Self {
        ProbeTarget { name: name.to_string(), url: url.to_string(), critical }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct NamedProbe {
    pub name: String,
    pub url: String,
    pub critical: bool,
    #[serde(flatten)]
    pub probe: EndpointProbe,
}

#[derive(Serialize, Debug, Clone)]
pub struct ConnectivityReport {
    pub timestamp: DateTime<Utc>,
    pub endpoints: Vec<NamedProbe>,
}

#[derive(Serialize, Debug, Clone)]
pub struct DiagnosticReport {
    pub timestamp: DateTime<Utc>,
    pub system_health: u32,
    pub uptime_ms: u128,
    pub error_summary: BTreeMap<ErrorCategory, usize>,
    pub total_errors: usize,
    pub recent_errors: Vec<ErrorRecord>,
}

impl DiagnosticReport {
    /// Pretty JSON for pasting into a bug report.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

const CRITICAL_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const RECENT_ERRORS: usize = 5;

#[derive(Debug, Default)]
struct DiagnosticsState {
    records: Vec<ErrorRecord>,
    counts: BTreeMap<ErrorCategory, usize>,
}

/// Error log, per-category counters and uptime for one application run.
///
/// Constructed explicitly and shared as `Arc<Diagnostics>`; each test builds
/// its own so nothing leaks between runs.
#[derive(Debug)]
pub struct Diagnostics {
    started: Instant,
    state: Mutex<DiagnosticsState>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(started: Instant) -> Self {
        Diagnostics { started, state: Mutex::new(DiagnosticsState::default()) }
    }

    fn state(&self) -> MutexGuard<'_, DiagnosticsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    fn environment(&self) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            app_version: env!("CARGO_PKG_VERSION"),
            uptime_ms: self.uptime().as_millis(),
        }
    }

    /// Records `err`, bumps its category count and returns the record so the
    /// caller can pick a user-facing message from it.
    pub fn log_error(&self, err: &dyn Error, context: ErrorContext) -> ErrorRecord {
        let message = err.to_string();
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        let stack = if causes.is_empty() {
            "No stack trace available".to_string()
        } else {
            causes.join("\n")
        };

        let record = ErrorRecord {
            timestamp: Utc::now(),
            category: categorize(&message),
            message,
            stack,
            context,
            environment: self.environment(),
        };

        error!(
            category = %record.category,
            context = ?record.context,
            "{}",
            record.message
        );

        let mut state = self.state();
        state.records.push(record.clone());
        *state.counts.entry(record.category).or_insert(0) += 1;
        record
    }

    pub fn records(&self) -> Vec<ErrorRecord> {
        self.state().records.clone()
    }

    pub fn counts(&self) -> BTreeMap<ErrorCategory, usize> {
        self.state().counts.clone()
    }

    pub fn count(&self, category: ErrorCategory) -> usize {
        self.state().counts.get(&category).copied().unwrap_or(0)
    }

    /// 100 minus error penalties, plus a bonus after five minutes of uptime.
    pub fn health_score(&self) -> u32 {
        let (total, network) = {
            let state = self.state();
            (state.counts.values().sum::<usize>(), state.counts.get(&ErrorCategory::NetworkError).copied().unwrap_or(0))
        };
        let mut score: i64 = 100;
        score -= (total as i64 * 10).min(50);
        score -= (network as i64 * 20).min(40);
        if self.uptime() > Duration::from_secs(300) {
            score += 10;
        }
        score.clamp(0, 100) as u32
    }

    pub fn report(&self) -> DiagnosticReport {
        let system_health = self.health_score();
        let state = self.state();
        let recent_start = state.records.len().saturating_sub(RECENT_ERRORS);
        DiagnosticReport {
            timestamp: Utc::now(),
            system_health,
            uptime_ms: self.uptime().as_millis(),
            error_summary: state.counts.clone(),
            total_errors: state.records.len(),
            recent_errors: state.records[recent_start..].to_vec(),
        }
    }

    /// Bounded-timeout GET that only measures reachability and latency.
    pub fn test_endpoint(&self, url: &str, critical: bool) -> EndpointProbe {
        let timeout = if critical { CRITICAL_PROBE_TIMEOUT } else { PROBE_TIMEOUT };
        let started = Instant::now();
        let failed = |err: String| EndpointProbe {
            status: ProbeStatus::Failed,
            http_status: 0,
            response_time_ms: started.elapsed().as_millis(),
            status_text: String::new(),
            error: Some(err),
        };

        let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => return failed(e.to_string()),
        };
        match client.get(url).header(reqwest::header::ACCEPT, "application/json").send() {
            Ok(response) => {
                let status = response.status();
                let probe = EndpointProbe {
                    status: ProbeStatus::Success,
                    http_status: status.as_u16(),
                    response_time_ms: started.elapsed().as_millis(),
                    status_text: status.canonical_reason().unwrap_or_default().to_string(),
                    error: None,
                };
                info!(url, http_status = probe.http_status, ms = %probe.response_time_ms, "endpoint probe");
                probe
            }
            Err(e) => {
                let probe = failed(e.to_string());
                info!(url, error = %e, "endpoint probe failed");
                probe
            }
        }
    }

    pub fn diagnose_connectivity(&self, targets: &[ProbeTarget]) -> ConnectivityReport {
        let endpoints = targets
            .iter()
            .map(|t| NamedProbe {
                name: t.name.clone(),
                url: t.url.clone(),
                critical: t.critical,
                probe: self.test_endpoint(&t.url, t.critical),
            })
            .collect();
        ConnectivityReport { timestamp: Utc::now(), endpoints }
    }
}

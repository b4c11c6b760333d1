//! Health checks.
//!
//! Aggregates configuration warnings, extension-directory checks, and a
//! best-effort provider connectivity probe into one report. Warnings and
//! probe failures are informational; only an empty provider registry or a
//! directory we cannot create makes the report unhealthy.

use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use quill_core::config::ResolvedConfig;

use crate::engine::ChatEngine;

/// Outcome of a health check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall verdict.
    pub healthy: bool,
    /// Everything worth surfacing, fatal or not.
    pub issues: Vec<String>,
    /// The configuration file consulted.
    pub config_path: PathBuf,
}

pub(crate) fn evaluate(
    config: &ResolvedConfig,
    warnings: Vec<String>,
    extension_issues: Vec<String>,
    probe_issue: Option<String>,
    config_path: PathBuf,
) -> HealthReport {
    let healthy = !config.providers.is_empty() && extension_issues.is_empty();

    let mut issues = warnings;
    issues.extend(extension_issues);
    issues.extend(probe_issue);

    HealthReport {
        healthy,
        issues,
        config_path,
    }
}

impl ChatEngine {
    /// Runs the full health check.
    ///
    /// Missing extension directories are created on the spot; only a
    /// creation failure becomes an issue. The provider probe never throws;
    /// its failure is recorded as an issue.
    pub async fn health_check(&self) -> HealthReport {
        let config = self.config.config();
        let warnings = self.config.warnings().to_vec();

        let mut extension_issues = Vec::new();
        for (label, dir) in self.config.paths().extension_dirs(&config.paths) {
            if dir.exists() {
                continue;
            }
            match std::fs::create_dir_all(&dir) {
                Ok(()) => debug!("created {} directory at {}", label, dir.display()),
                Err(err) => extension_issues.push(format!(
                    "cannot create {} directory {}: {}",
                    label,
                    dir.display(),
                    err
                )),
            }
        }

        let probe_issue = match self.resolve_provider(None) {
            Ok(provider) => self
                .service
                .probe(&provider)
                .await
                .err()
                .map(|err| format!("connectivity probe failed: {}", err)),
            Err(err) => Some(format!("no default provider to probe: {}", err)),
        };

        evaluate(
            config,
            warnings,
            extension_issues,
            probe_issue,
            self.config.paths().config_file(),
        )
    }
}

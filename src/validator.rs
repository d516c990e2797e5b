//! Batch Validation Engine
//!
//! Validates many submission files against one compiled schema:
//! - **Async I/O**: submissions are read with tokio
//! - **Concurrent orchestration**: tokio::spawn creates one task per submission
//! - **Bounded concurrency**: a semaphore caps the tasks running at once
//! - **Timeouts**: each submission gets its own deadline

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FormError, Result};
use crate::schema::{FieldErrors, Schema};

/// Validation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Number of concurrent validations
    pub max_concurrent_validations: usize,
    /// Timeout for a single submission
    pub validation_timeout: Duration,
    /// Stop at the first submission that is not valid
    pub fail_fast: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_validations: num_cpus::get(),
            validation_timeout: Duration::from_secs(10),
            fail_fast: false,
        }
    }
}

/// Status of a single submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Every field passed
    Valid,
    /// One or more fields failed
    Invalid { errors: FieldErrors },
    /// The submission could not be read or parsed
    Error { message: String },
}

impl SubmissionStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, SubmissionStatus::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, SubmissionStatus::Invalid { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SubmissionStatus::Error { .. })
    }
}

/// Result of validating a single submission file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: SubmissionStatus,
    pub duration: Duration,
}

impl SubmissionResult {
    pub fn valid(path: PathBuf, duration: Duration) -> Self {
        Self {
            path,
            status: SubmissionStatus::Valid,
            duration,
        }
    }

    pub fn invalid(path: PathBuf, errors: FieldErrors, duration: Duration) -> Self {
        Self {
            path,
            status: SubmissionStatus::Invalid { errors },
            duration,
        }
    }

    pub fn error(path: PathBuf, error: FormError, duration: Duration) -> Self {
        Self {
            path,
            status: SubmissionStatus::Error {
                message: error.to_string(),
            },
            duration,
        }
    }
}

/// Aggregated results of validating multiple submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResults {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: usize,
    pub total_duration: Duration,
    pub average_duration: Duration,
    pub results: Vec<SubmissionResult>,
}

impl ValidationResults {
    /// Aggregate individual results into a summary
    pub fn aggregate(results: Vec<SubmissionResult>) -> Self {
        let total = results.len();
        let mut valid = 0;
        let mut invalid = 0;
        let mut errors = 0;
        let mut total_duration = Duration::ZERO;

        for result in &results {
            match result.status {
                SubmissionStatus::Valid => valid += 1,
                SubmissionStatus::Invalid { .. } => invalid += 1,
                SubmissionStatus::Error { .. } => errors += 1,
            }
            total_duration += result.duration;
        }

        let average_duration = if total > 0 {
            total_duration / total as u32
        } else {
            Duration::ZERO
        };

        Self {
            total,
            valid,
            invalid,
            errors,
            total_duration,
            average_duration,
            results,
        }
    }

    /// Check if all submissions validated successfully
    pub fn all_valid(&self) -> bool {
        self.valid == self.total && self.total > 0
    }

    /// Check if any submission failed or errored
    pub fn has_errors(&self) -> bool {
        self.errors > 0 || self.invalid > 0
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.valid as f64 / self.total as f64) * 100.0
        }
    }
}

pub struct ValidationEngine {
    schema: Arc<Schema>,
    config: ValidationConfig,
}

impl ValidationEngine {
    pub fn new(schema: impl Into<Arc<Schema>>, config: ValidationConfig) -> Self {
        Self {
            schema: schema.into(),
            config,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Expand directories into their `*.json` entries (sorted, non-recursive)
    pub async fn collect_submissions(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for path in paths {
            let metadata = tokio::fs::metadata(path).await?;
            if metadata.is_file() {
                files.push(path.clone());
                continue;
            }

            let mut entries = Vec::new();
            let mut read_dir = tokio::fs::read_dir(path).await?;
            while let Some(entry) = read_dir.next_entry().await? {
                let entry_path = entry.path();
                let is_json = entry_path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                if is_json && entry.file_type().await?.is_file() {
                    entries.push(entry_path);
                } else {
                    debug!(path = %entry_path.display(), "skipping non-submission entry");
                }
            }
            entries.sort();
            files.extend(entries);
        }

        Ok(files)
    }

    /// Validate every submission found at the given paths
    pub async fn validate_paths(&self, paths: &[PathBuf]) -> Result<ValidationResults> {
        let files = Self::collect_submissions(paths).await?;
        let results = if self.config.fail_fast {
            self.validate_files_fail_fast(files).await
        } else {
            self.validate_files(files).await?
        };
        Ok(ValidationResults::aggregate(results))
    }

    /// Validate a list of files concurrently
    pub async fn validate_files(&self, files: Vec<PathBuf>) -> Result<Vec<SubmissionResult>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(tokio::sync::Semaphore::new(
            self.config.max_concurrent_validations.max(1),
        ));

        let tasks: Vec<_> = files
            .into_iter()
            .map(|file_path| {
                let schema = Arc::clone(&self.schema);
                let semaphore = Arc::clone(&semaphore);
                let timeout = self.config.validation_timeout;

                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.map_err(|_| FormError::Concurrency {
                        details: "Failed to acquire validation semaphore".to_string(),
                    })?;

                    Ok::<SubmissionResult, FormError>(
                        Self::validate_with_timeout(&schema, file_path, timeout).await,
                    )
                })
            })
            .collect();

        let task_results = try_join_all(tasks)
            .await
            .map_err(|e| FormError::Concurrency {
                details: format!("Task join error: {}", e),
            })?;

        task_results.into_iter().collect()
    }

    /// Validate files one by one, stopping after the first that is not valid
    pub async fn validate_files_fail_fast(&self, files: Vec<PathBuf>) -> Vec<SubmissionResult> {
        let mut results = Vec::with_capacity(files.len());
        for file_path in files {
            let result =
                Self::validate_with_timeout(&self.schema, file_path, self.config.validation_timeout)
                    .await;
            let stop = !result.status.is_valid();
            results.push(result);
            if stop {
                debug!("stopping at first failed submission");
                break;
            }
        }
        results
    }

    /// Validate one submission file
    pub async fn validate_file(&self, path: &Path) -> SubmissionResult {
        Self::validate_single_file(&self.schema, path.to_path_buf()).await
    }

    async fn validate_with_timeout(
        schema: &Schema,
        file_path: PathBuf,
        timeout: Duration,
    ) -> SubmissionResult {
        let validation = Self::validate_single_file(schema, file_path.clone());
        Self::bounded(file_path, timeout, validation).await
    }

    /// Turn an overrunning validation into an error result for `file_path`
    async fn bounded(
        file_path: PathBuf,
        timeout: Duration,
        validation: impl Future<Output = SubmissionResult>,
    ) -> SubmissionResult {
        match tokio::time::timeout(timeout, validation).await {
            Ok(result) => result,
            Err(_) => {
                warn!(path = %file_path.display(), ?timeout, "submission timed out");
                SubmissionResult::error(
                    file_path,
                    FormError::Concurrency {
                        details: format!("Validation timeout after {:?}", timeout),
                    },
                    timeout,
                )
            }
        }
    }

    async fn validate_single_file(schema: &Schema, file_path: PathBuf) -> SubmissionResult {
        let start_time = Instant::now();

        let values = match Self::read_submission(&file_path).await {
            Ok(values) => values,
            Err(e) => {
                warn!(path = %file_path.display(), error = %e, "unreadable submission");
                return SubmissionResult::error(file_path, e, start_time.elapsed());
            }
        };

        let report = schema.validate(&values);
        let duration = start_time.elapsed();
        if report.is_valid() {
            SubmissionResult::valid(file_path, duration)
        } else {
            SubmissionResult::invalid(file_path, report.errors, duration)
        }
    }

    async fn read_submission(path: &Path) -> Result<serde_json::Map<String, Value>> {
        let content = tokio::fs::read_to_string(path).await?;
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(FormError::NotAnObject {
                file: path.to_path_buf(),
            }),
        }
    }
}

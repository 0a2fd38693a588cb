//! BigQuery load-job client.
//!
//! Each append is one load job: the batch is uploaded as newline-delimited
//! JSON through the multipart upload endpoint, then the job is polled until
//! BigQuery reports it `DONE`. Load jobs are atomic, so a failed job writes
//! nothing.

mod auth;
mod job;

pub use auth::{CredentialsFile, GOOGLE_TOKEN_URL, StaticToken, TokenSource};
pub use job::{Job, JobInsert, multipart_body, multipart_content_type};

use std::time::{Duration, Instant};

use ledger_common::Retryable;
use ledger_model::Batch;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::error::{LoadError, Result};
use crate::loader::WarehouseLoader;
use crate::table::{LoadReceipt, TableRef};

/// Public BigQuery endpoint.
pub const DEFAULT_API_URL: &str = "https://bigquery.googleapis.com";

/// HTTP request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(300);

/// Build the blocking HTTP client used for API and token calls.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("ledger-load/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(LoadError::from)
}

/// Appends batches through BigQuery load jobs.
pub struct BigQueryLoader {
    client: Client,
    tokens: Box<dyn TokenSource>,
    api_url: String,
    location: Option<String>,
    poll_interval: Duration,
    job_timeout: Duration,
}

impl std::fmt::Debug for BigQueryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryLoader")
            .field("api_url", &self.api_url)
            .field("location", &self.location)
            .field("poll_interval", &self.poll_interval)
            .field("job_timeout", &self.job_timeout)
            .finish_non_exhaustive()
    }
}

impl BigQueryLoader {
    pub fn new(client: Client, tokens: Box<dyn TokenSource>) -> Self {
        Self {
            client,
            tokens,
            api_url: DEFAULT_API_URL.to_string(),
            location: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            job_timeout: DEFAULT_JOB_TIMEOUT,
        }
    }

    /// Point at another endpoint (emulator, proxy). Trailing slashes are ignored.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Run jobs in a specific location (`US`, `southamerica-east1`, ...).
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// How long to wait for a job to finish before giving up.
    #[must_use]
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    fn upload_url(&self, project: &str) -> String {
        format!(
            "{}/upload/bigquery/v2/projects/{project}/jobs?uploadType=multipart",
            self.api_url
        )
    }

    fn job_url(&self, project: &str, job_id: &str, location: Option<&str>) -> String {
        let base = format!("{}/bigquery/v2/projects/{project}/jobs/{job_id}", self.api_url);
        match location {
            Some(location) => format!("{base}?location={location}"),
            None => base,
        }
    }

    fn insert_job(&self, batch: &Batch, destination: &TableRef) -> Result<Job> {
        let metadata = serde_json::to_vec(&JobInsert::append(
            destination,
            self.location.as_deref(),
        ))?;
        let payload = batch.to_ndjson()?;
        let body = multipart_body(&metadata, &payload);

        debug!(
            destination = %destination,
            bytes = payload.len(),
            "starting load job"
        );
        let response = self
            .client
            .post(self.upload_url(&destination.project))
            .bearer_auth(self.tokens.access_token()?)
            .header(CONTENT_TYPE, multipart_content_type())
            .body(body)
            .send()?;
        parse_job(response)
    }

    fn get_job(&self, project: &str, job_id: &str, location: Option<&str>) -> Result<Job> {
        let response = self
            .client
            .get(self.job_url(project, job_id, location))
            .bearer_auth(self.tokens.access_token()?)
            .send()?;
        parse_job(response)
    }

    /// Poll until the job is `DONE`.
    ///
    /// The job already exists once this runs, so no error escapes as
    /// retryable: transient poll failures poll the same job again and
    /// anything else becomes [`LoadError::JobUnconfirmed`].
    fn wait_for_job(&self, project: &str, mut job: Job) -> Result<Job> {
        let job_id = job
            .job_id()
            .ok_or_else(|| LoadError::InvalidResponse("job has no jobReference.jobId".to_string()))?
            .to_string();
        let location = job
            .location()
            .map(str::to_string)
            .or_else(|| self.location.clone());
        let started = Instant::now();

        while !job.is_done() {
            let waited = started.elapsed();
            if waited >= self.job_timeout {
                return Err(LoadError::JobTimeout { job_id, waited });
            }
            std::thread::sleep(self.poll_interval);
            match self.get_job(project, &job_id, location.as_deref()) {
                Ok(next) => {
                    job = next;
                    debug!(job_id = %job_id, state = ?job.status.as_ref().map(|s| s.state.as_str()), "polled load job");
                }
                Err(err) if err.is_retryable() => {
                    warn!(job_id = %job_id, error = %err, "job status poll failed, polling again");
                }
                Err(err) => {
                    return Err(LoadError::JobUnconfirmed {
                        job_id,
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(job)
    }
}

fn parse_job(response: Response) -> Result<Job> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(LoadError::from_response(status.as_u16(), &body));
    }
    Ok(response.json()?)
}

impl WarehouseLoader for BigQueryLoader {
    fn append(&self, batch: &Batch, destination: &TableRef) -> Result<LoadReceipt> {
        let job = self.insert_job(batch, destination)?;
        let job = self.wait_for_job(&destination.project, job)?;
        job.check_result()?;

        let rows = job.output_rows().unwrap_or(batch.len() as u64);
        let job_id = job.job_id().map(str::to_string);
        info!(
            destination = %destination,
            rows,
            job_id = job_id.as_deref().unwrap_or_default(),
            "load job completed"
        );
        Ok(LoadReceipt {
            destination: destination.clone(),
            rows,
            job_id,
        })
    }
}

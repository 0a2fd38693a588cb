//! BigQuery job resources and the multipart upload body.

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::table::TableRef;

/// Boundary for `multipart/related` upload bodies. NDJSON lines never start
/// with `--`, so a fixed token cannot clash with the payload.
pub const MULTIPART_BOUNDARY: &str = "ledger_load_boundary_7f3c9a";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInsert<'a> {
    pub configuration: JobConfiguration<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReferenceInsert<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReferenceInsert<'a> {
    pub project_id: &'a str,
    pub location: &'a str,
}

#[derive(Debug, Serialize)]
pub struct JobConfiguration<'a> {
    pub load: LoadConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadConfiguration<'a> {
    pub destination_table: DestinationTable<'a>,
    pub source_format: &'static str,
    pub write_disposition: &'static str,
    pub create_disposition: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationTable<'a> {
    pub project_id: &'a str,
    pub dataset_id: &'a str,
    pub table_id: &'a str,
}

impl<'a> JobInsert<'a> {
    /// Append-only NDJSON load into an existing table.
    pub fn append(destination: &'a TableRef, location: Option<&'a str>) -> Self {
        Self {
            configuration: JobConfiguration {
                load: LoadConfiguration {
                    destination_table: DestinationTable {
                        project_id: &destination.project,
                        dataset_id: &destination.dataset,
                        table_id: &destination.table,
                    },
                    source_format: "NEWLINE_DELIMITED_JSON",
                    write_disposition: "WRITE_APPEND",
                    create_disposition: "CREATE_NEVER",
                },
            },
            job_reference: location.map(|location| JobReferenceInsert {
                project_id: &destination.project,
                location,
            }),
        }
    }
}

/// Job resource as returned by `jobs.insert` and `jobs.get`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub statistics: Option<JobStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub job_id: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub error_result: Option<ErrorProto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatistics {
    #[serde(default)]
    pub load: Option<LoadStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatistics {
    /// int64 fields travel as JSON strings.
    #[serde(default)]
    pub output_rows: Option<String>,
}

impl Job {
    pub fn job_id(&self) -> Option<&str> {
        self.job_reference.as_ref().map(|r| r.job_id.as_str())
    }

    pub fn location(&self) -> Option<&str> {
        self.job_reference.as_ref().and_then(|r| r.location.as_deref())
    }

    pub fn is_done(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.state == "DONE")
    }

    /// Rows written by a finished load, if reported.
    pub fn output_rows(&self) -> Option<u64> {
        self.statistics
            .as_ref()?
            .load
            .as_ref()?
            .output_rows
            .as_deref()?
            .parse()
            .ok()
    }

    /// Turn a finished job into its outcome.
    pub fn check_result(&self) -> Result<(), LoadError> {
        let Some(error) = self.status.as_ref().and_then(|s| s.error_result.as_ref()) else {
            return Ok(());
        };
        Err(LoadError::JobFailed {
            job_id: self.job_id().unwrap_or("<unknown>").to_string(),
            reason: error.reason.clone().unwrap_or_else(|| "unknown".to_string()),
            message: error.message.clone().unwrap_or_default(),
        })
    }
}

/// `multipart/related` body: JSON job metadata, then the NDJSON payload.
pub fn multipart_body(metadata: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + payload.len() + 256);
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// `Content-Type` header value matching [`multipart_body`].
pub fn multipart_content_type() -> String {
    format!("multipart/related; boundary={MULTIPART_BOUNDARY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_insert_json() {
        let table = TableRef::new("acme", "finance", "stock_control");
        let json = serde_json::to_string(&JobInsert::append(&table, None)).unwrap();
        insta::assert_snapshot!(json, @r#"{"configuration":{"load":{"destinationTable":{"projectId":"acme","datasetId":"finance","tableId":"stock_control"},"sourceFormat":"NEWLINE_DELIMITED_JSON","writeDisposition":"WRITE_APPEND","createDisposition":"CREATE_NEVER"}}}"#);
    }

    #[test]
    fn test_job_insert_with_location() {
        let table = TableRef::new("acme", "finance", "stock_control");
        let json = serde_json::to_value(JobInsert::append(&table, Some("southamerica-east1"))).unwrap();
        assert_eq!(json["jobReference"]["location"], "southamerica-east1");
        assert_eq!(json["jobReference"]["projectId"], "acme");
    }

    #[test]
    fn test_multipart_body() {
        let body = multipart_body(b"{}", b"{\"a\":1}\n");
        let text = String::from_utf8(body).unwrap();
        assert_eq!(
            text,
            "--ledger_load_boundary_7f3c9a\r\n\
             Content-Type: application/json; charset=UTF-8\r\n\r\n\
             {}\r\n\
             --ledger_load_boundary_7f3c9a\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {\"a\":1}\n\r\n\
             --ledger_load_boundary_7f3c9a--\r\n"
        );
    }

    #[test]
    fn test_running_job() {
        let job: Job = serde_json::from_str(
            r#"{"jobReference":{"projectId":"acme","jobId":"job_abc","location":"US"},"status":{"state":"RUNNING"}}"#,
        )
        .unwrap();
        assert_eq!(job.job_id(), Some("job_abc"));
        assert_eq!(job.location(), Some("US"));
        assert!(!job.is_done());
    }

    #[test]
    fn test_done_job_with_rows() {
        let job: Job = serde_json::from_str(
            r#"{"jobReference":{"jobId":"job_abc"},"status":{"state":"DONE"},"statistics":{"load":{"outputRows":"5"}}}"#,
        )
        .unwrap();
        assert!(job.is_done());
        assert!(job.check_result().is_ok());
        assert_eq!(job.output_rows(), Some(5));
    }

    #[test]
    fn test_failed_job() {
        let job: Job = serde_json::from_str(
            r#"{"jobReference":{"jobId":"job_abc"},"status":{"state":"DONE","errorResult":{"reason":"invalid","message":"No such field: foo"}}}"#,
        )
        .unwrap();
        let err = job.check_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "load job job_abc failed (invalid): No such field: foo"
        );
    }
}

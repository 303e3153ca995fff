use std::{env, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How long a run may take before the request is abandoned. The
/// execution service is the only collaborator with a timeout; the sync
/// engine itself has none.
const EXECUTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the external code-execution service.
///
/// The service receives the buffer contents and returns captured
/// output. It is a collaborator with its own sandboxing; nothing is
/// executed in this process.
pub struct ExecutionClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExecutionRequest<'a> {
    language: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<&'a str>,
}

/// Captured output of a finished run.
#[derive(Debug, Deserialize)]
pub struct ExecutionOutput {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: Option<String>,
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("No execution service is configured")]
    NotConfigured,
    #[error("The execution service could not be reached: {0}")]
    Unreachable(#[from] reqwest::Error),
}

impl ExecutionClient {
    pub fn from_env() -> Self {
        Self::new(env::var("CODEDECK_EXECUTION_URL").ok())
    }

    pub fn new(base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(EXECUTION_TIMEOUT)
            .build()
            .expect("http client builds");

        Self { client, base_url }
    }

    pub async fn execute(
        &self,
        language: &str,
        code: &str,
        stdin: Option<&str>,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(ExecutionError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/execute", base_url.trim_end_matches('/')))
            .json(&ExecutionRequest {
                language,
                code,
                stdin,
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn executing_without_a_service_fails_cleanly() {
        let client = ExecutionClient::new(None);
        let result = client.execute("python", "print(1)", None).await;

        assert!(matches!(result, Err(ExecutionError::NotConfigured)));
    }

    #[test]
    fn output_parses_with_missing_streams() {
        let output: ExecutionOutput = serde_json::from_str(r#"{"stdout": "1\n"}"#).unwrap();

        assert_eq!(output.stdout, "1\n");
        assert!(output.stderr.is_none());
    }
}

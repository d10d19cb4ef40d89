//! Etherscan-compatible source verification client.
//!
//! # Protocol
//! ```text
//! POST ?chainid=N  module=contract&action=verifysourcecode  → result: GUID
//! GET  ?chainid=N  module=contract&action=checkverifystatus → Pending | Pass | Fail
//! ```
//! Explorers index new bytecode with a delay; submissions answered with
//! "Unable to locate ContractCode" are retried with backoff.

use std::time::Duration;

use alloy::primitives::{hex, Address, Bytes};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::VerificationConfig;
use crate::deploy::ContractArtifact;
use crate::resilience::Backoff;
use crate::verify::VerifyError;

/// Everything the explorer needs to rebuild the bytecode.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub address: Address,
    /// `source:Name`.
    pub contract_name: String,
    /// `v0.8.17+commit.8df45f5f`.
    pub compiler_version: String,
    /// Standard-JSON compiler input, serialized.
    pub source_code: String,
    /// Hex without `0x`.
    pub constructor_arguments: String,
}

impl VerificationRequest {
    /// Assemble a request from the artifact's build info.
    pub fn from_artifact(
        artifact: &ContractArtifact,
        address: Address,
        constructor_args: &Bytes,
    ) -> Result<Self, VerifyError> {
        let build_info = artifact.build_info()?;
        let source_code = serde_json::to_string(&build_info.input)
            .map_err(|e| VerifyError::Api(format!("cannot serialize compiler input: {}", e)))?;

        Ok(Self {
            address,
            contract_name: artifact.fully_qualified_name(),
            compiler_version: build_info.compiler_version(),
            source_code,
            constructor_arguments: hex::encode(constructor_args),
        })
    }
}

/// Final verdict of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

impl ApiResponse {
    fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            Value::Null => self.message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SubmitOutcome {
    Accepted(String),
    AlreadyVerified,
    NotIndexedYet,
    Rejected(String),
}

#[derive(Debug, PartialEq, Eq)]
enum StatusOutcome {
    Pending,
    Done(VerificationOutcome),
    Failed(String),
}

fn classify_submission(response: &ApiResponse) -> SubmitOutcome {
    let text = response.result_text();
    let lower = text.to_lowercase();
    if response.status == "1" {
        SubmitOutcome::Accepted(text)
    } else if lower.contains("already verified") {
        SubmitOutcome::AlreadyVerified
    } else if lower.contains("unable to locate contractcode")
        || lower.contains("does not have bytecode")
    {
        SubmitOutcome::NotIndexedYet
    } else {
        SubmitOutcome::Rejected(text)
    }
}

fn classify_status(response: &ApiResponse) -> StatusOutcome {
    let text = response.result_text();
    let lower = text.to_lowercase();
    if lower.contains("pending") {
        StatusOutcome::Pending
    } else if lower.contains("already verified") {
        StatusOutcome::Done(VerificationOutcome::AlreadyVerified)
    } else if lower.starts_with("pass") {
        StatusOutcome::Done(VerificationOutcome::Verified)
    } else {
        StatusOutcome::Failed(text)
    }
}

/// Client for one verification API endpoint and chain.
#[derive(Debug, Clone)]
pub struct EtherscanVerifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    chain_id: u64,
    poll_interval: Duration,
    max_attempts: u32,
}

impl EtherscanVerifier {
    pub fn new(
        config: &VerificationConfig,
        api_key: &str,
        chain_id: u64,
    ) -> Result<Self, VerifyError> {
        if api_key.is_empty() {
            return Err(VerifyError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VerifyError::Http(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: api_key.to_string(),
            chain_id,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_attempts,
        })
    }

    /// Submit the request and wait for the explorer's verdict.
    pub async fn verify(
        &self,
        request: &VerificationRequest,
        cancel: &mut broadcast::Receiver<()>,
    ) -> Result<VerificationOutcome, VerifyError> {
        tracing::info!(
            address = %request.address,
            contract = %request.contract_name,
            compiler = %request.compiler_version,
            "Submitting source for verification"
        );

        let guid = match self.submit(request, cancel).await? {
            Ok(guid) => guid,
            Err(outcome) => return Ok(outcome),
        };
        tracing::info!(guid = %guid, "Verification submitted");

        self.poll_status(&guid, cancel).await
    }

    /// `Ok(Ok(guid))` when accepted, `Ok(Err(outcome))` when nothing is left to do.
    async fn submit(
        &self,
        request: &VerificationRequest,
        cancel: &mut broadcast::Receiver<()>,
    ) -> Result<Result<String, VerificationOutcome>, VerifyError> {
        let mut backoff =
            Backoff::new(self.poll_interval, self.poll_interval * 8, self.max_attempts);
        let address = request.address.to_string();

        while let Some(delay) = backoff.next_delay() {
            pause(delay, cancel).await?;

            let form = [
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "verifysourcecode"),
                ("contractaddress", address.as_str()),
                ("sourceCode", request.source_code.as_str()),
                ("codeformat", "solidity-standard-json-input"),
                ("contractname", request.contract_name.as_str()),
                ("compilerversion", request.compiler_version.as_str()),
                ("constructorArguements", request.constructor_arguments.as_str()),
            ];
            let request_builder = self
                .http
                .post(&self.api_url)
                .query(&[("chainid", self.chain_id)])
                .form(&form);
            let response = self.send(request_builder).await?;

            match classify_submission(&response) {
                SubmitOutcome::Accepted(guid) => return Ok(Ok(guid)),
                SubmitOutcome::AlreadyVerified => {
                    tracing::info!(address = %request.address, "Contract already verified");
                    return Ok(Err(VerificationOutcome::AlreadyVerified));
                }
                SubmitOutcome::NotIndexedYet => {
                    tracing::debug!(
                        attempt = backoff.attempts(),
                        "Explorer has not indexed the bytecode yet"
                    );
                }
                SubmitOutcome::Rejected(reason) => return Err(VerifyError::Rejected(reason)),
            }
        }

        Err(VerifyError::NotIndexed(backoff.attempts()))
    }

    async fn poll_status(
        &self,
        guid: &str,
        cancel: &mut broadcast::Receiver<()>,
    ) -> Result<VerificationOutcome, VerifyError> {
        let chain_id = self.chain_id.to_string();
        for attempt in 0..self.max_attempts {
            pause(self.poll_interval, cancel).await?;

            let query = [
                ("chainid", chain_id.as_str()),
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ];
            let response = self.send(self.http.get(&self.api_url).query(&query)).await?;

            match classify_status(&response) {
                StatusOutcome::Pending => {
                    tracing::debug!(guid, attempt, "Verification pending");
                }
                StatusOutcome::Done(outcome) => {
                    tracing::info!(guid, outcome = ?outcome, "Verification finished");
                    return Ok(outcome);
                }
                StatusOutcome::Failed(reason) => return Err(VerifyError::Failed(reason)),
            }
        }

        Err(VerifyError::StillPending(guid.to_string()))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ApiResponse, VerifyError> {
        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| VerifyError::Http(e.without_url().to_string()))?;

        response
            .json::<ApiResponse>()
            .await
            .map_err(|e| VerifyError::Api(format!("unexpected response body: {}", e.without_url())))
    }
}

/// Sleep for `delay` unless cancelled first.
async fn pause(delay: Duration, cancel: &mut broadcast::Receiver<()>) -> Result<(), VerifyError> {
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        Ok(()) = cancel.recv() => Err(VerifyError::Cancelled),
    }
}

//! RPC Ledger Gateway Adapter
//!
//! Implements `LedgerGateway` over the ledger node's JSON-RPC API.

use async_trait::async_trait;
use bday_telemetry::metrics::SKIPPED_ACCOUNTS;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde_json::json;
use solana_program::pubkey::Pubkey;
use solana_sdk::hash::Hash;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::codec::{
    account_discriminator, build_instruction, build_transaction, decode_event_account,
    encode_transaction, EVENT_ACCOUNT_NAME,
};
use super::rpc_types::*;
use crate::config::InviteConfig;
use crate::domain::{InviteError, TransactionId};
use crate::ports::outbound::{LedgerGateway, ProgramOperation, TransactionSigner};
use crate::ports::records::{RawEventAccount, RawEventRecord};

/// Transport-level failures, mapped to `InviteError` per call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Error object returned by the node
    #[error("JSON-RPC error: {0}")]
    Rpc(String),
    /// Unexpected response body
    #[error("Failed to parse response: {0}")]
    Parse(String),
    /// Node unreachable
    #[error("Connection failed: {0}")]
    Connection(String),
}

/// JSON-RPC ledger gateway.
pub struct RpcLedgerGateway {
    client: Client,
    rpc_url: String,
    program_id: Pubkey,
    commitment: String,
    request_id: AtomicU64,
}

impl RpcLedgerGateway {
    /// Create a gateway from configuration.
    pub fn new(config: &InviteConfig) -> Result<Self, InviteError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| InviteError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            program_id: config.program_id()?,
            commitment: config.commitment.clone(),
            request_id: AtomicU64::new(1),
        })
    }

    /// Endpoint in use.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn call<P: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, RpcError> {
        let request = JsonRpcRequest::new(method, params, self.next_id());
        debug!(method, id = request.id, "RPC call");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RpcError::Connection(format!("Cannot connect to {}", self.rpc_url))
                } else {
                    RpcError::Http(e)
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RpcError::Parse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Rpc(error.to_string()));
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::Parse("Missing result in response".to_string()))
    }

    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        let latest: WithContext<LatestBlockhash> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment }]),
            )
            .await?;
        Hash::from_str(&latest.value.blockhash)
            .map_err(|e| RpcError::Parse(format!("blockhash: {}", e)))
    }

    fn decode_account(&self, account: &UiAccount) -> Result<RawEventAccount, InviteError> {
        if account.owner != self.program_id.to_string() {
            return Err(InviteError::Fetch(format!(
                "account owned by {}, not the invite program",
                account.owner
            )));
        }
        let data = STANDARD
            .decode(&account.data.0)
            .map_err(|e| InviteError::Fetch(format!("account data: {}", e)))?;
        decode_event_account(&data)
    }

    /// Decode a `getProgramAccounts` listing, leaving out accounts that do
    /// not decode.
    fn decode_listing(&self, accounts: &[KeyedAccount]) -> Vec<RawEventRecord> {
        let mut records = Vec::with_capacity(accounts.len());
        for keyed in accounts {
            let decoded = Pubkey::from_str(&keyed.pubkey)
                .map_err(|e| InviteError::Fetch(format!("account key {:?}: {}", keyed.pubkey, e)))
                .and_then(|address| {
                    Ok(RawEventRecord {
                        address,
                        account: self.decode_account(&keyed.account)?,
                    })
                });
            match decoded {
                Ok(record) => records.push(record),
                Err(e) => {
                    SKIPPED_ACCOUNTS.with_label_values(&["decode"]).inc();
                    warn!(account = %keyed.pubkey, "Skipping event account: {}", e);
                }
            }
        }
        records
    }
}

fn fetch_error(e: RpcError) -> InviteError {
    InviteError::Fetch(e.to_string())
}

fn submission_error(e: RpcError) -> InviteError {
    InviteError::Submission(e.to_string())
}

#[async_trait]
impl LedgerGateway for RpcLedgerGateway {
    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    async fn fetch_event(&self, address: &Pubkey) -> Result<Option<RawEventAccount>, InviteError> {
        let response: WithContext<Option<UiAccount>> = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": self.commitment }
                ]),
            )
            .await
            .map_err(fetch_error)?;

        response
            .value
            .map(|account| self.decode_account(&account))
            .transpose()
    }

    async fn fetch_all_events(&self) -> Result<Vec<RawEventRecord>, InviteError> {
        let discriminator = STANDARD.encode(account_discriminator(EVENT_ACCOUNT_NAME));
        let accounts: Vec<KeyedAccount> = self
            .call(
                "getProgramAccounts",
                json!([
                    self.program_id.to_string(),
                    {
                        "encoding": "base64",
                        "commitment": self.commitment,
                        "filters": [
                            { "memcmp": { "offset": 0, "bytes": discriminator, "encoding": "base64" } }
                        ]
                    }
                ]),
            )
            .await
            .map_err(fetch_error)?;

        let records = self.decode_listing(&accounts);
        debug!(count = records.len(), "Fetched event accounts");
        Ok(records)
    }

    async fn submit(
        &self,
        operation: &ProgramOperation,
        signer: &dyn TransactionSigner,
    ) -> Result<TransactionId, InviteError> {
        let payer = signer.pubkey();
        let instruction = build_instruction(&self.program_id, operation, &payer)?;
        let blockhash = self.latest_blockhash().await.map_err(submission_error)?;

        let tx = build_transaction(instruction, signer, blockhash).map_err(|e| match e {
            InviteError::Submission(_) => e,
            other => InviteError::Submission(other.to_string()),
        })?;
        let wire = STANDARD.encode(encode_transaction(&tx)?);

        let tx: String = self
            .call(
                "sendTransaction",
                json!([
                    wire,
                    { "encoding": "base64", "preflightCommitment": self.commitment }
                ]),
            )
            .await
            .map_err(|e| {
                warn!(method = operation.method_name(), "Submission failed: {}", e);
                submission_error(e)
            })?;

        debug!(method = operation.method_name(), tx = %tx, "Submitted");
        Ok(TransactionId::new(tx))
    }
}

//! Shared utilities for integration tests: a scripted JSON-RPC node, a
//! scripted verification API, and artifact fixtures.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{hex, keccak256, Address, B256};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use kipu_deploy::config::SigningCredential;
use kipu_deploy::{DeployerConfig, NetworkConfig};

/// Anvil's first dev account.
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const TEST_CHAIN_ID: u64 = 31337;

const GENESIS_BLOCK: u64 = 100;

/// One HTTP request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    /// Path and query string.
    pub target: String,
    pub body: String,
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some(MockRequest {
        method,
        target,
        body,
    })
}

/// How the mock node treats submitted transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeBehavior {
    /// Mine immediately with status 1.
    Mine,
    /// Mine immediately with status 0.
    Revert,
    /// Accept the transaction but never produce a receipt.
    NeverMine,
    /// Refuse the transaction with a JSON-RPC error.
    Reject,
}

#[derive(Debug, Default)]
struct NodeState {
    /// Hashes of accepted transactions, in nonce order.
    sent: Vec<B256>,
    raw: Vec<String>,
}

/// Handle to a running mock node.
#[derive(Clone)]
pub struct MockNode {
    pub addr: SocketAddr,
    state: Arc<Mutex<NodeState>>,
}

impl MockNode {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of raw transactions the node accepted.
    pub fn sent_count(&self) -> usize {
        self.state.lock().unwrap().sent.len()
    }

    /// Raw transactions as received (hex with `0x`).
    pub fn raw_transactions(&self) -> Vec<String> {
        self.state.lock().unwrap().raw.clone()
    }
}

/// Start a mock JSON-RPC node whose sender is [`TEST_ADDRESS`].
pub async fn start_mock_node(behavior: NodeBehavior) -> MockNode {
    let state = Arc::new(Mutex::new(NodeState::default()));
    let sender: Address = TEST_ADDRESS.parse().unwrap();

    let shared = state.clone();
    let addr = start_programmable_backend(move |request| {
        let state = shared.clone();
        async move {
            let call: Value = match serde_json::from_str(&request.body) {
                Ok(call) => call,
                Err(_) => return (500, "bad request".to_string()),
            };
            let response = handle_rpc(&call, behavior, sender, &state);
            (200, response.to_string())
        }
    })
    .await;

    MockNode { addr, state }
}

fn handle_rpc(
    call: &Value,
    behavior: NodeBehavior,
    sender: Address,
    state: &Mutex<NodeState>,
) -> Value {
    let id = call["id"].clone();
    let method = call["method"].as_str().unwrap_or_default();
    let mut state = state.lock().unwrap();
    let head = GENESIS_BLOCK + state.sent.len() as u64;

    let result = match method {
        "eth_chainId" => json!(format!("0x{:x}", TEST_CHAIN_ID)),
        "eth_blockNumber" => json!(format!("0x{:x}", head)),
        "eth_getTransactionCount" => json!(format!("0x{:x}", state.sent.len())),
        "eth_gasPrice" => json!("0x3b9aca00"),
        "eth_estimateGas" => json!("0x30d40"),
        "eth_sendRawTransaction" => {
            if behavior == NodeBehavior::Reject {
                return json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {
                        "code": -32000,
                        "message": "insufficient funds for gas * price + value"
                    }
                });
            }
            let raw = call["params"][0].as_str().unwrap_or_default().to_string();
            let bytes = hex::decode(&raw).unwrap_or_default();
            let hash = keccak256(&bytes);
            state.sent.push(hash);
            state.raw.push(raw);
            json!(hash)
        }
        "eth_getTransactionReceipt" => {
            let hash: B256 = call["params"][0]
                .as_str()
                .and_then(|h| h.parse().ok())
                .unwrap_or_default();
            match state.sent.iter().position(|h| *h == hash) {
                Some(nonce) if behavior != NodeBehavior::NeverMine => {
                    receipt_json(hash, sender, nonce as u64, behavior == NodeBehavior::Mine)
                }
                _ => Value::Null,
            }
        }
        other => {
            return json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": format!("method {} not supported", other)}
            });
        }
    };

    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn receipt_json(hash: B256, sender: Address, nonce: u64, success: bool) -> Value {
    let block_number = GENESIS_BLOCK + nonce + 1;
    let status = if success { "0x1" } else { "0x0" };
    let contract_address = if success { json!(sender.create(nonce)) } else { Value::Null };
    json!({
        "type": "0x0",
        "status": status,
        "cumulativeGasUsed": "0x2dc6c",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": keccak256(block_number.to_be_bytes()),
        "blockNumber": format!("0x{:x}", block_number),
        "gasUsed": "0x2dc6c",
        "effectiveGasPrice": "0x47868c00",
        "from": sender,
        "to": null,
        "contractAddress": contract_address,
    })
}

/// Scripted verification API: submissions and status checks answer from
/// their own queues, repeating the last entry once a queue runs dry.
#[derive(Clone)]
pub struct MockExplorer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockExplorer {
    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn start_mock_explorer(
    submissions: Vec<(&'static str, &'static str)>,
    statuses: Vec<(&'static str, &'static str)>,
) -> MockExplorer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let queues = Arc::new(Mutex::new((submissions, statuses)));

    let seen = requests.clone();
    let addr = start_programmable_backend(move |request| {
        let seen = seen.clone();
        let queues = queues.clone();
        async move {
            let is_submission = request.body.contains("action=verifysourcecode");
            seen.lock().unwrap().push(request);

            let mut queues = queues.lock().unwrap();
            let queue = if is_submission { &mut queues.0 } else { &mut queues.1 };
            let (status, result) = if queue.len() > 1 {
                queue.remove(0)
            } else {
                queue.first().copied().unwrap_or(("0", "NOTOK"))
            };

            let message = if status == "1" { "OK" } else { "NOTOK" };
            (
                200,
                json!({"status": status, "message": message, "result": result}).to_string(),
            )
        }
    })
    .await;

    MockExplorer { addr, requests }
}

pub const KIPUBANK_ABI: &str = r#"[
    {"type":"constructor","stateMutability":"nonpayable","inputs":[
        {"name":"_bankCap","type":"uint256","internalType":"uint256"},
        {"name":"_maxWithdrawal","type":"uint256","internalType":"uint256"}]},
    {"type":"function","name":"deposit","stateMutability":"payable","inputs":[],"outputs":[]}
]"#;

/// Write a Hardhat-style artifact tree (artifact, debug file, build info).
pub fn write_hardhat_artifacts(root: &Path) {
    let dir = root.join("contracts").join("KipuBank.sol");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::create_dir_all(root.join("build-info")).unwrap();

    let artifact = json!({
        "_format": "hh-sol-artifact-1",
        "contractName": "KipuBank",
        "sourceName": "contracts/KipuBank.sol",
        "abi": serde_json::from_str::<Value>(KIPUBANK_ABI).unwrap(),
        "bytecode": "0x6080604052348015600f57600080fd5b50",
        "deployedBytecode": "0x6080604052",
        "linkReferences": {},
        "deployedLinkReferences": {}
    });
    std::fs::write(dir.join("KipuBank.json"), artifact.to_string()).unwrap();

    let dbg = json!({"_format": "hh-sol-dbg-1", "buildInfo": "../../build-info/f00d.json"});
    std::fs::write(dir.join("KipuBank.dbg.json"), dbg.to_string()).unwrap();

    let build_info = json!({
        "_format": "hh-sol-build-info-1",
        "solcVersion": "0.8.17",
        "solcLongVersion": "0.8.17+commit.8df45f5f",
        "input": {
            "language": "Solidity",
            "sources": {"contracts/KipuBank.sol": {"content": "contract KipuBank {}"}},
            "settings": {"optimizer": {"enabled": false, "runs": 200}}
        }
    });
    std::fs::write(root.join("build-info").join("f00d.json"), build_info.to_string()).unwrap();
}

pub fn test_network(endpoint_url: &str) -> NetworkConfig {
    NetworkConfig {
        endpoint_url: endpoint_url.to_string(),
        signing_credential: SigningCredential::new(TEST_PRIVATE_KEY),
        verification_api_key: String::new(),
    }
}

/// Configuration with fast polling, pointed at `artifacts`.
pub fn test_config(artifacts: &Path) -> DeployerConfig {
    let mut config = DeployerConfig::default();
    config.network.rpc_timeout_secs = 2;
    config.network.poll_interval_ms = 50;
    config.network.deploy_timeout_secs = 5;
    config.contract.artifacts_dir = artifacts.display().to_string();
    config.verification.poll_interval_ms = 20;
    config.verification.max_attempts = 5;
    config
}

//! A local JSON-RPC endpoint answering from a closure, for tests that need
//! exact node replies without a running chain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy::primitives::{Address, B256};
use serde_json::{json, Value as JsonValue};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// `Ok` becomes the `result` member, `Err` the `error` object
pub(crate) type NodeAnswer = Result<JsonValue, (i64, String)>;

pub(crate) struct TestNode {
    pub url: String,
    requests: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl TestNode {
    pub async fn start<H>(handler: H) -> Self
    where
        H: Fn(&str, &JsonValue) -> NodeAnswer + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(handler);
        let counter = requests.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, handler.clone(), counter.clone()));
            }
        });
        Self { url, requests, task }
    }

    /// JSON-RPC calls answered so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// one HTTP/1.1 connection, kept alive across requests
async fn serve<H>(stream: TcpStream, handler: Arc<H>, requests: Arc<AtomicUsize>)
where
    H: Fn(&str, &JsonValue) -> NodeAnswer + Send + Sync + 'static,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    loop {
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }
        requests.fetch_add(1, Ordering::SeqCst);

        let request: JsonValue = serde_json::from_slice(&body).unwrap_or(JsonValue::Null);
        let method = request["method"].as_str().unwrap_or_default();
        let mut response = json!({ "jsonrpc": "2.0", "id": request["id"].clone() });
        match handler(method, &request["params"]) {
            Ok(result) => response["result"] = result,
            Err((code, message)) => {
                response["error"] = json!({ "code": code, "message": message })
            }
        }

        let payload = response.to_string();
        let head = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n",
            payload.len()
        );
        if writer.write_all(head.as_bytes()).await.is_err()
            || writer.write_all(payload.as_bytes()).await.is_err()
        {
            return;
        }
    }
}

/// A mined legacy receipt for `tx_hash` in block 1
pub(crate) fn receipt_json(
    tx_hash: B256,
    success: bool,
    contract_address: Option<Address>,
) -> JsonValue {
    json!({
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": B256::repeat_byte(0x11),
        "blockNumber": "0x1",
        "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        "to": JsonValue::Null,
        "cumulativeGasUsed": "0x5208",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x2540be400",
        "contractAddress": contract_address,
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "status": if success { "0x1" } else { "0x0" },
        "type": "0x0",
    })
}

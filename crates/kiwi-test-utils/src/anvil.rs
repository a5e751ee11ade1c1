use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use error_stack::{Report, ResultExt};

use crate::accounts::TEST_MNEMONIC;
use crate::{HarnessError, HarnessResult};

pub const ANVIL_CHAIN_ID: u64 = 31337;
pub const ANVIL_ACCOUNTS: u32 = 10;
/// Ether per account
pub const ANVIL_BALANCE: u64 = 1_000_000;

const READY_ATTEMPTS: u32 = 50;
const READY_POLL_INTERVAL_MS: u64 = 100;

/// A local anvil node owned by the test process, killed on drop
#[derive(Debug)]
pub struct AnvilInstance {
    process: Option<Child>,
    pub port: u16,
    pub url: String,
    pub chain_id: u64,
}

impl AnvilInstance {
    pub fn is_available() -> bool {
        Command::new("anvil")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    pub fn spawn() -> HarnessResult<Self> {
        if !Self::is_available() {
            return Err(Report::new(HarnessError::AnvilNotFound));
        }
        let port = find_available_port()?;

        let mut child = Command::new("anvil")
            .arg("--port")
            .arg(port.to_string())
            .arg("--accounts")
            .arg(ANVIL_ACCOUNTS.to_string())
            .arg("--balance")
            .arg(ANVIL_BALANCE.to_string())
            .arg("--mnemonic")
            .arg(TEST_MNEMONIC)
            .arg("--chain-id")
            .arg(ANVIL_CHAIN_ID.to_string())
            .arg("--silent")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Report::new(HarnessError::SpawnFailed(e.to_string())))?;

        let ready = (0..READY_ATTEMPTS).any(|_| {
            std::thread::sleep(Duration::from_millis(READY_POLL_INTERVAL_MS));
            is_listening(port)
        });
        if !ready {
            let mut stderr_output = String::new();
            if let Some(mut stderr) = child.stderr.take() {
                let _ = stderr.read_to_string(&mut stderr_output);
            }
            let _ = child.kill();
            let _ = child.wait();
            return Err(Report::new(HarnessError::NotReady(port)))
                .attach_printable(format!("anvil stderr: {}", stderr_output.trim()));
        }

        // a full pipe would block the node once it logs enough
        if let Some(stderr) = child.stderr.take() {
            std::thread::spawn(move || drain(stderr));
        }

        eprintln!("anvil listening on port {} (pid {})", port, child.id());
        Ok(Self {
            process: Some(child),
            port,
            url: format!("http://127.0.0.1:{}", port),
            chain_id: ANVIL_CHAIN_ID,
        })
    }
}

impl Drop for AnvilInstance {
    fn drop(&mut self) {
        if let Some(mut process) = self.process.take() {
            let _ = process.kill();
            let _ = process.wait();
        }
    }
}

/// Discards everything `output` yields until it is closed
fn drain(mut output: impl Read) -> u64 {
    std::io::copy(&mut output, &mut std::io::sink()).unwrap_or(0)
}

fn find_available_port() -> HarnessResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|e| Report::new(HarnessError::SpawnFailed(e.to_string())))?;
    let port = listener
        .local_addr()
        .map_err(|e| Report::new(HarnessError::SpawnFailed(e.to_string())))?
        .port();
    Ok(port)
}

fn is_listening(port: u16) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpStream::connect_timeout(&addr, Duration::from_millis(READY_POLL_INTERVAL_MS)).is_ok()
}

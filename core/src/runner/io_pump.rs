use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::RingBytes;

/// Raw bytes read from one of the child's streams.
#[derive(Debug)]
pub struct LogChunk {
    pub stream: &'static str,
    pub bytes: Vec<u8>,
}

pub fn pump_stdout<R>(rd: R, chunk_tx: mpsc::Sender<LogChunk>) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(rd, "stdout", chunk_tx)
}

pub fn pump_stderr<R>(rd: R, chunk_tx: mpsc::Sender<LogChunk>) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(rd, "stderr", chunk_tx)
}

fn pump<R>(
    mut rd: R,
    label: &'static str,
    chunk_tx: mpsc::Sender<LogChunk>,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        let mut writer_alive = true;

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: label,
                source: e,
            })?;
            if n == 0 {
                break;
            }
            total += n as u64;

            // Keep draining even if the writer is gone so the child never
            // blocks on a full pipe.
            if writer_alive {
                let chunk = LogChunk {
                    stream: label,
                    bytes: buf[..n].to_vec(),
                };
                writer_alive = chunk_tx.send(chunk).await.is_ok();
            }
        }

        Ok(total)
    })
}

/// Single owner of a job's log file. Both pumps funnel into it, so chunks land
/// in the order they were read and no other job can write here.
pub fn spawn_log_writer(
    mut file: tokio::fs::File,
    path: PathBuf,
    ring: Arc<RingBytes>,
    echo: bool,
    mut chunk_rx: mpsc::Receiver<LogChunk>,
) -> JoinHandle<Result<u64, RunnerError>> {
    tokio::spawn(async move {
        let mut written = 0u64;
        let log_err = |source: std::io::Error| RunnerError::LogIo {
            path: path.clone(),
            source,
        };

        while let Some(chunk) = chunk_rx.recv().await {
            file.write_all(&chunk.bytes).await.map_err(log_err)?;
            ring.push(&chunk.bytes);
            written += chunk.bytes.len() as u64;

            if echo {
                // Console mirroring is best effort; the log is authoritative.
                let _ = match chunk.stream {
                    "stderr" => tokio::io::stderr().write_all(&chunk.bytes).await,
                    _ => tokio::io::stdout().write_all(&chunk.bytes).await,
                };
            }
        }

        file.flush().await.map_err(log_err)?;
        file.sync_all().await.map_err(log_err)?;
        Ok(written)
    })
}

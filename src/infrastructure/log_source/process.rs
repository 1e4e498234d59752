//! Tails the output of a long-running external process (by default
//! `docker logs -f <container>`).

use crate::config::LogSourceEnvConfig;
use crate::domain::ports::LineSource;
use crate::infrastructure::log_source::reader::ReaderLogSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Lines buffered between the pipe readers and the classifier
const LINE_BUFFER: usize = 1024;

pub struct ProcessLogSource {
    child: Child,
    lines: mpsc::Receiver<String>,
    description: String,
    exited: bool,
}

impl ProcessLogSource {
    /// Spawn the configured command and start reading its output
    pub fn spawn(config: &LogSourceEnvConfig) -> Result<Self> {
        let args = config.args();
        let description = format!("{} {}", config.command, args.join(" "));

        let mut command = Command::new(&config.command);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(if config.include_stderr {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn log source `{}`", description))?;
        info!("Tailing log source: {}", description);

        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        if let Some(stdout) = child.stdout.take() {
            spawn_forwarder("stdout", stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_forwarder("stderr", stderr, tx.clone());
        }
        // The channel closes once every forwarder has hit EOF
        drop(tx);

        Ok(Self {
            child,
            lines: rx,
            description,
            exited: false,
        })
    }

    async fn reap(&mut self) -> Result<()> {
        if self.exited {
            return Ok(());
        }
        self.exited = true;
        let status = self
            .child
            .wait()
            .await
            .context("Failed to wait for log source process")?;
        if status.success() {
            info!("Log source `{}` exited normally", self.description);
        } else {
            warn!("Log source `{}` exited with {}", self.description, status);
        }
        Ok(())
    }
}

fn spawn_forwarder<R>(stream: &'static str, pipe: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = ReaderLogSource::new(BufReader::new(pipe), stream);
        loop {
            match reader.read_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Log source {} closed", stream);
                    break;
                }
                Err(e) => {
                    warn!("Failed to read log source {}: {}", stream, e);
                    break;
                }
            }
        }
    });
}

#[async_trait]
impl LineSource for ProcessLogSource {
    async fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.recv().await {
            Some(line) => Ok(Some(line)),
            None => {
                self.reap().await?;
                Ok(None)
            }
        }
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

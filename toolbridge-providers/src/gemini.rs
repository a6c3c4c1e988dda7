//! Gemini CLI backend
//!
//! Every call spawns the `gemini` executable with an argument list and the
//! prompt on stdin. Argument shapes live here; what to do with the
//! results (sessions, fallbacks) is up to the caller.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::base::{ProviderError, ProviderResult};
use crate::parse::{parse_json_output, parse_stream_json, StreamReply};

/// Captured result of one CLI run
#[derive(Debug, Clone, Default)]
pub struct CliOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    /// Stderr if present, otherwise stdout
    pub fn diagnostic(&self) -> String {
        if self.stderr.trim().is_empty() {
            self.stdout.clone()
        } else {
            self.stderr.clone()
        }
    }
}

/// Runs the CLI. Implementations must give up after `limit`.
#[async_trait]
pub trait CliRunner: Send + Sync {
    async fn run(
        &self,
        args: &[String],
        input: Option<&str>,
        limit: Duration,
    ) -> ProviderResult<CliOutput>;
}

/// Spawns a real child process
pub struct ProcessRunner {
    program: String,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl CliRunner for ProcessRunner {
    async fn run(
        &self,
        args: &[String],
        input: Option<&str>,
        limit: Duration,
    ) -> ProviderResult<CliOutput> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProviderError::SpawnFailed {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin while draining stdout/stderr, all under one deadline.
        // Dropping the future on timeout drops the child, which kills it.
        let stdin = child.stdin.take();
        let feed = async {
            if let (Some(text), Some(mut stdin)) = (input, stdin) {
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    debug!("stdin write to {} failed: {}", self.program, e);
                }
            }
        };
        let exchange = async {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = match timeout(limit, exchange).await {
            Ok(Ok(out)) => out,
            Ok(Err(source)) => {
                return Err(ProviderError::SpawnFailed {
                    program: self.program.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(ProviderError::Timeout {
                    secs: limit.as_secs(),
                })
            }
        };

        Ok(CliOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Output mode selected with `--output-format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    StreamJson,
}

impl OutputFormat {
    fn as_arg(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::StreamJson => "stream-json",
        }
    }
}

/// Where the file goes on an `analyze_file` attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileArg {
    Positional,
    Flag,
}

/// Gemini CLI client
pub struct GeminiCli {
    runner: Arc<dyn CliRunner>,
    default_model: Option<String>,
    call_timeout: Duration,
    admin_timeout: Duration,
}

impl GeminiCli {
    pub fn new(
        runner: Arc<dyn CliRunner>,
        default_model: Option<String>,
        call_timeout: Duration,
        admin_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            default_model,
            call_timeout,
            admin_timeout,
        }
    }

    /// Build the common argument prefix
    fn base_args(&self, format: OutputFormat, yolo: bool, model: Option<&str>) -> Vec<String> {
        let mut args = vec!["--output-format".to_string(), format.as_arg().to_string()];
        if yolo {
            args.push("--yolo".to_string());
        }
        if let Some(model) = model.or(self.default_model.as_deref()) {
            args.push("-m".to_string());
            args.push(model.to_string());
        }
        args
    }

    async fn run_checked(&self, args: Vec<String>, input: &str) -> ProviderResult<CliOutput> {
        debug!("gemini {}", args.join(" "));
        let output = self
            .runner
            .run(&args, Some(input), self.call_timeout)
            .await?;
        if output.success {
            Ok(output)
        } else {
            debug!("gemini exited with {:?}", output.code);
            Err(ProviderError::CommandFailed(output.diagnostic()))
        }
    }

    /// One stateless prompt in single-answer mode
    pub async fn ask(&self, prompt: &str, model: Option<&str>, yolo: bool) -> ProviderResult<String> {
        let args = self.base_args(OutputFormat::Json, yolo, model);
        let output = self.run_checked(args, prompt).await?;
        Ok(parse_json_output(&output.stdout))
    }

    /// Priming call in stream mode; surfaces the native session id if the CLI reports one
    pub async fn prime(&self, prompt: &str, model: Option<&str>) -> ProviderResult<StreamReply> {
        let args = self.base_args(OutputFormat::StreamJson, true, model);
        let output = self.run_checked(args, prompt).await?;
        Ok(parse_stream_json(&output.stdout))
    }

    /// Continue a native session with only the new message
    pub async fn resume(
        &self,
        handle: &str,
        message: &str,
        model: Option<&str>,
    ) -> ProviderResult<String> {
        let mut args = self.base_args(OutputFormat::Json, true, model);
        args.splice(2..2, ["--resume".to_string(), handle.to_string()]);
        let output = self.run_checked(args, message).await?;
        Ok(parse_json_output(&output.stdout))
    }

    /// Analyze a file: positional path first, then `-f PATH` if that exits non-zero.
    ///
    /// At most two runs; spawn failures and timeouts are returned as-is.
    pub async fn analyze_file(
        &self,
        file_path: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> ProviderResult<String> {
        match self
            .analyze_file_with(FileArg::Positional, file_path, prompt, model)
            .await
        {
            Err(ProviderError::CommandFailed(reason)) => {
                debug!("positional file argument rejected ({}), retrying with -f", reason.trim());
                self.analyze_file_with(FileArg::Flag, file_path, prompt, model)
                    .await
            }
            other => other,
        }
    }

    async fn analyze_file_with(
        &self,
        shape: FileArg,
        file_path: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> ProviderResult<String> {
        let mut args = self.base_args(OutputFormat::Json, true, model);
        if shape == FileArg::Flag {
            args.push("-f".to_string());
        }
        args.push(file_path.to_string());
        let output = self.run_checked(args, prompt).await?;
        Ok(parse_json_output(&output.stdout))
    }

    /// Raw `--list-sessions` output
    pub async fn list_sessions(&self) -> ProviderResult<String> {
        let args = vec!["--list-sessions".to_string()];
        let output = self.runner.run(&args, None, self.admin_timeout).await?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(ProviderError::CommandFailed(output.diagnostic()))
        }
    }

    /// Delete the CLI session at 1-based `position` in the listing
    pub async fn delete_session(&self, position: usize) -> ProviderResult<()> {
        let args = vec!["--delete-session".to_string(), position.to_string()];
        let output = self.runner.run(&args, None, self.admin_timeout).await?;
        if output.success {
            Ok(())
        } else {
            Err(ProviderError::CommandFailed(output.diagnostic()))
        }
    }

    /// Find the native session in the CLI listing and delete it
    pub async fn delete_native_session(&self, handle: &str) -> ProviderResult<()> {
        let listing = self.list_sessions().await?;
        let position = session_position(&listing, handle).ok_or_else(|| {
            ProviderError::InvalidResponse(format!("session {} not in CLI listing", handle))
        })?;
        self.delete_session(position).await
    }
}

/// 1-based index of the first listing line mentioning `handle`
pub fn session_position(listing: &str, handle: &str) -> Option<usize> {
    listing
        .trim()
        .lines()
        .position(|line| line.contains(handle))
        .map(|i| i + 1)
}

//! PowerShell runner: one-shot command invocation with text or JSON output.
//!
//! Every invocation is logged at trace with the full command text; failures
//! are logged at error with the same text and returned to the caller.
//! Data-layer callers degrade to empty defaults, control-layer callers
//! ignore the error.

use std::time::Duration;

use serde_json::Value;
use tracing::{error, trace};

use crate::ShellError;
use crate::pipeline::{Pipeline, quote};

/// Default `-Depth` for the `ConvertTo-Json` stage.
const DEFAULT_JSON_DEPTH: u32 = 2;

/// Poll period for [`PowerShell::wait_process`].
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the caller wants command output interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    None,
    Text,
    Json,
}

/// Interpreted output of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellOutput {
    None,
    Text(String),
    Json(Value),
}

impl ShellOutput {
    /// Returns the text payload, or an empty string for other variants.
    pub fn into_text(self) -> String {
        match self {
            ShellOutput::Text(t) => t,
            _ => String::new(),
        }
    }

    /// Returns the JSON payload, or `Value::Null` for other variants.
    pub fn into_json(self) -> Value {
        match self {
            ShellOutput::Json(v) => v,
            _ => Value::Null,
        }
    }
}

/// A process selected by name pattern or by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessTarget {
    Name(String),
    Id(u32),
}

/// Options for `Start-Process`.
#[derive(Debug, Clone, Default)]
pub struct StartProcessOptions {
    pub target: String,
    pub args: Vec<String>,
    pub verb: Option<String>,
    pub working_directory: Option<String>,
    pub window_style: Option<String>,
}

impl StartProcessOptions {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }
}

/// One-shot PowerShell invoker.
pub struct PowerShell {
    program: String,
    args_prefix: Vec<String>,
}

impl Default for PowerShell {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerShell {
    /// Runner using the system `powershell` interpreter.
    pub fn new() -> Self {
        Self {
            program: "powershell".into(),
            args_prefix: vec![
                "-NoProfile".into(),
                "-NonInteractive".into(),
                "-Command".into(),
            ],
        }
    }

    /// Runner using an alternate launcher. Used by tests to route command
    /// text through `sh -c`.
    pub fn with_launcher(program: impl Into<String>, args_prefix: &[&str]) -> Self {
        Self {
            program: program.into(),
            args_prefix: args_prefix.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// Runs a pipeline. In [`OutputMode::Json`] a `ConvertTo-Json` stage is
    /// appended first unless the pipeline already carries one.
    pub async fn run(
        &self,
        pipeline: &Pipeline,
        mode: OutputMode,
    ) -> Result<ShellOutput, ShellError> {
        let text = if mode == OutputMode::Json && !pipeline.has_json_stage() {
            pipeline.clone().to_json(DEFAULT_JSON_DEPTH).render()
        } else {
            pipeline.render()
        };
        self.run_raw(&text, mode).await
    }

    /// Runs already-rendered command text.
    pub async fn run_raw(&self, command: &str, mode: OutputMode) -> Result<ShellOutput, ShellError> {
        trace!(command, "invoking shell");

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args_prefix)
            .arg(command)
            .output()
            .await
            .map_err(|e| {
                error!(command, "failed to spawn shell: {e}");
                ShellError::Spawn(e.to_string())
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(command, code, stderr, "shell command failed");
            return Err(ShellError::Exit { code, stderr });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();

        Ok(match mode {
            OutputMode::None => ShellOutput::None,
            OutputMode::Text => ShellOutput::Text(trimmed.to_string()),
            OutputMode::Json => {
                // Empty stdout is a valid empty result, not a parse error.
                if trimmed.is_empty() {
                    ShellOutput::Json(Value::Array(Vec::new()))
                } else {
                    ShellOutput::Json(serde_json::from_str(trimmed)?)
                }
            }
        })
    }

    /// Reads a registry entry via `Get-ItemProperty`, projected to
    /// `properties`. Returns the decoded JSON value; the caller decides
    /// which fields are required.
    pub async fn read_registry_entry(
        &self,
        path: &str,
        properties: &[&str],
    ) -> Result<Value, ShellError> {
        let pipeline =
            Pipeline::new(format!("Get-ItemProperty -Path {}", quote(path))).select(properties);
        Ok(self.run(&pipeline, OutputMode::Json).await?.into_json())
    }

    /// Queries processes by name pattern with an optional `Where-Object`
    /// predicate. Absent processes and command failures both degrade to an
    /// empty list.
    pub async fn get_process(
        &self,
        name: &str,
        filter: Option<&str>,
        properties: &[&str],
    ) -> Vec<Value> {
        let pipeline = Pipeline::new(format!(
            "Get-Process -Name {} -ErrorAction SilentlyContinue",
            quote(name)
        ))
        .filter(filter)
        .select(properties);

        match self.run(&pipeline, OutputMode::Json).await {
            Ok(out) => coerce_array(out.into_json()),
            Err(e) => {
                error!(name, "process query failed: {e}");
                Vec::new()
            }
        }
    }

    /// Reads a file as raw text. Missing files and failures degrade to an
    /// empty string.
    pub async fn get_content(&self, path: &str) -> String {
        let pipeline = Pipeline::new(format!("Get-Content -Path {} -Raw", quote(path)));
        match self.run(&pipeline, OutputMode::Text).await {
            Ok(out) => out.into_text(),
            Err(e) => {
                error!(path, "content read failed: {e}");
                String::new()
            }
        }
    }

    /// Starts a process via `Start-Process`.
    pub async fn start_process(&self, options: &StartProcessOptions) -> Result<(), ShellError> {
        let pipeline = Pipeline::new(start_process_statement(options));
        self.run(&pipeline, OutputMode::None).await?;
        Ok(())
    }

    /// Stops a process, optionally with `-Force`.
    pub async fn stop_process(
        &self,
        target: &ProcessTarget,
        force: bool,
    ) -> Result<(), ShellError> {
        let selector = match target {
            ProcessTarget::Name(name) => format!("-Name {}", quote(name)),
            ProcessTarget::Id(id) => format!("-Id {id}"),
        };
        let force = if force { " -Force" } else { "" };
        let pipeline = Pipeline::new(format!(
            "Stop-Process {selector}{force} -ErrorAction SilentlyContinue"
        ));
        self.run(&pipeline, OutputMode::None).await?;
        Ok(())
    }

    /// Waits until no process matches `target`, polling every 100 ms.
    /// Returns `true` once the process is gone, `false` on timeout.
    /// Never errors: query failures count as "not running".
    pub async fn wait_process(&self, target: &ProcessTarget, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let running = match target {
                ProcessTarget::Name(name) => !self.get_process(name, None, &[]).await.is_empty(),
                ProcessTarget::Id(id) => {
                    !self
                        .get_process("*", Some(&format!("$_.Id -eq {id}")), &[])
                        .await
                        .is_empty()
                }
            };
            if !running {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

/// Renders a `Start-Process` statement from options.
fn start_process_statement(options: &StartProcessOptions) -> String {
    let mut params = vec![format!("-FilePath {}", quote(&options.target))];

    if !options.args.is_empty() {
        let list: Vec<String> = options.args.iter().map(|a| quote(a)).collect();
        params.push(format!("-ArgumentList {}", list.join(", ")));
    }

    if let Some(verb) = &options.verb {
        params.push(format!("-Verb {}", quote(verb)));
    }

    if let Some(dir) = &options.working_directory {
        params.push(format!("-WorkingDirectory {}", quote(dir)));
    }

    if let Some(style) = &options.window_style {
        params.push(format!("-WindowStyle {style}"));
    }

    format!("Start-Process {}", params.join(" "))
}

/// Normalizes `ConvertTo-Json` output to a list: PowerShell collapses a
/// single-element result to a bare object.
pub fn coerce_array(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

use std::io::Write as _;
use std::process::{Command, Stdio};

use crate::engine::TypesetEngine;
use crate::foundation::error::{LatexError, LatexResult};
use crate::options::RenderOptions;

/// How the markup reaches the converter process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TexInput {
    /// Appended as the last command-line argument.
    #[default]
    Arg,
    /// Written to the child's stdin, which is then closed.
    Stdin,
}

/// Options for [`ProcessEngine`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProcessEngineOpts {
    /// Converter executable, looked up on `PATH` when not absolute.
    pub program: String,
    /// Arguments placed before the markup.
    pub args: Vec<String>,
    pub input: TexInput,
    /// Environment variable receiving the JSON-serialized render options.
    pub options_env: Option<String>,
}

impl Default for ProcessEngineOpts {
    fn default() -> Self {
        Self {
            program: "tex2svg".to_string(),
            args: Vec::new(),
            input: TexInput::Arg,
            options_env: Some("WAVYTE_LATEX_OPTIONS".to_string()),
        }
    }
}

/// Engine that spawns an external TeX-to-SVG converter once per conversion and reads the SVG
/// document from its stdout.
#[derive(Clone, Debug, Default)]
pub struct ProcessEngine {
    opts: ProcessEngineOpts,
}

impl ProcessEngine {
    pub fn new(opts: ProcessEngineOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &ProcessEngineOpts {
        &self.opts
    }
}

impl TypesetEngine for ProcessEngine {
    fn convert(&self, tex: &str, options: &RenderOptions) -> LatexResult<String> {
        if self.opts.program.is_empty() {
            return Err(LatexError::validation("engine program must be non-empty"));
        }

        let mut cmd = Command::new(&self.opts.program);
        cmd.args(&self.opts.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        match self.opts.input {
            TexInput::Arg => {
                cmd.arg(tex).stdin(Stdio::null());
            }
            TexInput::Stdin => {
                cmd.stdin(Stdio::piped());
            }
        }
        if let Some(var) = self.opts.options_env.as_deref() {
            cmd.env(var, options.to_json()?);
        }

        tracing::debug!(program = %self.opts.program, "spawning typesetting engine");
        let mut child = cmd.spawn().map_err(|e| {
            LatexError::engine(format!(
                "failed to spawn '{}' (is it installed and on PATH?): {e}",
                self.opts.program
            ))
        })?;

        // Feed stdin from a separate thread so a chatty child cannot fill stdout and block us.
        let feeder = match child.stdin.take() {
            Some(mut stdin) => {
                let bytes = tex.as_bytes().to_vec();
                Some(std::thread::spawn(move || stdin.write_all(&bytes)))
            }
            None => None,
        };

        let output = child.wait_with_output().map_err(|e| {
            LatexError::engine(format!("failed to wait for '{}': {e}", self.opts.program))
        })?;

        if let Some(feeder) = feeder {
            match feeder.join() {
                Ok(Ok(())) => {}
                // The child may exit without reading its input; the exit status decides.
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => {
                    return Err(LatexError::engine(format!(
                        "failed to write markup to '{}': {e}",
                        self.opts.program
                    )));
                }
                Err(_) => return Err(LatexError::engine("stdin writer thread panicked")),
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LatexError::engine(format!(
                "'{}' exited with {}: {}",
                self.opts.program,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            LatexError::engine(format!(
                "'{}' produced non-utf-8 output: {e}",
                self.opts.program
            ))
        })
    }
}

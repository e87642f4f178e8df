//! Script evaluators used to run recovered signature programs
//!
//! A program handed to an evaluator is plain JavaScript whose completion
//! value (the value of its last expression statement) is the output.

use crate::error::VidmapError;
use std::io::Write;
use std::process::Command;
use std::time::Duration;
use tracing::debug;

/// Default per-program time limit of [`ProcessEvaluator`]
pub const DEFAULT_EVAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Capability to run an untrusted script program and return its output
pub trait ScriptEvaluator {
    /// Evaluate `program` and return its completion value as a string
    fn evaluate(&self, program: &str) -> Result<String, VidmapError>;
}

impl<F> ScriptEvaluator for F
where
    F: Fn(&str) -> Result<String, VidmapError>,
{
    fn evaluate(&self, program: &str) -> Result<String, VidmapError> {
        self(program)
    }
}

/// Runs programs with an external node-compatible interpreter.
///
/// The program is written to a temporary script that evaluates it inside a
/// fresh `vm` context with an empty global object and a timeout, then prints
/// its completion value to stdout. Program code never sees `process`,
/// `require` or any other host binding.
#[derive(Debug, Clone)]
pub struct ProcessEvaluator {
    interpreter: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessEvaluator {
    /// Use `node` from PATH
    pub fn new() -> Self {
        Self::with_interpreter("node")
    }

    /// Use a different node-compatible binary
    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            args: Vec::new(),
            timeout: DEFAULT_EVAL_TIMEOUT,
        }
    }

    /// Extra arguments passed before the program file
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Longest time a single program may run inside the sandbox
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Interpreter from `VIDMAP_JS_INTERPRETER`, falling back to node
    pub fn from_env() -> Self {
        match std::env::var("VIDMAP_JS_INTERPRETER") {
            Ok(interpreter) if !interpreter.trim().is_empty() => {
                Self::with_interpreter(interpreter.trim())
            }
            _ => Self::new(),
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wrap a program so it runs in an isolated context and its completion
    /// value is printed
    fn wrap(&self, program: &str) -> Result<String, VidmapError> {
        let quote = |text: &str| {
            serde_json::to_string(text)
                .map_err(|e| VidmapError::EvaluatorError(format!("cannot quote program: {}", e)))
        };
        // Conversion to string happens inside the context, under the timeout
        let inner = format!("String(eval({}))", quote(program)?);
        Ok(format!(
            "console.log(require('vm').runInNewContext({}, Object.create(null), {{ timeout: {} }}));\n",
            quote(&inner)?,
            self.timeout.as_millis().max(1)
        ))
    }
}

impl Default for ProcessEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEvaluator for ProcessEvaluator {
    fn evaluate(&self, program: &str) -> Result<String, VidmapError> {
        let mut file = tempfile::Builder::new()
            .prefix("vidmap-")
            .suffix(".cjs")
            .tempfile()?;
        file.write_all(self.wrap(program)?.as_bytes())?;
        file.flush()?;

        debug!(
            "Running {} on {} ({} bytes)",
            self.interpreter,
            file.path().display(),
            program.len()
        );

        let output = Command::new(&self.interpreter)
            .args(&self.args)
            .arg(file.path())
            .output()
            .map_err(|e| {
                VidmapError::EvaluatorError(format!("failed to run {}: {}", self.interpreter, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidmapError::EvaluatorError(format!(
                "{} exited with code {}: {}",
                self.interpreter,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Runs programs in an embedded V8 isolate without any host ops
#[cfg(feature = "deno")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DenoEvaluator;

#[cfg(feature = "deno")]
impl DenoEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "deno")]
impl ScriptEvaluator for DenoEvaluator {
    fn evaluate(&self, program: &str) -> Result<String, VidmapError> {
        use deno_core::{FastString, JsRuntime, RuntimeOptions};

        // A fresh runtime per program keeps candidates from seeing each other
        let mut runtime = JsRuntime::new(RuntimeOptions::default());
        let result = runtime
            .execute_script("<signature>", FastString::from(program.to_string()))
            .map_err(|e| VidmapError::EvaluatorError(format!("script error: {:?}", e)))?;

        let scope = &mut runtime.handle_scope();
        let local_value = result.open(scope);
        Ok(local_value.to_rust_string_lossy(scope).trim().to_string())
    }
}

//! Compilation strategies.
//!
//! The orchestrator never compiles anything itself. It hands roots to a
//! [`CompileStrategy`] and only looks at whether the strategy succeeded.

use std::path::{Path, PathBuf};
use std::process::Command;

use texforge_config::CompilerConfig;
use tracing::debug;

/// Result of one compiler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    /// Whether the compiler reported success.
    pub success: bool,
    /// The produced document, if one exists.
    pub output_artifact: Option<PathBuf>,
    /// Everything the compiler printed. Not interpreted here.
    pub raw_log: String,
}

impl CompileOutcome {
    /// A failed outcome carrying only a log message.
    pub fn failure(raw_log: impl Into<String>) -> Self {
        Self {
            success: false,
            output_artifact: None,
            raw_log: raw_log.into(),
        }
    }
}

/// A way of turning a root document into output.
pub trait CompileStrategy: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Returns `true` if the strategy can run on this machine.
    fn is_available(&self) -> bool;

    /// Compiles `document` as a root.
    fn build(&self, document: &Path) -> CompileOutcome;

    /// Recompiles only `targets` of `root`.
    ///
    /// Strategies that cannot compile sections independently fall back to a
    /// full build of the root.
    fn build_partial(&self, root: &Path, _targets: &[PathBuf]) -> CompileOutcome {
        self.build(root)
    }
}

/// Runs an external program in the root's directory.
///
/// The root's file name is appended to the configured arguments.
#[derive(Debug, Clone)]
pub struct CommandStrategy {
    program: String,
    args: Vec<String>,
    output_extension: String,
}

impl CommandStrategy {
    /// Creates a strategy running `program` with `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            output_extension: "pdf".to_string(),
        }
    }

    /// Sets the extension of the artifact reported after a successful run.
    pub fn with_output_extension(mut self, ext: impl Into<String>) -> Self {
        self.output_extension = ext.into();
        self
    }

    /// The program this strategy runs.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments passed before the document name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn locate_program(&self) -> Option<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file().then(|| program.to_path_buf());
        }
        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .flat_map(|dir| executable_candidates(&dir, &self.program))
            .find(|candidate| candidate.is_file())
    }
}

impl From<&CompilerConfig> for CommandStrategy {
    fn from(config: &CompilerConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

#[cfg(windows)]
fn executable_candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program), dir.join(format!("{program}.exe"))]
}

#[cfg(not(windows))]
fn executable_candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

impl CompileStrategy for CommandStrategy {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        self.locate_program().is_some()
    }

    fn build(&self, document: &Path) -> CompileOutcome {
        let Some(file_name) = document.file_name() else {
            return CompileOutcome::failure(format!("not a file: {}", document.display()));
        };
        let dir = document.parent().unwrap_or_else(|| Path::new("."));

        debug!(program = %self.program, document = %document.display(), "running compiler");
        let output = match Command::new(&self.program)
            .args(&self.args)
            .arg(file_name)
            .current_dir(dir)
            .output()
        {
            Ok(output) => output,
            Err(e) => return CompileOutcome::failure(format!("failed to run {}: {e}", self.program)),
        };

        let mut raw_log = String::from_utf8_lossy(&output.stdout).into_owned();
        raw_log.push_str(&String::from_utf8_lossy(&output.stderr));
        let artifact = document.with_extension(&self.output_extension);
        let success = output.status.success();
        CompileOutcome {
            success,
            output_artifact: (success && artifact.is_file()).then_some(artifact),
            raw_log,
        }
    }
}

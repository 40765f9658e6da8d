//! Toolchain invocation - runs `go` subcommands for the installer.
//!
//! The process-search and subprocess primitives sit behind `ProcessRunner`
//! so hosts and tests can substitute their own. Every invocation gets a
//! fresh `ToolchainEnvironment` and its own scratch directory, which is
//! removed when the invocation returns.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

use crate::api::types::InstallError;
use crate::runtime::path::find_on_search_path;
use crate::runtime::version::{InstallVerb, RuntimeVersion};

/// Hides the console window the toolchain would otherwise open on Windows.
#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// A fully specified toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Variables set on top of the inherited process environment
    pub env: Vec<(String, String)>,
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Process-search and subprocess primitives consumed by the manager.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Resolve a program on the search path.
    fn find_program(&self, program: &str) -> Option<PathBuf>;

    /// Run a command to completion, capturing stdout, stderr and exit code.
    async fn run(&self, command: ToolchainCommand) -> Result<ProcessOutput, InstallError>;
}

/// `ProcessRunner` backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    fn find_program(&self, program: &str) -> Option<PathBuf> {
        find_on_search_path(program)
    }

    async fn run(&self, command: ToolchainCommand) -> Result<ProcessOutput, InstallError> {
        log::debug!(
            "Running toolchain command: program={}, args={:?}",
            command.program.display(),
            command.args
        );

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(target_os = "windows")]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let output = cmd.output().await.map_err(|e| InstallError::Io {
            message: format!(
                "Failed to spawn '{}': {e}",
                command.program.display()
            ),
        })?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Environment overrides for a single toolchain invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainEnvironment {
    vars: Vec<(String, String)>,
}

impl ToolchainEnvironment {
    /// Module mode on, with all caches and outputs kept under `base_dir`.
    pub fn for_base_dir(base_dir: &Path) -> Self {
        let path = |p: PathBuf| p.to_string_lossy().into_owned();
        Self {
            vars: vec![
                ("GO111MODULE".to_string(), "on".to_string()),
                ("GOPATH".to_string(), path(base_dir.to_path_buf())),
                ("GOBIN".to_string(), path(base_dir.join("bin"))),
                ("GOCACHE".to_string(), path(base_dir.join("go-build"))),
                ("GOMODCACHE".to_string(), path(base_dir.join("pkg").join("mod"))),
            ],
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn into_vars(self) -> Vec<(String, String)> {
        self.vars
    }
}

/// A located toolchain bound to one installation directory.
pub struct Toolchain<'a> {
    runner: &'a dyn ProcessRunner,
    program: PathBuf,
    base_dir: PathBuf,
}

impl<'a> Toolchain<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, program: PathBuf, base_dir: PathBuf) -> Self {
        Self {
            runner,
            program,
            base_dir,
        }
    }

    /// Run a subcommand with a fresh environment and a scratch `GOTMPDIR`.
    ///
    /// The scratch directory is owned by this call and deleted when it
    /// returns, whatever the outcome.
    async fn run_subcommand(&self, args: Vec<String>) -> Result<ProcessOutput, InstallError> {
        let scratch = TempDir::new().map_err(|e| InstallError::Io {
            message: format!("Failed to create toolchain scratch directory: {e}"),
        })?;

        let mut env = ToolchainEnvironment::for_base_dir(&self.base_dir);
        env.set("GOTMPDIR", scratch.path().to_string_lossy());

        let command = ToolchainCommand {
            program: self.program.clone(),
            args,
            env: env.into_vars(),
        };
        self.runner.run(command).await
    }

    /// Query the toolchain's own version.
    pub async fn version(&self) -> Result<RuntimeVersion, InstallError> {
        let output = self.run_subcommand(vec!["version".to_string()]).await?;
        if !output.success() {
            return Err(InstallError::VersionProbeFailed {
                stderr: output.stderr,
                exit_code: output.exit_code,
            });
        }

        let version = RuntimeVersion::parse(&output.stdout);
        log::debug!("Toolchain version: {version} (raw={:?})", output.stdout.trim());
        Ok(version)
    }

    /// Fetch and build `module` with the given verb.
    pub async fn install(&self, verb: InstallVerb, module: &str) -> Result<(), InstallError> {
        log::info!("Installing module: verb={}, module={module}", verb.as_str());

        let output = self
            .run_subcommand(vec![verb.as_str().to_string(), module.to_string()])
            .await?;
        if !output.success() {
            return Err(InstallError::InstallCommandFailed {
                stderr: output.stderr,
                exit_code: output.exit_code,
            });
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;

    fn toolchain<'a>(runner: &'a ScriptedRunner, base: &Path) -> Toolchain<'a> {
        Toolchain::new(runner, PathBuf::from("go"), base.to_path_buf())
    }

    #[test]
    fn test_environment_for_base_dir() {
        let base = PathBuf::from("/data/LSP-gopls");
        let env = ToolchainEnvironment::for_base_dir(&base);
        let expect = |p: PathBuf| p.to_string_lossy().into_owned();

        assert_eq!(env.get("GO111MODULE"), Some("on"));
        assert_eq!(env.get("GOPATH"), Some(expect(base.clone()).as_str()));
        assert_eq!(env.get("GOBIN"), Some(expect(base.join("bin")).as_str()));
        assert_eq!(env.get("GOCACHE"), Some(expect(base.join("go-build")).as_str()));
        assert_eq!(env.get("GOTMPDIR"), None);
    }

    #[test]
    fn test_environment_set_overrides() {
        let mut env = ToolchainEnvironment::default();
        env.set("GOTMPDIR", "/a");
        env.set("GOTMPDIR", "/b");
        assert_eq!(env.get("GOTMPDIR"), Some("/b"));
        assert_eq!(env.into_vars().len(), 1);
    }

    #[tokio::test]
    async fn test_version_parses_stdout() {
        let base = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().respond("go version go1.21.4 linux/amd64\n", "", 0);

        let version = toolchain(&runner, base.path()).version().await.unwrap();

        assert_eq!(version, RuntimeVersion::new(1, 21, 4));
        assert_eq!(runner.calls()[0].args, vec!["version".to_string()]);
    }

    #[tokio::test]
    async fn test_version_nonzero_exit_is_probe_failure() {
        let base = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().respond("", "GOROOT not set", 2);

        let result = toolchain(&runner, base.path()).version().await;

        assert_eq!(
            result,
            Err(InstallError::VersionProbeFailed {
                stderr: "GOROOT not set".to_string(),
                exit_code: Some(2),
            })
        );
    }

    #[tokio::test]
    async fn test_scratch_dir_exists_during_call_and_is_removed_after() {
        let base = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().respond("", "boom", 1);

        let result = toolchain(&runner, base.path())
            .install(InstallVerb::Install, "golang.org/x/tools/gopls@v0.11.0")
            .await;
        assert!(matches!(result, Err(InstallError::InstallCommandFailed { .. })));

        let call = &runner.calls()[0];
        assert!(call.tmp_dir_existed);
        assert!(!call.tmp_dir.as_ref().unwrap().exists());
    }

    #[tokio::test]
    async fn test_each_invocation_gets_its_own_scratch_dir() {
        let base = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .respond("go version go1.20 linux/amd64", "", 0)
            .respond("", "", 0);
        let tc = toolchain(&runner, base.path());

        tc.version().await.unwrap();
        tc.install(InstallVerb::Install, "example.com/tool@v1.0.0")
            .await
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].tmp_dir, calls[1].tmp_dir);
        assert_eq!(
            calls[1].args,
            vec!["install".to_string(), "example.com/tool@v1.0.0".to_string()]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_output_and_exit_code() {
        let runner = SystemProcessRunner;
        let output = runner
            .run(ToolchainCommand {
                program: PathBuf::from("sh"),
                args: vec![
                    "-c".to_string(),
                    "printf \"$GREETING\"; printf oops >&2; exit 3".to_string(),
                ],
                env: vec![("GREETING".to_string(), "hello".to_string())],
            })
            .await
            .unwrap();

        assert_eq!(output.stdout, "hello");
        assert_eq!(output.stderr, "oops");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_system_runner_spawn_failure_is_io_error() {
        let runner = SystemProcessRunner;
        let result = runner
            .run(ToolchainCommand {
                program: PathBuf::from("/nonexistent/toolchain/go-12345"),
                args: Vec::new(),
                env: Vec::new(),
            })
            .await;
        assert!(matches!(result, Err(InstallError::Io { .. })));
    }
}

use crate::converter::service_to_run_args;
use crate::error::{ContainerError, Result};
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use salesdash_core::ServiceSpec;
use std::path::Path;
use std::sync::Arc;

/// Outcome of [`DockerCli::ensure_network`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Created,
    AlreadyExisted,
}

/// Container runtime driven through its CLI
///
/// Every call is a single subprocess whose exit code decides success.
#[derive(Clone)]
pub struct DockerCli {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl DockerCli {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(&self.program).args(args)
    }

    async fn run_checked(&self, spec: CommandSpec) -> Result<CommandOutput> {
        self.runner.run(&spec).await?.ensure_success(&spec)
    }

    pub async fn network_exists(&self, name: &str) -> Result<bool> {
        let output = self
            .runner
            .run(&self.command(["network", "inspect", name]))
            .await?;
        Ok(output.is_success())
    }

    /// Create a bridge network unless it is already there
    ///
    /// A create that loses a race against another run reports "already
    /// exists"; that is accepted as well.
    pub async fn ensure_network(&self, name: &str) -> Result<NetworkStatus> {
        if self.network_exists(name).await? {
            return Ok(NetworkStatus::AlreadyExisted);
        }

        match self
            .run_checked(self.command(["network", "create", "--driver", "bridge", name]))
            .await
        {
            Ok(_) => Ok(NetworkStatus::Created),
            Err(err @ ContainerError::CommandFailed { .. }) => {
                if err.stderr().contains("already exists") {
                    Ok(NetworkStatus::AlreadyExisted)
                } else {
                    Err(err)
                }
            }
            Err(e) => Err(e),
        }
    }

    pub async fn remove_network(&self, name: &str) -> Result<()> {
        self.run_checked(self.command(["network", "rm", name]))
            .await
            .map(|_| ())
    }

    /// Start a detached container; returns the container id
    pub async fn run_service(&self, service: &ServiceSpec) -> Result<String> {
        let output = self
            .run_checked(self.command(service_to_run_args(service)))
            .await?;
        Ok(output.stdout.trim().to_string())
    }

    pub async fn container_exists(&self, name: &str) -> Result<bool> {
        let output = self
            .runner
            .run(&self.command(["container", "inspect", name]))
            .await?;
        Ok(output.is_success())
    }

    pub async fn stop(&self, container: &str) -> Result<()> {
        self.run_checked(self.command(["stop", container]))
            .await
            .map(|_| ())
    }

    /// Run a command inside a container; nonzero exit is an error
    pub async fn exec(&self, container: &str, cmd: &[&str]) -> Result<CommandOutput> {
        let spec = self
            .command(["exec", container])
            .args(cmd.iter().copied());
        self.run_checked(spec).await
    }

    /// Like [`exec`](Self::exec), with `stdin` piped into the command
    pub async fn exec_with_stdin(
        &self,
        container: &str,
        cmd: &[&str],
        stdin: &Path,
    ) -> Result<CommandOutput> {
        let spec = self
            .command(["exec", "-i", container])
            .args(cmd.iter().copied())
            .stdin_file(stdin);
        self.run_checked(spec).await
    }

    /// Exec used as a readiness probe: any failure just means "not yet"
    pub async fn probe_exec(&self, container: &str, cmd: &[&str]) -> bool {
        let spec = self
            .command(["exec", container])
            .args(cmd.iter().copied());
        match self.runner.run(&spec).await {
            Ok(output) => output.is_success(),
            Err(e) => {
                tracing::debug!("probe failed to run: {}", e);
                false
            }
        }
    }

    pub async fn build_image(&self, image: &str, context: &Path) -> Result<()> {
        let context = context.display().to_string();
        self.run_checked(self.command(["build", "-t", image, context.as_str()]))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;
    use salesdash_core::LaunchConfig;

    fn cli(runner: &Arc<RecordingRunner>) -> DockerCli {
        DockerCli::new("docker", runner.clone())
    }

    #[tokio::test]
    async fn test_ensure_network_creates_when_missing() {
        let runner = Arc::new(
            RecordingRunner::new().on("network inspect", CommandOutput::failure(1, "not found")),
        );

        let status = cli(&runner).ensure_network("sales-net").await.unwrap();

        assert_eq!(status, NetworkStatus::Created);
        assert_eq!(
            runner.command_lines(),
            vec![
                "docker network inspect sales-net",
                "docker network create --driver bridge sales-net",
            ]
        );
    }

    #[tokio::test]
    async fn test_ensure_network_skips_existing() {
        let runner = Arc::new(RecordingRunner::new());

        let status = cli(&runner).ensure_network("sales-net").await.unwrap();

        assert_eq!(status, NetworkStatus::AlreadyExisted);
        assert_eq!(runner.count_matching("network create"), 0);
    }

    #[tokio::test]
    async fn test_ensure_network_tolerates_create_race() {
        let runner = Arc::new(
            RecordingRunner::new()
                .on("network inspect", CommandOutput::failure(1, "not found"))
                .on(
                    "network create",
                    CommandOutput::failure(1, "network with name sales-net already exists"),
                ),
        );

        let status = cli(&runner).ensure_network("sales-net").await.unwrap();
        assert_eq!(status, NetworkStatus::AlreadyExisted);
    }

    #[tokio::test]
    async fn test_ensure_network_propagates_other_failures() {
        let runner = Arc::new(
            RecordingRunner::new()
                .on("network inspect", CommandOutput::failure(1, "not found"))
                .on("network create", CommandOutput::failure(1, "permission denied")),
        );

        let err = cli(&runner).ensure_network("sales-net").await.unwrap_err();
        assert!(matches!(err, ContainerError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_run_service_returns_container_id() {
        let runner = Arc::new(RecordingRunner::new().on("run -d", CommandOutput::success("abc123\n")));
        let service = LaunchConfig::default().database_service();

        let id = cli(&runner).run_service(&service).await.unwrap();

        assert_eq!(id, "abc123");
        assert!(runner.command_lines()[0].starts_with("docker run -d --rm --name sales-postgres"));
    }

    #[tokio::test]
    async fn test_exec_with_stdin_uses_interactive_flag() {
        let runner = Arc::new(RecordingRunner::new());

        cli(&runner)
            .exec_with_stdin("db", &["psql", "-c", "COPY products FROM STDIN"], Path::new("p.csv"))
            .await
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].args[..3], ["exec", "-i", "db"]);
        assert_eq!(calls[0].stdin.as_deref(), Some(Path::new("p.csv")));
    }

    #[tokio::test]
    async fn test_probe_exec_reports_failure_as_false() {
        let runner = Arc::new(
            RecordingRunner::new().on("pg_isready", CommandOutput::failure(2, "no response")),
        );

        assert!(!cli(&runner).probe_exec("db", &["pg_isready"]).await);
    }
}

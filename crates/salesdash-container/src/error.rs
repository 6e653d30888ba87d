use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "Failed to start '{program}': {source}\n\nHint:\n  • Check that the container runtime is installed and on PATH\n  • Check that Docker (or OrbStack / Docker Desktop) is running"
    )]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed ({}): {command}\n{stderr}", exit_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error(
        "Timed out waiting for {target} ({attempts} attempts)\n\nHint:\n  • Check the container logs: docker logs <container>\n  • Raise max_attempts in the readiness settings"
    )]
    ReadinessTimeout { target: String, attempts: u32 },

    #[error(
        "Port {port} is already in use\n\nHint:\n  • Stop the process holding the port\n  • Leftovers from an earlier run can be removed with: salesdash down"
    )]
    PortAlreadyInUse { port: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl ContainerError {
    /// Stderr of a failed command, empty for every other variant
    pub fn stderr(&self) -> &str {
        match self {
            ContainerError::CommandFailed { stderr, .. } => stderr,
            _ => "",
        }
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;

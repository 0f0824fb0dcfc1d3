use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// 顶层错误：每一种都会终止整个程序
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Installation failed: {0}")]
    Install(#[from] InstallError),

    #[error("Build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Runtime error: {0}")]
    Run(#[from] RunError),

    #[error("Prompt failed: {0}")]
    Prompt(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {error}")]
    ParseError { error: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid type for {field}, expected {expected}")]
    InvalidType { field: String, expected: &'static str },

    #[error("Pool #{index} missing '{field}'")]
    PoolMissingField { index: usize, field: &'static str },
}

/// 外部命令执行失败（包管理器、git、cmake、make）
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` returned non-zero exit status {status}")]
    Failed { command: String, status: ExitStatus },
}

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("{provider} provider: {source}")]
    Command {
        provider: &'static str,
        #[source]
        source: ExecError,
    },
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("clone failed: {0}")]
    Clone(#[source] ExecError),

    #[error("configure step failed: {0}")]
    Configure(#[source] ExecError),

    #[error("compile step failed: {0}")]
    Compile(#[source] ExecError),

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("binary not found after build: {path}")]
    BinaryMissing { path: PathBuf },
}

impl BuildError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output pipe: {0}")]
    Pipe(#[source] std::io::Error),

    #[error("failed to read miner output: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write miner output: {0}")]
    Output(#[source] std::io::Error),

    #[error("failed to wait for miner process: {0}")]
    Wait(#[source] std::io::Error),
}

pub type Result<T, E = ManagerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::MissingField {
            field: "pools".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required field: pools");

        let err = ConfigError::InvalidType {
            field: "cpu".to_string(),
            expected: "object",
        };
        assert_eq!(err.to_string(), "Invalid type for cpu, expected object");

        let err = ConfigError::PoolMissingField { index: 2, field: "user" };
        assert_eq!(err.to_string(), "Pool #2 missing 'user'");
    }

    #[test]
    fn test_manager_error_wraps_source() {
        let err: ManagerError = ConfigError::MissingField {
            field: "cpu".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Config error: Missing required field: cpu");
    }
}

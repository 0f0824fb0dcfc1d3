//! 外部命令执行：包管理器、git、cmake、make 都经过这里，且只尝试一次

use crate::error::ExecError;
use std::fmt;
use std::process::{Command, Stdio};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// 一条待执行的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// 命令执行接口，测试中用 mock 替换
#[cfg_attr(test, automock)]
pub trait CommandRunner {
    /// 在当前工作目录执行命令，非零退出码视为失败
    fn run(&self, command: &CommandSpec) -> Result<(), ExecError>;
}

/// 直接调用系统命令
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    /// 是否继承终端输出；默认丢弃
    show_output: bool,
}

impl SystemRunner {
    pub fn new(show_output: bool) -> Self {
        Self { show_output }
    }

    fn output_stdio(&self) -> Stdio {
        if self.show_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<(), ExecError> {
        debug!("Running `{}`", command);

        let status = Command::new(&command.program)
            .args(&command.args)
            .stdout(self.output_stdio())
            .stderr(self.output_stdio())
            .status()
            .map_err(|source| ExecError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(ExecError::Failed {
                command: command.to_string(),
                status,
            });
        }

        debug!("`{}` finished with {}", command, status);
        Ok(())
    }
}

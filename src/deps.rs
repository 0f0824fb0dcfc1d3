//! 构建依赖安装
//!
//! 平台只探测一次：`PATH` 中包含 Termux 路径片段时使用 `pkg`，
//! 否则使用 `apt-get`。安装失败直接返回错误，不做重试。

use crate::config::Settings;
use crate::error::InstallError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::status_success;
use tracing::info;

/// 目标平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    StandardLinux,
    /// Termux 等受限的移动端 Linux 环境
    ConstrainedMobile,
}

impl Platform {
    /// 根据 `PATH` 判断平台
    pub fn detect(path_env: Option<&str>, mobile_marker: &str) -> Self {
        match path_env {
            Some(path) if !mobile_marker.is_empty() && path.contains(mobile_marker) => {
                Platform::ConstrainedMobile
            }
            _ => Platform::StandardLinux,
        }
    }

    pub fn from_env(mobile_marker: &str) -> Self {
        let path = std::env::var("PATH").ok();
        Self::detect(path.as_deref(), mobile_marker)
    }
}

/// 安装构建依赖的能力接口
pub trait DependencyProvider {
    fn name(&self) -> &'static str;

    /// 按顺序执行的命令
    fn commands(&self) -> Vec<CommandSpec>;

    fn install(&self, runner: &dyn CommandRunner) -> Result<(), InstallError> {
        info!("Installing {} dependencies...", self.name());

        for command in self.commands() {
            runner.run(&command).map_err(|source| InstallError::Command {
                provider: self.name(),
                source,
            })?;
        }

        status_success!("Dependencies installed successfully");
        Ok(())
    }
}

/// Debian/Ubuntu 系，经 `sudo apt-get` 安装
#[derive(Debug, Clone)]
pub struct StandardLinuxProvider {
    packages: Vec<String>,
}

impl StandardLinuxProvider {
    pub fn new(packages: Vec<String>) -> Self {
        Self { packages }
    }
}

impl DependencyProvider for StandardLinuxProvider {
    fn name(&self) -> &'static str {
        "Linux"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let mut install = vec!["apt-get".to_string(), "install".to_string(), "-y".to_string()];
        install.extend(self.packages.iter().cloned());

        vec![
            CommandSpec::new("sudo", ["apt-get", "update", "-y"]),
            CommandSpec::new("sudo", install),
        ]
    }
}

/// Termux，经 `pkg` 安装，无需 sudo
#[derive(Debug, Clone)]
pub struct ConstrainedMobileProvider {
    packages: Vec<String>,
}

impl ConstrainedMobileProvider {
    pub fn new(packages: Vec<String>) -> Self {
        Self { packages }
    }
}

impl DependencyProvider for ConstrainedMobileProvider {
    fn name(&self) -> &'static str {
        "Termux"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let mut install = vec!["install".to_string(), "-y".to_string()];
        install.extend(self.packages.iter().cloned());
        vec![CommandSpec::new("pkg", install)]
    }
}

/// 为平台创建对应的依赖安装器
pub fn provider_for(platform: Platform, settings: &Settings) -> Box<dyn DependencyProvider> {
    match platform {
        Platform::StandardLinux => {
            Box::new(StandardLinuxProvider::new(settings.packages.standard.clone()))
        }
        Platform::ConstrainedMobile => {
            Box::new(ConstrainedMobileProvider::new(settings.packages.mobile.clone()))
        }
    }
}

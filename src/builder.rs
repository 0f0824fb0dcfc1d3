//! 从源码构建 XMRig
//!
//! 流程：检出（目录不存在时 `git clone`）→ 创建构建目录 → `cmake ..` →
//! `make -jN` → 确认可执行文件存在。每一步失败都直接返回，不重试。

use crate::config::Settings;
use crate::error::BuildError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::status_success;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 作用域内切换工作目录，离开作用域（包括出错返回）时恢复
#[must_use = "the previous directory is restored when the guard is dropped"]
pub struct ScopedDir {
    previous: PathBuf,
}

impl ScopedDir {
    pub fn enter(dir: &Path) -> Result<Self, BuildError> {
        let previous = std::env::current_dir()
            .map_err(|e| BuildError::io("read current directory", ".", e))?;

        std::env::set_current_dir(dir).map_err(|e| BuildError::io("enter", dir, e))?;
        debug!("Entered {}", dir.display());

        Ok(Self { previous })
    }

    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            warn!("Failed to restore working directory {}: {}", self.previous.display(), e);
        }
    }
}

/// XMRig 构建器
pub struct Builder<'a> {
    settings: &'a Settings,
    runner: &'a dyn CommandRunner,
}

impl<'a> Builder<'a> {
    pub fn new(settings: &'a Settings, runner: &'a dyn CommandRunner) -> Self {
        Self { settings, runner }
    }

    /// 构建完成后返回可执行文件路径
    pub fn build(&self) -> Result<PathBuf, BuildError> {
        self.ensure_source()?;
        self.ensure_build_dir()?;
        self.compile()?;

        let binary = self.settings.binary_path();
        if !binary.is_file() {
            return Err(BuildError::BinaryMissing { path: binary });
        }

        status_success!("XMRig built successfully");
        Ok(binary)
    }

    fn ensure_source(&self) -> Result<(), BuildError> {
        let source_dir = &self.settings.source_dir;
        if source_dir.exists() {
            debug!("Using existing checkout at {}", source_dir.display());
            return Ok(());
        }

        info!("Cloning XMRig repository...");
        let clone = CommandSpec::new(
            "git",
            [
                "clone".to_string(),
                self.settings.repo_url.clone(),
                source_dir.display().to_string(),
            ],
        );
        self.runner.run(&clone).map_err(BuildError::Clone)
    }

    /// 已存在时不做任何事
    fn ensure_build_dir(&self) -> Result<(), BuildError> {
        let build_path = self.settings.build_path();
        std::fs::create_dir_all(&build_path).map_err(|e| BuildError::io("create", &build_path, e))
    }

    fn compile(&self) -> Result<(), BuildError> {
        let _source = ScopedDir::enter(&self.settings.source_dir)?;
        let _build = ScopedDir::enter(&self.settings.build_dir)?;

        info!("Building XMRig (this may take several minutes)...");
        self.runner
            .run(&CommandSpec::new("cmake", [".."]))
            .map_err(BuildError::Configure)?;

        let jobs = format!("-j{}", self.settings.jobs());
        self.runner
            .run(&CommandSpec::new("make", [jobs]))
            .map_err(BuildError::Compile)
    }
}

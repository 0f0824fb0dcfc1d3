use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 环境变量前缀，例如 `XMRIG_MANAGER_REPO_URL`
pub const ENV_PREFIX: &str = "XMRIG_MANAGER";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// XMRig configuration file (JSON), passed to the miner with `-c`
    pub config: PathBuf,

    /// Install build dependencies even if the miner binary already exists
    #[arg(long)]
    pub install_deps: bool,

    /// Manager settings file
    #[arg(long, default_value = "xmrig-manager.toml")]
    pub settings: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write JSON logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// 管理器自身的设置（与矿工的 JSON 配置无关）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub repo_url: String,
    /// 源码检出目录
    pub source_dir: PathBuf,
    /// 检出目录下的构建子目录
    pub build_dir: PathBuf,
    pub binary_name: String,
    /// `make -j` 并行数，未设置时使用 CPU 核心数
    pub build_jobs: Option<usize>,
    /// PATH 中出现该片段即视为 Termux 环境
    pub mobile_path_marker: String,
    /// 是否显示包管理器和编译工具的输出
    pub show_tool_output: bool,
    pub packages: PackageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    pub standard: Vec<String>,
    pub mobile: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo_url: "https://github.com/xmrig/xmrig.git".to_string(),
            source_dir: PathBuf::from("xmrig"),
            build_dir: PathBuf::from("build"),
            binary_name: "xmrig".to_string(),
            build_jobs: None,
            mobile_path_marker: "/com.termux/".to_string(),
            show_tool_output: false,
            packages: PackageConfig::default(),
        }
    }
}

impl Default for PackageConfig {
    fn default() -> Self {
        let to_vec = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            standard: to_vec(&[
                "git",
                "build-essential",
                "cmake",
                "libuv1-dev",
                "libssl-dev",
                "libhwloc-dev",
            ]),
            mobile: to_vec(&["git", "cmake", "make", "libuv-static", "binutils"]),
        }
    }
}

impl Settings {
    /// 按 默认值 -> 设置文件(可选) -> 环境变量 的顺序加载
    pub fn load(path: &Path) -> Result<Self> {
        let defaults = config::Config::try_from(&Settings::default())
            .context("Failed to serialize default settings")?;

        let layered = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("Failed to load settings: {}", path.display()))?;

        let settings: Settings = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;

        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.repo_url.trim().is_empty() {
            anyhow::bail!("repo_url must not be empty");
        }

        if self.source_dir.as_os_str().is_empty() {
            anyhow::bail!("source_dir must not be empty");
        }

        if self.build_dir.as_os_str().is_empty() {
            anyhow::bail!("build_dir must not be empty");
        }

        if self.binary_name.trim().is_empty() {
            anyhow::bail!("binary_name must not be empty");
        }

        if self.build_jobs == Some(0) {
            anyhow::bail!("build_jobs must be greater than 0");
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// 构建产物所在目录，例如 `xmrig/build`
    pub fn build_path(&self) -> PathBuf {
        self.source_dir.join(&self.build_dir)
    }

    /// 矿工可执行文件路径，例如 `xmrig/build/xmrig`
    pub fn binary_path(&self) -> PathBuf {
        self.build_path().join(&self.binary_name)
    }

    pub fn jobs(&self) -> usize {
        self.build_jobs.unwrap_or_else(num_cpus::get)
    }
}

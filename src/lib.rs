//! XMRig Manager - XMRig 构建与运行管理工具
//!
//! 在 Linux 和 Termux 上完成 XMRig 的整个生命周期：
//! - 校验矿工 JSON 配置（`pools` 与 `cpu` 字段）
//! - 通过系统包管理器安装构建依赖
//! - 克隆源码并用 cmake/make 编译
//! - 启动矿工，过滤并着色它的输出
//!
//! ## 架构特点
//!
//! - 单线程、同步、阻塞，各阶段依次执行
//! - 外部命令统一经过 [`exec::CommandRunner`]，只尝试一次
//! - 运行阶段通过 [`miner::CancelToken`] 响应 Ctrl-C

pub mod builder;
pub mod config;
pub mod deps;
pub mod display;
pub mod error;
pub mod exec;
pub mod filter;
pub mod logging;
pub mod manager;
pub mod miner;
pub mod validation;

pub use config::{Args, Settings};
pub use error::ManagerError;
pub use manager::{MinerManager, SessionOutcome, SessionRequest};

/// 程序版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 程序名称
pub const NAME: &str = "xmrig-manager";

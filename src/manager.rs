//! 流程编排：校验 → 安装依赖 → 构建 → 运行
//!
//! 各阶段严格按顺序执行，任何一步失败都会终止整个会话。

use crate::builder::Builder;
use crate::config::Settings;
use crate::deps::DependencyProvider;
use crate::display::{Palette, Tag};
use crate::error::{ManagerError, Result, RunError};
use crate::exec::CommandRunner;
use crate::miner::{self, CancelToken, RunOutcome};
use crate::status_success;
use crate::validation::ConfigValidator;
use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tracing::{debug, info, warn};

/// 工作流阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    InstallDependencies,
    /// 询问是否构建，拒绝时会话结束
    Confirm,
    Build,
    Run,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::InstallDependencies => "install-dependencies",
            Stage::Confirm => "confirm",
            Stage::Build => "build",
            Stage::Run => "run",
        };
        f.write_str(name)
    }
}

/// 根据启动条件计算阶段序列
///
/// `--install-deps` 的安装排在询问之前；依赖安装在一次会话中最多执行一次。
pub fn plan_stages(force_install: bool, binary_present: bool) -> Vec<Stage> {
    let mut stages = vec![Stage::Validate];

    if force_install {
        stages.push(Stage::InstallDependencies);
    }

    if !binary_present {
        stages.push(Stage::Confirm);
        if !force_install {
            stages.push(Stage::InstallDependencies);
        }
        stages.push(Stage::Build);
    }

    stages.push(Stage::Run);
    stages
}

/// 会话结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 矿工输出结束并退出
    MinerExited(ExitStatus),
    /// 用户按 Ctrl-C 停止
    StoppedByUser,
    /// 用户拒绝构建
    Declined,
}

/// 一次会话的输入
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub config_path: PathBuf,
    pub force_install: bool,
}

/// 询问是否安装依赖并构建。空输入、`y`、`yes` 视为同意，输入结束视为拒绝。
pub fn confirm_build(input: &mut dyn BufRead, output: &mut dyn Write) -> std::io::Result<bool> {
    write!(output, "Install dependencies and build XMRig? [Y/n]: ")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }

    let answer = answer.trim().to_lowercase();
    Ok(matches!(answer.as_str(), "" | "y" | "yes"))
}

/// 矿工管理器
pub struct MinerManager<'a> {
    settings: Settings,
    runner: &'a dyn CommandRunner,
    provider: Box<dyn DependencyProvider>,
    palette: Palette,
}

impl<'a> MinerManager<'a> {
    pub fn new(
        settings: Settings,
        runner: &'a dyn CommandRunner,
        provider: Box<dyn DependencyProvider>,
        palette: Palette,
    ) -> Self {
        Self {
            settings,
            runner,
            provider,
            palette,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn enter(&self, stage: Stage) {
        debug!("Entering stage: {}", stage);
    }

    /// 执行完整会话
    ///
    /// `input`/`output` 用于交互提问和矿工输出，生产环境中是 stdin/stdout。
    pub fn run_session(
        &self,
        request: &SessionRequest,
        token: &CancelToken,
        input: &mut dyn BufRead,
        output: &mut dyn Write,
    ) -> Result<SessionOutcome> {
        let binary = self.settings.binary_path();
        let stages = plan_stages(request.force_install, binary.is_file());
        debug!("Planned stages: {:?}", stages);

        for stage in stages {
            self.enter(stage);
            match stage {
                Stage::Validate => self.validate(&request.config_path)?,
                Stage::InstallDependencies => self.provider.install(self.runner)?,
                Stage::Confirm => {
                    warn!("XMRig not detected");
                    if !confirm_build(input, output).map_err(ManagerError::Prompt)? {
                        warn!("Aborted by user");
                        return Ok(SessionOutcome::Declined);
                    }
                }
                Stage::Build => {
                    Builder::new(&self.settings, self.runner).build()?;
                }
                Stage::Run => {
                    return self.run_miner(&binary, &request.config_path, token, output);
                }
            }
        }

        Ok(SessionOutcome::Declined)
    }

    fn validate(&self, config_path: &Path) -> Result<()> {
        ConfigValidator::validate_file(config_path)?;
        status_success!("Config file validation passed");
        Ok(())
    }

    fn run_miner(
        &self,
        binary: &Path,
        config_path: &Path,
        token: &CancelToken,
        output: &mut dyn Write,
    ) -> Result<SessionOutcome> {
        info!("Starting mining process...");
        let banner = self.palette.render(Tag::Highlight, "=== Mining Session Started ===");
        writeln!(output, "{}", banner).map_err(RunError::Output)?;

        token.arm();
        let outcome = miner::run_miner(binary, config_path, token, &self.palette, output)?;

        match outcome {
            RunOutcome::StoppedByUser => {
                warn!("Mining stopped by user");
                Ok(SessionOutcome::StoppedByUser)
            }
            RunOutcome::Exited(status) => {
                if status.success() {
                    info!("Miner exited");
                } else {
                    warn!("Miner exited with {}", status);
                }
                Ok(SessionOutcome::MinerExited(status))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::{Platform, provider_for};
    use crate::error::ConfigError;
    use crate::exec::MockCommandRunner;
    use std::io::Cursor;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn settings_in(dir: &Path) -> Settings {
        Settings {
            source_dir: dir.join("xmrig"),
            ..Settings::default()
        }
    }

    #[test]
    fn test_plan_binary_present() {
        assert_eq!(plan_stages(false, true), vec![Stage::Validate, Stage::Run]);
        assert_eq!(
            plan_stages(true, true),
            vec![Stage::Validate, Stage::InstallDependencies, Stage::Run]
        );
    }

    #[test]
    fn test_plan_binary_missing() {
        assert_eq!(
            plan_stages(false, false),
            vec![Stage::Validate, Stage::Confirm, Stage::InstallDependencies, Stage::Build, Stage::Run]
        );
        // --install-deps 先安装再询问，且不会重复安装
        assert_eq!(
            plan_stages(true, false),
            vec![Stage::Validate, Stage::InstallDependencies, Stage::Confirm, Stage::Build, Stage::Run]
        );
    }

    #[test]
    fn test_plan_always_validates_first_and_runs_last() {
        for force in [false, true] {
            for present in [false, true] {
                let stages = plan_stages(force, present);
                assert_eq!(stages.first(), Some(&Stage::Validate));
                assert_eq!(stages.last(), Some(&Stage::Run));
                let installs = stages.iter().filter(|s| **s == Stage::InstallDependencies).count();
                assert!(installs <= 1);
            }
        }
    }

    #[test]
    fn test_confirm_build_answers() {
        let cases = [
            ("\n", true),
            ("y\n", true),
            ("Y\n", true),
            ("yes\n", true),
            ("  YES  \n", true),
            ("n\n", false),
            ("no\n", false),
            ("maybe\n", false),
            ("", false),
        ];

        for (answer, expected) in cases {
            let mut input = Cursor::new(answer.as_bytes().to_vec());
            let mut output = Vec::new();
            assert_eq!(confirm_build(&mut input, &mut output).unwrap(), expected, "answer {answer:?}");
            assert!(String::from_utf8(output).unwrap().starts_with("Install dependencies and build XMRig? [Y/n]: "));
        }
    }

    #[test]
    fn test_invalid_config_stops_before_install() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(dir.path(), r#"{"cpu":{}}"#);
        let settings = settings_in(dir.path());

        // 没有任何外部命令被调用
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let provider = provider_for(Platform::StandardLinux, &settings);
        let manager = MinerManager::new(settings, &runner, provider, Palette::plain());
        let request = SessionRequest {
            config_path,
            force_install: true,
        };

        let err = manager
            .run_session(&request, &CancelToken::new(), &mut Cursor::new(Vec::new()), &mut Vec::new())
            .unwrap_err();
        match err {
            ManagerError::Config(ConfigError::MissingField { field }) => assert_eq!(field, "pools"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let provider = provider_for(Platform::StandardLinux, &settings);
        let manager = MinerManager::new(settings, &runner, provider, Palette::plain());
        let request = SessionRequest {
            config_path: dir.path().join("missing.json"),
            force_install: false,
        };

        let err = manager
            .run_session(&request, &CancelToken::new(), &mut Cursor::new(Vec::new()), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, ManagerError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_declined_build_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(dir.path(), r#"{"pools":[],"cpu":{}}"#);
        let settings = settings_in(dir.path());

        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let provider = provider_for(Platform::ConstrainedMobile, &settings);
        let manager = MinerManager::new(settings, &runner, provider, Palette::plain());
        let request = SessionRequest {
            config_path,
            force_install: false,
        };

        let mut output = Vec::new();
        let outcome = manager
            .run_session(&request, &CancelToken::new(), &mut Cursor::new(b"n\n".to_vec()), &mut output)
            .unwrap();

        assert_eq!(outcome, SessionOutcome::Declined);
        assert!(String::from_utf8(output).unwrap().contains("[Y/n]"));
    }

    #[test]
    fn test_forced_install_runs_before_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(dir.path(), r#"{"pools":[],"cpu":{}}"#);
        let settings = settings_in(dir.path());

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|c| c.program == "pkg")
            .times(1)
            .returning(|_| Ok(()));

        let provider = provider_for(Platform::ConstrainedMobile, &settings);
        let manager = MinerManager::new(settings, &runner, provider, Palette::plain());
        let request = SessionRequest {
            config_path,
            force_install: true,
        };

        let outcome = manager
            .run_session(&request, &CancelToken::new(), &mut Cursor::new(b"no\n".to_vec()), &mut Vec::new())
            .unwrap();
        assert_eq!(outcome, SessionOutcome::Declined);
    }

    #[test]
    fn test_install_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(
            dir.path(),
            r#"{"pools":[{"url":"pool.example:3333","user":"wallet1"}],"cpu":{}}"#,
        );
        let settings = settings_in(dir.path());

        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|c| {
            Err(crate::error::ExecError::Spawn {
                command: c.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "pkg not found"),
            })
        });

        let provider = provider_for(Platform::ConstrainedMobile, &settings);
        let manager = MinerManager::new(settings, &runner, provider, Palette::plain());
        let request = SessionRequest {
            config_path,
            force_install: false,
        };

        // 空输入即同意构建
        let err = manager
            .run_session(&request, &CancelToken::new(), &mut Cursor::new(b"\n".to_vec()), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, ManagerError::Install(_)));
        assert!(!dir.path().join("xmrig").exists());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::InstallDependencies.to_string(), "install-dependencies");
        assert_eq!(Stage::Run.to_string(), "run");
    }
}

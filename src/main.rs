use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{debug, error, info};

use xmrig_manager::config::{Args, Settings};
use xmrig_manager::deps::{self, Platform};
use xmrig_manager::display::{Palette, Tag};
use xmrig_manager::exec::SystemRunner;
use xmrig_manager::logging::{self, LogConfig};
use xmrig_manager::miner::CancelToken;
use xmrig_manager::{MinerManager, SessionOutcome, SessionRequest};

/// 运行阶段之外按下 Ctrl-C 时的退出码
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn main() -> ExitCode {
    // 解析命令行参数
    let args = Args::parse();

    let colored = !args.no_color && std::io::stdout().is_terminal();
    let palette = Palette::new(colored);

    // 初始化日志系统
    let _log_guard = match logging::init_logging(LogConfig {
        level: args.log_level.clone(),
        file_path: args.log_file.clone(),
        colored,
    }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", palette.status(Tag::Error, &format!("Failed to initialize logging: {:#}", e)));
            return ExitCode::FAILURE;
        }
    };

    println!("{}", palette.banner());

    match run(args, palette) {
        Ok(outcome) => {
            debug!("Session finished: {:?}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, palette: Palette) -> Result<SessionOutcome> {
    let settings = Settings::load(&args.settings)?;
    info!("🚀 XMRig Manager v{}", xmrig_manager::VERSION);

    let token = CancelToken::new();
    install_interrupt_handler(token.clone())?;

    let platform = Platform::from_env(&settings.mobile_path_marker);
    debug!("Detected platform: {:?}", platform);

    let provider = deps::provider_for(platform, &settings);
    let runner = SystemRunner::new(settings.show_tool_output);
    let manager = MinerManager::new(settings, &runner, provider, palette);

    let request = SessionRequest {
        config_path: args.config,
        force_install: args.install_deps,
    };

    let outcome = manager.run_session(
        &request,
        &token,
        &mut std::io::stdin().lock(),
        &mut std::io::stdout(),
    )?;

    Ok(outcome)
}

/// Ctrl-C：运行阶段内取消令牌并终止矿工，其余阶段直接退出
fn install_interrupt_handler(token: CancelToken) -> Result<()> {
    ctrlc::set_handler(move || {
        if !token.cancel() {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    })
    .context("Failed to set Ctrl-C handler")
}

/// 拼接错误链，跳过已经包含在上层消息里的原因
fn describe(err: &anyhow::Error) -> String {
    let mut message = err.to_string();
    for cause in err.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    message
}

//! 矿工进程管理
//!
//! 以 `<binary> -c <config>` 启动 XMRig，stdout 与 stderr 合并到同一个管道，
//! 逐行读取、过滤、着色后写出。读行之间检查 [`CancelToken`]。

mod cancel;

pub use cancel::CancelToken;

use crate::display::Palette;
use crate::error::RunError;
use crate::filter;
use std::io::{BufRead, BufReader, PipeReader, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus};
use tracing::{debug, info};

/// 运行阶段结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 输出结束后矿工自行退出
    Exited(ExitStatus),
    /// 用户按下 Ctrl-C
    StoppedByUser,
}

/// 已启动的矿工进程
pub struct MinerProcess {
    child: Child,
    output: BufReader<PipeReader>,
    token: CancelToken,
}

impl MinerProcess {
    pub fn spawn(binary: &Path, config: &Path, token: CancelToken) -> Result<Self, RunError> {
        let (reader, writer) = std::io::pipe().map_err(RunError::Pipe)?;
        let stderr_writer = writer.try_clone().map_err(RunError::Pipe)?;

        // Command 在语句结束时释放写端，子进程退出后读端才能读到 EOF
        let child = Command::new(binary)
            .arg("-c")
            .arg(config)
            .stdout(writer)
            .stderr(stderr_writer)
            .spawn()
            .map_err(|source| RunError::Spawn {
                binary: binary.to_path_buf(),
                source,
            })?;

        token.attach(child.id());
        debug!("Spawned {} (pid {})", binary.display(), child.id());

        Ok(Self {
            child,
            output: BufReader::new(reader),
            token,
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// 合并后的输出行，惰性读取，不可重放
    pub fn lines(&mut self) -> OutputLines<'_, &mut BufReader<PipeReader>> {
        OutputLines::new(&mut self.output, &self.token)
    }

    /// 发送 SIGTERM；进程已退出时什么也不做
    pub fn terminate(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            if !cancel::send_terminate(self.child.id()) {
                let _ = self.child.kill();
            }
        }
    }

    /// 等待进程完全退出
    pub fn wait(&mut self) -> Result<ExitStatus, RunError> {
        self.token.detach();
        self.child.wait().map_err(RunError::Wait)
    }
}

impl Drop for MinerProcess {
    fn drop(&mut self) {
        // 出错返回时不留下孤儿进程
        if let Ok(None) = self.child.try_wait() {
            self.token.detach();
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// 可取消的阻塞行迭代器
pub struct OutputLines<'t, R> {
    reader: R,
    token: &'t CancelToken,
    buf: Vec<u8>,
    finished: bool,
}

impl<'t, R: BufRead> OutputLines<'t, R> {
    pub fn new(reader: R, token: &'t CancelToken) -> Self {
        Self {
            reader,
            token,
            buf: Vec::new(),
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for OutputLines<'_, R> {
    type Item = Result<String, RunError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.token.is_cancelled() {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.finished = true;
                None
            }
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(RunError::Read(e)))
            }
        }
    }
}

/// 运行矿工直到输出结束或被取消，过滤后的行写入 `out`
pub fn run_miner(
    binary: &Path,
    config: &Path,
    token: &CancelToken,
    palette: &Palette,
    out: &mut dyn Write,
) -> Result<RunOutcome, RunError> {
    let mut process = MinerProcess::spawn(binary, config, token.clone())?;
    info!("Miner started (pid {})", process.id());

    for line in process.lines() {
        let line = line?;
        if let Some(rendered) = filter::render(&line, palette) {
            writeln!(out, "{}", rendered).map_err(RunError::Output)?;
            out.flush().map_err(RunError::Output)?;
        }
    }

    if token.is_cancelled() {
        process.terminate();
        let status = process.wait()?;
        debug!("Miner terminated with {}", status);
        return Ok(RunOutcome::StoppedByUser);
    }

    let status = process.wait()?;
    Ok(RunOutcome::Exited(status))
}

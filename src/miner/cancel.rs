use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 运行阶段的取消令牌
///
/// Ctrl-C 处理线程调用 [`CancelToken::cancel`]，读取输出的主线程在每次读行之间
/// 检查 [`CancelToken::is_cancelled`]。挂接了子进程时，取消会立即向它发送
/// SIGTERM，这样阻塞中的读操作也能因为管道关闭而返回。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    /// 进入运行阶段后为 true
    armed: AtomicBool,
    /// 0 表示没有挂接子进程
    child_pid: AtomicU32,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记为已取消。返回令牌是否处于运行阶段（由调用方决定未处于运行阶段时怎么办）
    pub fn cancel(&self) -> bool {
        self.inner.cancelled.store(true, Ordering::SeqCst);

        let pid = self.inner.child_pid.load(Ordering::SeqCst);
        if pid != 0 {
            debug!("Cancel requested, terminating child {}", pid);
            send_terminate(pid);
        }

        self.inner.armed.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// 进入运行阶段
    pub fn arm(&self) {
        self.inner.armed.store(true, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::SeqCst)
    }

    pub(crate) fn attach(&self, pid: u32) {
        self.inner.child_pid.store(pid, Ordering::SeqCst);
    }

    /// 子进程回收前必须解除挂接，避免向复用的 pid 发信号
    pub(crate) fn detach(&self) {
        self.inner.child_pid.store(0, Ordering::SeqCst);
    }
}

/// 请求子进程优雅退出
#[cfg(unix)]
pub(crate) fn send_terminate(pid: u32) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    kill(Pid::from_raw(raw), Signal::SIGTERM).is_ok()
}

#[cfg(not(unix))]
pub(crate) fn send_terminate(_pid: u32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let handler_side = token.clone();

        assert!(!token.is_cancelled());
        assert!(!handler_side.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_reports_armed_state() {
        let token = CancelToken::new();
        token.arm();
        assert!(token.is_armed());
        assert!(token.clone().cancel());
    }

    #[test]
    fn test_detach_clears_child() {
        let token = CancelToken::new();
        token.attach(u32::MAX);
        token.detach();
        // 没有挂接的子进程，不会发出信号
        token.cancel();
        assert!(token.is_cancelled());
    }
}

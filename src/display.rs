//! 终端显示：语义标签到渲染函数的映射
//!
//! 启动时构建一次 [`Palette`]，之后只读，所有输出（矿工日志、状态行、
//! 横幅）都通过它着色。

use std::fmt;

const RESET: &str = "\x1b[0m";

/// 语义标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Success,
    Error,
    Warning,
    Metric,
    Info,
    Banner,
    Highlight,
}

impl Tag {
    const COUNT: usize = 7;

    fn index(self) -> usize {
        self as usize
    }

    /// 状态行前缀符号
    pub fn symbol(self) -> &'static str {
        match self {
            Tag::Success => "[✓]",
            Tag::Error => "[✗]",
            Tag::Warning => "[!]",
            Tag::Info | Tag::Metric => "[i]",
            Tag::Banner | Tag::Highlight => "[*]",
        }
    }
}

/// 渲染函数
pub type Renderer = fn(&str) -> String;

fn plain(text: &str) -> String {
    text.to_string()
}

fn green(text: &str) -> String {
    format!("\x1b[92m{}{}", text, RESET)
}

fn red(text: &str) -> String {
    format!("\x1b[91m{}{}", text, RESET)
}

fn yellow(text: &str) -> String {
    format!("\x1b[93m{}{}", text, RESET)
}

fn blue(text: &str) -> String {
    format!("\x1b[94m{}{}", text, RESET)
}

fn cyan(text: &str) -> String {
    format!("\x1b[96m{}{}", text, RESET)
}

fn bold(text: &str) -> String {
    format!("\x1b[1m{}{}", text, RESET)
}

/// 不可变的着色表
#[derive(Clone, Copy)]
pub struct Palette {
    renderers: [Renderer; Tag::COUNT],
    colored: bool,
}

impl Palette {
    /// ANSI 彩色输出
    pub fn ansi() -> Self {
        let mut renderers: [Renderer; Tag::COUNT] = [plain as Renderer; Tag::COUNT];
        renderers[Tag::Success.index()] = green;
        renderers[Tag::Error.index()] = red;
        renderers[Tag::Warning.index()] = yellow;
        renderers[Tag::Metric.index()] = blue;
        renderers[Tag::Info.index()] = plain;
        renderers[Tag::Banner.index()] = green;
        renderers[Tag::Highlight.index()] = cyan;
        Self {
            renderers,
            colored: true,
        }
    }

    /// 无颜色输出（重定向或 `--no-color`）
    pub fn plain() -> Self {
        Self {
            renderers: [plain as Renderer; Tag::COUNT],
            colored: false,
        }
    }

    pub fn new(colored: bool) -> Self {
        if colored {
            Self::ansi()
        } else {
            Self::plain()
        }
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    pub fn render(&self, tag: Tag, text: &str) -> String {
        (self.renderers[tag.index()])(text)
    }

    /// 着色后的状态符号，`[i]` 使用蓝色
    pub fn symbol(&self, tag: Tag) -> String {
        let symbol_tag = if tag == Tag::Info { Tag::Metric } else { tag };
        self.render(symbol_tag, tag.symbol())
    }

    /// 带符号的状态行，例如 `[✓] XMRig built successfully`
    pub fn status(&self, tag: Tag, message: &str) -> String {
        format!("{} {}", self.symbol(tag), message)
    }

    /// 启动横幅
    pub fn banner(&self) -> String {
        let mut out = String::new();
        out.push('\n');
        out.push_str(&self.render(Tag::Banner, BANNER_ART));
        out.push_str("\n        ");
        let title = format!("XMRig Manager v{} - Linux/Termux", crate::VERSION);
        out.push_str(&if self.colored { bold(&title) } else { title });
        out.push('\n');
        out
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::ansi()
    }
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Palette").field("colored", &self.colored).finish()
    }
}

const BANNER_ART: &str = r"██╗  ██╗███╗   ███╗██████╗ ██╗ ██████╗
╚██╗██╔╝████╗ ████║██╔══██╗██║██╔════╝
 ╚███╔╝ ██╔████╔██║██████╔╝██║██║  ███╗
 ██╔██╗ ██║╚██╔╝██║██╔══██╗██║██║   ██║
██╔╝ ██╗██║ ╚═╝ ██║██║  ██║██║╚██████╔╝
╚═╝  ╚═╝╚═╝     ╚═╝╚═╝  ╚═╝╚═╝ ╚═════╝";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_palette_is_identity() {
        let palette = Palette::plain();
        for tag in [Tag::Success, Tag::Error, Tag::Warning, Tag::Metric, Tag::Info] {
            assert_eq!(palette.render(tag, "speed 10s/60s/15m"), "speed 10s/60s/15m");
        }
        assert!(!palette.is_colored());
    }

    #[test]
    fn test_ansi_palette_colors() {
        let palette = Palette::ansi();
        assert_eq!(palette.render(Tag::Success, "ok"), "\x1b[92mok\x1b[0m");
        assert_eq!(palette.render(Tag::Error, "bad"), "\x1b[91mbad\x1b[0m");
        assert_eq!(palette.render(Tag::Metric, "10 H/s"), "\x1b[94m10 H/s\x1b[0m");
        // 普通信息保持原样
        assert_eq!(palette.render(Tag::Info, "net use pool"), "net use pool");
    }

    #[test]
    fn test_status_line() {
        let palette = Palette::plain();
        assert_eq!(palette.status(Tag::Success, "done"), "[✓] done");
        assert_eq!(palette.status(Tag::Error, "failed"), "[✗] failed");
        assert_eq!(palette.status(Tag::Warning, "careful"), "[!] careful");
        assert_eq!(palette.status(Tag::Info, "note"), "[i] note");
    }

    #[test]
    fn test_banner_contains_version() {
        let banner = Palette::plain().banner();
        assert!(banner.contains(crate::VERSION));
        assert!(!banner.contains('\x1b'));
    }
}

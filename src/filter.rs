//! XMRig 输出行的过滤与分类

use crate::display::{Palette, Tag};

/// 至少包含其中一个关键字的行才会显示
pub const KEYWORDS: [&str; 6] = ["accepted", "cpu", "net", "miner", "speed", "shares"];

/// 输出行分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// 份额被接受
    Accepted,
    Error,
    /// 算力、份额统计
    Performance,
    Generic,
    Suppressed,
}

impl LineKind {
    pub fn tag(self) -> Option<Tag> {
        match self {
            LineKind::Accepted => Some(Tag::Success),
            LineKind::Error => Some(Tag::Error),
            LineKind::Performance => Some(Tag::Metric),
            LineKind::Generic => Some(Tag::Info),
            LineKind::Suppressed => None,
        }
    }
}

/// 分类一行输出，大小写不敏感。`accepted` 优先于 `error`。
pub fn classify(line: &str) -> LineKind {
    let lower = line.to_lowercase();

    if !KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        return LineKind::Suppressed;
    }

    if lower.contains("accepted") {
        LineKind::Accepted
    } else if lower.contains("error") {
        LineKind::Error
    } else if lower.contains("speed") || lower.contains("shares") {
        LineKind::Performance
    } else {
        LineKind::Generic
    }
}

/// 分类并着色，被过滤的行返回 `None`
pub fn render(line: &str, palette: &Palette) -> Option<String> {
    let tag = classify(line).tag()?;
    Some(palette.render(tag, line.trim()))
}

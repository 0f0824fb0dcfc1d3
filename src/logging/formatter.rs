//! 状态行日志格式化器

use crate::display::{Palette, Tag};
use chrono::{DateTime, Local};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// 成功事件的 target，对应 `[✓]`
pub const SUCCESS_TARGET: &str = "xmrig_manager::success";

/// 状态行风格：`[时间] 符号 消息`
pub struct StatusFormatter {
    palette: Palette,
    show_timestamp: bool,
}

impl StatusFormatter {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            show_timestamp: true,
        }
    }

    pub fn without_timestamp(mut self) -> Self {
        self.show_timestamp = false;
        self
    }
}

/// 根据级别和 target 选择状态标签
pub fn status_tag(level: &Level, target: &str) -> Tag {
    match *level {
        Level::ERROR => Tag::Error,
        Level::WARN => Tag::Warning,
        Level::INFO if target == SUCCESS_TARGET => Tag::Success,
        Level::INFO => Tag::Info,
        _ => Tag::Highlight,
    }
}

impl<S, N> FormatEvent<S, N> for StatusFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let tag = status_tag(metadata.level(), metadata.target());

        if self.show_timestamp {
            let now: DateTime<Local> = Local::now();
            write!(writer, "[{}] ", now.format("%H:%M:%S"))?;
        }

        write!(writer, "{} ", self.palette.symbol(tag))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

//! Colored logging with a component prefix

use owo_colors::{OwoColorize, Style};
use std::fmt;
use std::io;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{
    format::{FormatEvent, FormatFields, Writer},
    FmtContext,
};
use tracing_subscriber::registry::LookupSpan;

/// Component identifier for prefixing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Replay,
    Check,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Replay => "REPLAY",
            Component::Check => "CHECK",
        }
    }

    pub fn color_style(&self) -> Style {
        match self {
            Component::Replay => Style::new().cyan().bold(),
            Component::Check => Style::new().yellow().bold(),
        }
    }
}

/// Fixed-width colored level tag
fn styled_level(level: &Level) -> String {
    let style = match *level {
        Level::ERROR => Style::new().red().bold(),
        Level::WARN => Style::new().yellow().bold(),
        Level::INFO => Style::new().green().bold(),
        Level::DEBUG => Style::new().blue().bold(),
        Level::TRACE => Style::new().dimmed().bold(),
    };
    format!("{:5}", level.as_str()).style(style).to_string()
}

pub struct ColoredFormatter {
    pub component: Component,
}

impl<S, N> FormatEvent<S, N> for ColoredFormatter
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
        let now = chrono::Local::now();
        write!(writer, "{} ", now.format("%H:%M:%S").dimmed())?;

        let prefix = format!("[{:6}]", self.component.as_str());
        write!(writer, "{} ", prefix.style(self.component.color_style()))?;

        write!(writer, "{} ", styled_level(event.metadata().level()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Install the colored subscriber on stderr. `RUST_LOG` still applies on
/// top of the default level.
pub fn init_component_logger(component: Component, verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(ColoredFormatter { component })
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

use slog::{o, Drain, FilterLevel, Logger};

use crate::env::ENV_VARS;

pub mod factory;

/// Creates the root logger. Levels default to `info` (`debug` when
/// `show_debug` is set) and can be refined through `BOOKSHELF_LOG`.
pub fn logger(show_debug: bool) -> Logger {
    logger_with_levels(show_debug, ENV_VARS.log_levels())
}

pub fn logger_with_levels(show_debug: bool, levels: Option<&str>) -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::LogBuilder::new(drain)
        .filter(
            None,
            if show_debug {
                FilterLevel::Debug
            } else {
                FilterLevel::Info
            },
        )
        .parse(levels.unwrap_or(""))
        .build();
    let drain = slog_async::Async::new(drain)
        .chan_size(20000)
        .build()
        .fuse();
    Logger::root(drain, o!())
}

use slog::{o, Logger};

/// Factory for creating component loggers.
#[derive(Clone)]
pub struct LoggerFactory {
    parent: Logger,
}

impl LoggerFactory {
    /// Creates a new factory using a parent logger.
    pub fn new(logger: Logger) -> Self {
        Self { parent: logger }
    }

    /// Creates a component-specific logger.
    pub fn component_logger(&self, component: &str) -> Logger {
        self.parent.new(o!("component" => component.to_string()))
    }
}

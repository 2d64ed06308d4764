#[macro_use]
extern crate hiro_system_kit;

#[macro_use]
extern crate serde_derive;

pub mod engine;
pub mod error;
pub mod ingestion;
pub mod ledger;
pub mod numeric;
pub mod parser;
pub mod query;
pub mod service;
pub mod wire;


/// Carries an optional structured logger through every constructor in this crate, the way
/// the rest of the stack threads a logging context instead of reaching for a global logger.
#[derive(Clone, Default)]
pub struct Context {
    pub logger: Option<slog::Logger>,
}

impl Context {
    pub fn empty() -> Self {
        Context { logger: None }
    }

    pub fn try_log<F>(&self, closure: F)
    where
        F: FnOnce(&slog::Logger),
    {
        if let Some(logger) = &self.logger {
            closure(logger)
        }
    }
}

#[macro_export]
macro_rules! try_info {
    ($a:expr, $tag:expr, $($args:tt)*) => {
        $a.try_log(|l| info!(l, $tag, $($args)*));
    };
    ($a:expr, $tag:expr) => {
        $a.try_log(|l| info!(l, $tag));
    };
}

#[macro_export]
macro_rules! try_debug {
    ($a:expr, $tag:expr, $($args:tt)*) => {
        $a.try_log(|l| debug!(l, $tag, $($args)*));
    };
    ($a:expr, $tag:expr) => {
        $a.try_log(|l| debug!(l, $tag));
    };
}

#[macro_export]
macro_rules! try_warn {
    ($a:expr, $tag:expr, $($args:tt)*) => {
        $a.try_log(|l| warn!(l, $tag, $($args)*));
    };
    ($a:expr, $tag:expr) => {
        $a.try_log(|l| warn!(l, $tag));
    };
}

#[macro_export]
macro_rules! try_error {
    ($a:expr, $tag:expr, $($args:tt)*) => {
        $a.try_log(|l| error!(l, $tag, $($args)*));
    };
    ($a:expr, $tag:expr) => {
        $a.try_log(|l| error!(l, $tag));
    };
}

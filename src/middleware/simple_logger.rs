use crate::{
    middleware::{Middleware, ReduceFn},
    Store,
};
use std::{fmt::Debug, rc::Rc};

pub enum LogLevel {
    Trace,
    Debug,
    Warn,
    Info,
}

impl LogLevel {
    pub fn log<S: AsRef<str>>(&self, message: S) {
        match self {
            LogLevel::Trace => log::trace!("{}", message.as_ref()),
            LogLevel::Debug => log::debug!("{}", message.as_ref()),
            LogLevel::Warn => log::warn!("{}", message.as_ref()),
            LogLevel::Info => log::info!("{}", message.as_ref()),
        }
    }

    fn to_level(&self) -> log::Level {
        match self {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

/// Logs the previous state, the action and the next state of every
/// [Store::dispatch()] using the [log] facade.
#[derive(Default)]
pub struct SimpleLoggerMiddleware {
    log_level: LogLevel,
}

impl SimpleLoggerMiddleware {
    pub fn new() -> Self {
        SimpleLoggerMiddleware {
            log_level: LogLevel::default(),
        }
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

impl<State, Action> Middleware<State, Action> for SimpleLoggerMiddleware
where
    State: Debug + 'static,
    Action: Debug + 'static,
{
    fn on_reduce(
        &self,
        store: &Store<State, Action>,
        action: Option<&Action>,
        reduce: &ReduceFn<'_, State, Action>,
    ) -> Option<Rc<State>> {
        // Formatting whole states is not free.
        if !log::log_enabled!(self.log_level.to_level()) {
            return reduce(store, action);
        }

        match action {
            Some(action) => {
                self.log_level.log(format!("prev state: {:?}", store.state()));
                self.log_level.log(format!("action: {:?}", action));
            }
            None => self.log_level.log("action: None"),
        }

        let next_state = reduce(store, action);

        match &next_state {
            Some(next_state) => self.log_level.log(format!("next state: {:?}", next_state)),
            None => self.log_level.log("next state: unchanged"),
        }

        next_state
    }
}

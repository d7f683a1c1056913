use super::manager::{Diagnostics, ErrorContext, ErrorRecord};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// A panic raised while drawing a view, turned into a loggable error.
#[derive(Debug, Error)]
#[error("render failure: {message}")]
pub struct RenderPanic {
    pub message: String,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Last line of defense around view rendering. Once tripped it stays tripped
/// until `reset`, and the caller shows a fallback screen instead of the view.
#[derive(Debug, Default)]
pub struct ErrorBoundary {
    tripped: Option<ErrorRecord>,
}

impl ErrorBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `render`, catching any panic. Returns `None` if it panicked or
    /// the boundary was already tripped.
    pub fn guard<R>(&mut self, diagnostics: &Diagnostics, mut context: ErrorContext, render: impl FnOnce() -> R) -> Option<R> {
        if self.tripped.is_some() {
            return None;
        }
        match panic::catch_unwind(AssertUnwindSafe(render)) {
            Ok(value) => Some(value),
            Err(payload) => {
                context.entry("boundary".to_string()).or_insert_with(|| "ErrorBoundary".to_string());
                let err = RenderPanic { message: panic_message(payload.as_ref()) };
                self.tripped = Some(diagnostics.log_error(&err, context));
                None
            }
        }
    }

    pub fn tripped(&self) -> Option<&ErrorRecord> {
        self.tripped.as_ref()
    }

    pub fn reset(&mut self) {
        self.tripped = None;
    }
}

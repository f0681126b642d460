//! Post-start hooks: work run once after the server's storage is wired.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use tracing::info;

use warden_observability::ErrorSink;

use crate::error::ApiServerError;

/// What a hook gets to work with.
#[derive(Clone)]
pub struct PostStartHookContext {
    sink: Arc<dyn ErrorSink>,
}

impl PostStartHookContext {
    pub fn new(sink: Arc<dyn ErrorSink>) -> Self {
        Self { sink }
    }

    /// Where hooks report failures they recover from.
    pub fn sink(&self) -> &Arc<dyn ErrorSink> {
        &self.sink
    }
}

pub type PostStartHookFn = Box<dyn Fn(&PostStartHookContext) -> anyhow::Result<()> + Send + Sync>;

struct Entry {
    name: String,
    hook: PostStartHookFn,
    once: Once,
}

/// Named hooks, each run at most once per process.
#[derive(Default)]
pub struct PostStartHooks {
    entries: Vec<Entry>,
}

impl PostStartHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, hook: PostStartHookFn) -> Result<(), ApiServerError> {
        let name = name.into();
        if self.entries.iter().any(|e| e.name == name) {
            return Err(ApiServerError::DuplicateHook(name));
        }
        self.entries.push(Entry { name, hook, once: Once::new() });
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Run every hook that has not run yet, in registration order.
    ///
    /// A hook returning an error or panicking is reported to the context's
    /// sink and counts as run; the remaining hooks still run.
    pub fn run_all(&self, ctx: &PostStartHookContext) {
        for entry in &self.entries {
            entry.once.call_once(|| {
                info!(hook = %entry.name, "running post-start hook");
                let err = match panic::catch_unwind(AssertUnwindSafe(|| (entry.hook)(ctx))) {
                    Ok(Ok(())) => return,
                    Ok(Err(err)) => err,
                    Err(payload) => anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref())),
                };
                ctx.sink.handle_error(&err.context(format!("post-start hook \"{}\" failed", entry.name)));
            });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

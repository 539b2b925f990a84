//! Request/response side of the bus: singleton command handlers.
//!
//! Where the EventBus fans one event out to many subscribers, the CommandHub
//! routes one command to exactly one handler and hands the handler's Result
//! back to the caller. Registering a second handler for the same command type
//! replaces the first (logged, not an error).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::warn;

/// A request routed to a single handler.
///
/// `name()` is the stable identifier used in logs and error messages;
/// dispatch itself is keyed by TypeId, so payload shapes stay compile-checked.
pub trait Command: Any + Send + 'static {
    type Output: Send + 'static;

    fn name() -> &'static str;
}

/// Errors surfaced by invoke().
#[derive(Debug)]
pub enum CommandError {
    /// No handler registered for this command type. Fatal to this call only.
    Unregistered(&'static str),
    /// The handler ran and returned an error.
    Failed(anyhow::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Unregistered(name) => {
                write!(f, "no handler registered for command '{}'", name)
            }
            CommandError::Failed(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl CommandError {
    /// Message suitable for user-facing notifications.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

type ErasedHandler =
    Arc<dyn Fn(Box<dyn Any + Send>) -> anyhow::Result<Box<dyn Any + Send>> + Send + Sync>;

/// Singleton-handler command registry.
///
/// Clone is cheap (shared registry), mirroring EventBus.
#[derive(Clone, Default)]
pub struct CommandHub {
    handlers: Arc<RwLock<HashMap<TypeId, ErasedHandler>>>,
}

impl CommandHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for command type C.
    ///
    /// Overwrite semantics: a later registration for the same C silently
    /// replaces the earlier one (a warning is logged). Last writer wins.
    pub fn register<C, F>(&self, handler: F)
    where
        C: Command,
        F: Fn(C) -> anyhow::Result<C::Output> + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Arc::new(move |any: Box<dyn Any + Send>| {
            let cmd = any
                .downcast::<C>()
                .map_err(|_| anyhow::anyhow!("command payload type mismatch for '{}'", C::name()))?;
            handler(*cmd).map(|out| Box::new(out) as Box<dyn Any + Send>)
        });
        let previous = self
            .handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(TypeId::of::<C>(), erased);
        if previous.is_some() {
            warn!("command '{}' re-registered, previous handler replaced", C::name());
        }
    }

    /// Invoke the handler registered for this command and return its result.
    pub fn invoke<C: Command>(&self, cmd: C) -> Result<C::Output, CommandError> {
        let handler = self
            .handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<C>())
            .cloned()
            .ok_or(CommandError::Unregistered(C::name()))?;

        let output = handler(Box::new(cmd)).map_err(CommandError::Failed)?;
        output
            .downcast::<C::Output>()
            .map(|boxed| *boxed)
            .map_err(|_| {
                CommandError::Failed(anyhow::anyhow!(
                    "command '{}' handler returned unexpected output type",
                    C::name()
                ))
            })
    }

    /// Check whether a handler is registered for C.
    pub fn has_handler<C: Command>(&self) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&TypeId::of::<C>())
    }

    /// Remove the handler for C (for teardown and tests).
    pub fn unregister<C: Command>(&self) {
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&TypeId::of::<C>());
    }
}

impl std::fmt::Debug for CommandHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHub")
            .field("handlers", &self.handlers.read().map(|h| h.len()).unwrap_or(0))
            .finish()
    }
}

//! Replay session context for log correlation
//!
//! This module provides thread-local storage for the replay session a thread
//! is working on, so every span opened during one replay pass can be tagged
//! with the same session label and id.

use std::cell::RefCell;

use tracing::span::EnteredSpan;
use uuid::Uuid;

/// Session context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContextData {
    /// Human-readable label, usually the name of the log being replayed
    pub label: String,
    /// Unique id for this replay pass
    pub session_id: Uuid,
}

thread_local! {
    static SESSION_CONTEXT: RefCell<Option<SessionContextData>> = const { RefCell::new(None) };
}

/// RAII guard for replay session context
///
/// Creating the guard sets the session for the current thread and enters a
/// `session` span carrying `label` and `session_id`, so every record logged
/// until the guard drops names the replay pass it belongs to. Dropping it
/// restores the previous context (if any).
///
/// # Example
///
/// ```ignore
/// use binlog_logging::context::SessionContextGuard;
///
/// let _guard = SessionContextGuard::new("main.binlog");
///
/// // Logged with label = "main.binlog" and the session id
/// processor.replay(records)?;
/// ```
pub struct SessionContextGuard {
    previous: Option<SessionContextData>,
    // Declared last so the span exits after the context is restored
    _span: EnteredSpan,
}

impl SessionContextGuard {
    /// Start a new session with a fresh id
    pub fn new(label: impl Into<String>) -> Self {
        let new_ctx = SessionContextData {
            label: label.into(),
            session_id: Uuid::new_v4(),
        };

        // Warn level so the span survives filters that keep only corruption reports
        let span = tracing::warn_span!(
            "session",
            label = %new_ctx.label,
            session_id = %new_ctx.session_id,
        )
        .entered();

        let previous = SESSION_CONTEXT.with(|ctx| ctx.borrow_mut().replace(new_ctx));

        Self {
            previous,
            _span: span,
        }
    }

    /// Get the current session context (if any)
    pub fn current() -> Option<SessionContextData> {
        SESSION_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current session label (if set)
    pub fn current_label() -> Option<String> {
        Self::current().map(|ctx| ctx.label)
    }

    /// Get the current session id (if set)
    pub fn current_session_id() -> Option<Uuid> {
        Self::current().map(|ctx| ctx.session_id)
    }
}

impl Drop for SessionContextGuard {
    fn drop(&mut self) {
        SESSION_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Convenience macro to run a block inside a session context
///
/// # Example
///
/// ```ignore
/// with_session_context!("main.binlog", {
///     tracing::info!("Replaying");
/// });
/// ```
#[macro_export]
macro_rules! with_session_context {
    ($label:expr, $body:block) => {{
        let _guard = $crate::context::SessionContextGuard::new($label);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_context_guard() {
        assert!(SessionContextGuard::current().is_none());

        {
            let _guard = SessionContextGuard::new("a.binlog");
            let ctx = SessionContextGuard::current().unwrap();
            assert_eq!(ctx.label, "a.binlog");
        }

        assert!(SessionContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts() {
        {
            let _guard_a = SessionContextGuard::new("a.binlog");
            let outer_id = SessionContextGuard::current_session_id().unwrap();

            {
                let _guard_b = SessionContextGuard::new("b.binlog");
                assert_eq!(
                    SessionContextGuard::current_label(),
                    Some("b.binlog".to_string())
                );
                assert_ne!(SessionContextGuard::current_session_id(), Some(outer_id));
            }

            // Should restore to A after B's guard drops
            assert_eq!(
                SessionContextGuard::current_label(),
                Some("a.binlog".to_string())
            );
            assert_eq!(SessionContextGuard::current_session_id(), Some(outer_id));
        }

        assert!(SessionContextGuard::current_label().is_none());
    }

    #[test]
    fn test_macro_scopes_context() {
        let label = with_session_context!("d.binlog", {
            SessionContextGuard::current_label()
        });
        assert_eq!(label, Some("d.binlog".to_string()));
        assert!(SessionContextGuard::current().is_none());
    }
}

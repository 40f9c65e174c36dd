//! Toast notifications.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use askama::Template;

/// Default time a toast stays on screen.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Visual style of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
}

impl ToastKind {
    const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "bg-success",
            Self::Warning => "bg-warning",
        }
    }
}

#[derive(Template)]
#[template(path = "partials/toast.html")]
struct ToastTemplate<'a> {
    message: &'a str,
    css_class: &'static str,
}

/// A short-lived message shown over the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
    pub duration: Duration,
}

impl Toast {
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.duration
    }

    /// Render the toast fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render(&self) -> askama::Result<String> {
        ToastTemplate {
            message: &self.message,
            css_class: self.kind.css_class(),
        }
        .render()
    }
}

/// Toasts currently on screen, oldest first.
#[derive(Debug)]
pub struct ToastQueue {
    toasts: Mutex<Vec<Toast>>,
    duration: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl ToastQueue {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            toasts: Mutex::new(Vec::new()),
            duration,
        }
    }

    /// Show a toast now. Toasts that have already expired are dropped.
    pub fn push(&self, message: impl Into<String>, kind: ToastKind) -> Toast {
        let toast = Toast {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
            duration: self.duration,
        };
        tracing::debug!(message = %toast.message, ?kind, "Toast shown");
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        toasts.retain(|shown| !shown.is_expired(toast.shown_at));
        toasts.push(toast.clone());
        toast
    }

    /// Toasts still on screen at `now`. Expired ones are dropped.
    pub fn visible_at(&self, now: Instant) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        toasts.retain(|toast| !toast.is_expired(now));
        toasts.clone()
    }

    /// Toasts still on screen.
    pub fn visible(&self) -> Vec<Toast> {
        self.visible_at(Instant::now())
    }

    /// Dismiss every toast.
    pub fn clear(&self) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

//! User feedback collaborators: toasts and confirmations
//!
//! The renderer reports outcomes through [`Toaster`] and asks before
//! destructive actions through [`Confirmer`]. Neither result feeds back into
//! state; a toast is fire-and-forget.

use colored::*;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::warn;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);
const MAX_QUEUED_TOASTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastOptions {
    pub kind: ToastKind,
    pub duration: Duration,
}

impl ToastOptions {
    pub fn new(kind: ToastKind) -> Self {
        Self {
            kind,
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    pub fn success() -> Self {
        Self::new(ToastKind::Success)
    }

    pub fn error() -> Self {
        Self::new(ToastKind::Error)
    }

    pub fn info() -> Self {
        Self::new(ToastKind::Info)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

pub trait Toaster {
    fn show_toast(&self, message: &str, options: ToastOptions);
}

#[allow(async_fn_in_trait)]
pub trait Confirmer {
    async fn confirm(&self, message: &str) -> bool;
}

/// Prints toasts to stderr, coloured by kind
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleToaster;

impl Toaster for ConsoleToaster {
    fn show_toast(&self, message: &str, options: ToastOptions) {
        let line = match options.kind {
            ToastKind::Info => message.normal(),
            ToastKind::Success => format!("✓ {}", message).green(),
            ToastKind::Warning => format!("! {}", message).yellow(),
            ToastKind::Error => format!("Error: {}", message).red(),
        };
        eprintln!("{}", line);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
    pub duration: Duration,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= self.duration
    }
}

/// Toasts kept in memory until they expire; the TUI status bar reads these
///
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Rc<RefCell<VecDeque<Toast>>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest toast that has not expired
    pub fn current(&self) -> Option<Toast> {
        self.prune(Instant::now());
        self.toasts.borrow().back().cloned()
    }

    pub fn prune(&self, now: Instant) {
        self.toasts.borrow_mut().retain(|t| !t.is_expired(now));
    }

    pub fn messages(&self) -> Vec<String> {
        self.toasts.borrow().iter().map(|t| t.message.clone()).collect()
    }

    pub fn kinds(&self) -> Vec<ToastKind> {
        self.toasts.borrow().iter().map(|t| t.kind).collect()
    }

    pub fn clear(&self) {
        self.toasts.borrow_mut().clear();
    }
}

impl Toaster for ToastQueue {
    fn show_toast(&self, message: &str, options: ToastOptions) {
        let mut toasts = self.toasts.borrow_mut();
        toasts.push_back(Toast {
            message: message.to_string(),
            kind: options.kind,
            shown_at: Instant::now(),
            duration: options.duration,
        });
        while toasts.len() > MAX_QUEUED_TOASTS {
            toasts.pop_front();
        }
    }
}

/// Fixed answer, for `--yes` and for flows where the UI already asked
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmer for AutoConfirm {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

/// Asks on the terminal; anything but y/yes declines
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl StdinConfirm {
    fn ask(message: &str, input: &mut impl BufRead) -> io::Result<bool> {
        eprint!("{} {} ", message, "[y/N]".dimmed());
        io::stderr().flush()?;
        let mut answer = String::new();
        input.read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Run [`StdinConfirm::ask`] on the blocking pool so the runtime thread
/// keeps polling while the user types
async fn ask_blocking<F, R>(message: &str, open_input: F) -> bool
where
    F: FnOnce() -> R + Send + 'static,
    R: BufRead,
{
    let message = message.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        let mut input = open_input();
        StdinConfirm::ask(&message, &mut input)
    })
    .await;
    match answer {
        Ok(Ok(yes)) => yes,
        Ok(Err(e)) => {
            warn!(error = %e, "Could not read confirmation");
            false
        }
        Err(e) => {
            warn!(error = %e, "Confirmation prompt did not finish");
            false
        }
    }
}

impl Confirmer for StdinConfirm {
    async fn confirm(&self, message: &str) -> bool {
        ask_blocking(message, || io::stdin().lock()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_keeps_newest_and_prunes_expired() {
        let queue = ToastQueue::new();
        queue.show_toast("old", ToastOptions::info().with_duration(Duration::ZERO));
        queue.show_toast("saved", ToastOptions::success());

        let current = queue.current().unwrap();
        assert_eq!(current.message, "saved");
        assert_eq!(current.kind, ToastKind::Success);
        assert_eq!(queue.messages(), vec!["saved"]);
    }

    #[test]
    fn test_queue_is_bounded() {
        let queue = ToastQueue::new();
        for i in 0..(MAX_QUEUED_TOASTS + 5) {
            queue.show_toast(&format!("toast {}", i), ToastOptions::info());
        }
        let messages = queue.messages();
        assert_eq!(messages.len(), MAX_QUEUED_TOASTS);
        assert_eq!(messages[0], "toast 5");
    }

    #[test]
    fn test_stdin_confirm_parsing() {
        let mut yes = io::Cursor::new(b"Yes\n".to_vec());
        assert!(StdinConfirm::ask("Delete?", &mut yes).unwrap());
        let mut no = io::Cursor::new(b"\n".to_vec());
        assert!(!StdinConfirm::ask("Delete?", &mut no).unwrap());
    }

    #[tokio::test]
    async fn test_confirmation_read_off_the_runtime_thread() {
        let runtime_thread = std::thread::current().id();
        let answered = ask_blocking("Delete?", move || {
            assert_ne!(std::thread::current().id(), runtime_thread);
            io::Cursor::new(b"y\n".to_vec())
        })
        .await;
        assert!(answered);

        let declined = ask_blocking("Delete?", || io::Cursor::new(Vec::new())).await;
        assert!(!declined);
    }

    #[tokio::test]
    async fn test_auto_confirm() {
        assert!(AutoConfirm(true).confirm("sure?").await);
        assert!(!AutoConfirm(false).confirm("sure?").await);
    }
}

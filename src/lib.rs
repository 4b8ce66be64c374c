//! promptdesk - client core for a shared prompt library
//!
//! promptdesk keeps a local copy of a backend's prompts, categories and tags,
//! filters and paginates it, and drives the dialogs used to view, edit and
//! delete prompts. The same core backs the `pdesk` command line and its
//! terminal UI.
//!
//! # Quick Start
//!
//! ```no_run
//! use promptdesk::{AppStore, FilterEngine, PromptListRenderer, ToastQueue};
//! use promptdesk::api::ApiClient;
//! use std::time::Duration;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let api = ApiClient::new("http://localhost:8080", Duration::from_secs(30))?;
//! let renderer = PromptListRenderer::new(
//!     AppStore::new(),
//!     api,
//!     ToastQueue::new(),
//!     FilterEngine::default(),
//! );
//! renderer.refresh().await?;
//! renderer.set_search("review");
//! for card in renderer.rendered().cards {
//!     println!("{} [{}]", card.title, card.category_label);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`store`]: Observable application state
//! - [`filter`]: Search, category/tag filtering and pagination
//! - [`modal`]: Stacked dialogs with focus management
//! - [`renderer`]: Prompt cards and the actions behind them
//! - [`api`]: Backend boundary (HTTP client behind the `http` feature)
//! - [`tui`]: Terminal user interface (feature-gated)

pub mod api;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod modal;
pub mod model;
pub mod notify;
pub mod renderer;
pub mod store;
pub mod validation;

#[cfg(feature = "tui")]
pub mod tui;

pub use api::PromptApi;
pub use cli::{Cli, Commands};
pub use clipboard::{Clipboard, ClipboardSink, MemoryClipboard};
pub use config::Settings;
pub use error::{ApiError, AppError, ValidationError};
pub use filter::{
    filter_prompts, paginate, FilterCriteria, FilterEngine, Page, Paginator, TagMatch,
    DEFAULT_PAGE_SIZE,
};
pub use logging::{init_logging, log_api_call, log_command_execution, LogConfig};
pub use modal::{ElementId, ModalHost, ModalKey, ModalStack, ModalState, Presentation, VirtualDocument};
pub use model::{Category, Comment, Prompt, PromptDraft, PromptResult, Tag};
pub use notify::{
    AutoConfirm, Confirmer, ConsoleToaster, StdinConfirm, ToastKind, ToastOptions, ToastQueue,
    Toaster,
};
pub use renderer::{DeleteOutcome, ModalIds, PromptCard, PromptListRenderer, RenderedList};
pub use store::{AppState, AppStore, StatePatch, Subscription};

#[cfg(feature = "http")]
pub use api::ApiClient;

//! System clipboard integration
//!
//! Backs the "copy prompt" card action. When no clipboard is available
//! (headless sessions, CI) the content goes to stdout instead.

use anyhow::{Context, Result};
use copypasta::{ClipboardContext, ClipboardProvider};
use std::io::{self, Write};

/// Anything prompt content can be copied into
pub trait ClipboardSink {
    fn copy_text(&mut self, content: &str) -> Result<()>;
}

pub struct Clipboard {
    context: Option<ClipboardContext>,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard {
    pub fn new() -> Self {
        // Try to initialize clipboard, but don't fail if it's not available
        let context = ClipboardContext::new().ok();
        Self { context }
    }

    pub fn is_available(&self) -> bool {
        self.context.is_some()
    }

    pub fn copy_to_clipboard(&mut self, content: &str) -> Result<()> {
        match self.context {
            Some(ref mut ctx) => ctx
                .set_contents(content.to_string())
                .map_err(|e| anyhow::anyhow!("Failed to copy to clipboard: {}", e)),
            None => self.write_to_stdout(content),
        }
    }

    pub fn write_to_stdout(&self, content: &str) -> Result<()> {
        let mut stdout = io::stdout();
        stdout
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        stdout.flush()?;
        Ok(())
    }
}

impl ClipboardSink for Clipboard {
    fn copy_text(&mut self, content: &str) -> Result<()> {
        self.copy_to_clipboard(content)
    }
}

/// Captures copied text in memory
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl ClipboardSink for MemoryClipboard {
    fn copy_text(&mut self, content: &str) -> Result<()> {
        self.contents = Some(content.to_string());
        Ok(())
    }
}

// Comments and saved results attached to a prompt

use anyhow::Result;
use colored::*;
use std::io::Write;

use crate::api::PromptApi;
use crate::cli::FeedbackCommands;
use crate::notify::Toaster;
use crate::renderer::PromptListRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Comments,
    Results,
}

pub async fn handle_feedback<A: PromptApi, T: Toaster>(
    renderer: &PromptListRenderer<A, T>,
    kind: FeedbackKind,
    command: FeedbackCommands,
    out: &mut impl Write,
) -> Result<()> {
    match (kind, command) {
        (FeedbackKind::Comments, FeedbackCommands::List { prompt_id }) => {
            let comments = renderer.comments(&prompt_id).await?;
            if comments.is_empty() {
                writeln!(out, "  No comments on {}", prompt_id)?;
            }
            for comment in comments {
                let author = comment.author.as_deref().unwrap_or("anonymous");
                let when = comment
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "  {:<8} {} {} {}",
                    comment.id.dimmed(),
                    format!("{}:", author).bold(),
                    comment.content,
                    when.dimmed()
                )?;
            }
        }
        (FeedbackKind::Results, FeedbackCommands::List { prompt_id }) => {
            let results = renderer.results(&prompt_id).await?;
            if results.is_empty() {
                writeln!(out, "  No saved results for {}", prompt_id)?;
            }
            for result in results {
                let model = result.model.as_deref().unwrap_or("unknown model");
                writeln!(out, "{} {}", result.id.dimmed(), format!("[{}]", model).cyan())?;
                writeln!(out, "{}\n", result.content)?;
            }
        }
        (FeedbackKind::Comments, FeedbackCommands::Add { prompt_id, content }) => {
            renderer.add_comment(&prompt_id, &content).await?;
        }
        (FeedbackKind::Results, FeedbackCommands::Add { prompt_id, content }) => {
            renderer.add_result(&prompt_id, &content).await?;
        }
        (FeedbackKind::Comments, FeedbackCommands::Delete { id }) => {
            renderer.delete_comment(&id).await?;
        }
        (FeedbackKind::Results, FeedbackCommands::Delete { id }) => {
            renderer.delete_result(&id).await?;
        }
    }
    Ok(())
}

// Tag and category management

use anyhow::{bail, Result};
use colored::*;
use std::io::Write;

use crate::api::PromptApi;
use crate::cli::NameCommands;
use crate::notify::{AutoConfirm, Confirmer, Toaster};
use crate::renderer::{DeleteOutcome, PromptListRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Tag,
    Category,
}

impl NameKind {
    fn plural(self) -> &'static str {
        match self {
            NameKind::Tag => "tags",
            NameKind::Category => "categories",
        }
    }
}

pub async fn handle_names<A: PromptApi, T: Toaster>(
    renderer: &PromptListRenderer<A, T>,
    kind: NameKind,
    command: NameCommands,
    confirmer: &impl Confirmer,
    out: &mut impl Write,
) -> Result<()> {
    renderer.refresh().await?;

    match command {
        NameCommands::List => {
            let state = renderer.store().snapshot();
            let rows: Vec<(String, String, usize)> = match kind {
                NameKind::Tag => state
                    .tags
                    .iter()
                    .map(|t| {
                        let used = state.prompts.iter().filter(|p| p.tags.contains(&t.id)).count();
                        (t.id.clone(), t.name.clone(), used)
                    })
                    .collect(),
                NameKind::Category => state
                    .categories
                    .iter()
                    .map(|c| {
                        let used = state.prompts.iter().filter(|p| p.category == c.id).count();
                        (c.id.clone(), c.name.clone(), used)
                    })
                    .collect(),
            };

            if rows.is_empty() {
                writeln!(out, "  No {} yet", kind.plural())?;
            }
            for (id, name, used) in rows {
                writeln!(
                    out,
                    "  {:<8} {:<24} {}",
                    id.dimmed(),
                    name.bold(),
                    format!("{} prompts", used).dimmed()
                )?;
            }
        }
        NameCommands::Add { name } => {
            match kind {
                NameKind::Tag => renderer.create_tag(&name).await.map(|_| ())?,
                NameKind::Category => renderer.create_category(&name).await.map(|_| ())?,
            };
        }
        NameCommands::Delete { id, yes } => {
            let outcome = match (kind, yes) {
                (NameKind::Tag, true) => renderer.delete_tag(&id, &AutoConfirm(true)).await,
                (NameKind::Tag, false) => renderer.delete_tag(&id, confirmer).await,
                (NameKind::Category, true) => {
                    renderer.delete_category(&id, &AutoConfirm(true)).await
                }
                (NameKind::Category, false) => renderer.delete_category(&id, confirmer).await,
            };
            match outcome {
                DeleteOutcome::Deleted => {}
                DeleteOutcome::Cancelled => writeln!(out, "  Cancelled")?,
                DeleteOutcome::Failed => bail!("'{}' was not deleted", id),
            }
        }
    }
    Ok(())
}

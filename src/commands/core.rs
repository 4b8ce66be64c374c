// Prompt commands: list, show, new, edit, delete, copy

use anyhow::{bail, Result};
use colored::*;
use std::io::Write;

use super::{resolve_category, resolve_tags};
use crate::api::PromptApi;
use crate::cli::PromptFields;
use crate::clipboard::ClipboardSink;
use crate::error::AppError;
use crate::filter::FilterCriteria;
use crate::model::{Labels, PromptDraft};
use crate::notify::{Confirmer, Toaster};
use crate::renderer::{DeleteOutcome, PromptCard, PromptListRenderer};

fn write_card(out: &mut impl Write, card: &PromptCard) -> Result<()> {
    let tags = card
        .tag_labels
        .iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(
        out,
        "  {:<8} {:<36} {} {}",
        card.id.dimmed(),
        card.title.bold(),
        format!("[{}]", card.category_label).cyan(),
        tags.yellow()
    )?;
    Ok(())
}

pub async fn handle_list<A: PromptApi, T: Toaster>(
    renderer: &PromptListRenderer<A, T>,
    mut criteria: FilterCriteria,
    all: bool,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    renderer.refresh().await?;

    // Names are a convenience; an unknown value is still a valid (dangling) id.
    if let Some(key) = criteria.category_id.take() {
        let categories = renderer.store().categories();
        criteria.category_id = Some(resolve_category(&categories, &key).unwrap_or(key));
    }
    renderer.set_criteria(criteria);
    if all {
        while renderer.load_more() {}
    }

    let list = renderer.rendered();
    if json {
        serde_json::to_writer_pretty(&mut *out, &list.cards)?;
        writeln!(out)?;
        return Ok(());
    }

    if list.cards.is_empty() {
        writeln!(out, "  No prompts match. Create one with: {} new", "pdesk".bold())?;
        return Ok(());
    }
    for card in &list.cards {
        write_card(out, card)?;
    }
    if list.has_more {
        writeln!(
            out,
            "\n  Showing {} of {}. Use {} to see everything.",
            list.cards.len(),
            list.total,
            "--all".bold()
        )?;
    }
    Ok(())
}

pub async fn handle_show<A: PromptApi, T: Toaster>(
    renderer: &PromptListRenderer<A, T>,
    id: &str,
    verbose: bool,
    out: &mut impl Write,
) -> Result<()> {
    renderer.refresh().await?;
    let prompt = renderer
        .store()
        .find_prompt(id)
        .ok_or_else(|| AppError::not_found("prompt", id))?;

    let state = renderer.store().snapshot();
    let labels = Labels::new(&state.categories, &state.tags);
    let card = PromptCard::from_prompt(&prompt, &labels);

    writeln!(out, "{} {}", card.title.bold(), format!("({})", card.id).dimmed())?;
    writeln!(out, "  {:<10} {}", "category".dimmed(), card.category_label.cyan())?;
    if !card.tag_labels.is_empty() {
        writeln!(out, "  {:<10} {}", "tags".dimmed(), card.tag_labels.join(", ").yellow())?;
    }
    if let Some(author) = &card.author {
        writeln!(out, "  {:<10} {}", "author".dimmed(), author)?;
    }
    if let Some(created) = &card.created {
        writeln!(out, "  {:<10} {}", "created".dimmed(), created)?;
    }
    if let Some(description) = &card.description {
        writeln!(out, "\n  {}", description.italic())?;
    }
    writeln!(out, "\n{}", prompt.content)?;

    if verbose {
        let comments = renderer.comments(id).await?;
        writeln!(out, "\n{} ({})", "Comments".green(), comments.len())?;
        for comment in comments {
            let author = comment.author.as_deref().unwrap_or("anonymous");
            writeln!(out, "  {} {}", format!("{}:", author).dimmed(), comment.content)?;
        }
        let results = renderer.results(id).await?;
        writeln!(out, "\n{} ({})", "Results".green(), results.len())?;
        for result in results {
            let model = result.model.as_deref().unwrap_or("unknown model");
            writeln!(out, "  {} {}", format!("[{}]", model).dimmed(), result.content)?;
        }
    }
    Ok(())
}

/// Fill a draft from command-line fields, resolving names to ids
fn apply_fields<A: PromptApi, T: Toaster>(
    renderer: &PromptListRenderer<A, T>,
    draft: &mut PromptDraft,
    fields: PromptFields,
) -> Result<(), AppError> {
    if let Some(title) = fields.title {
        draft.title = title;
    }
    if let Some(content) = fields.content {
        draft.content = content;
    }
    if let Some(description) = fields.description {
        draft.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    if let Some(category) = fields.category {
        draft.category = resolve_category(&renderer.store().categories(), &category)?;
    }
    if !fields.tags.is_empty() {
        draft.tags = resolve_tags(&renderer.store().tags(), &fields.tags)?;
    }
    Ok(())
}

/// `piped` is stdin content, used when `--content` is absent
pub async fn handle_new<A: PromptApi, T: Toaster>(
    renderer: &PromptListRenderer<A, T>,
    mut fields: PromptFields,
    piped: Option<String>,
) -> Result<()> {
    renderer.refresh().await?;
    if fields.content.is_none() {
        fields.content = piped;
    }
    let mut draft = PromptDraft::default();
    apply_fields(renderer, &mut draft, fields)?;
    renderer.save_prompt(None, &draft).await?;
    Ok(())
}

pub async fn handle_edit<A: PromptApi, T: Toaster>(
    renderer: &PromptListRenderer<A, T>,
    id: &str,
    fields: PromptFields,
) -> Result<()> {
    if fields.is_empty() {
        bail!("Nothing to change. Pass at least one of --title, --content, --description, --category, --tag");
    }
    renderer.refresh().await?;
    let prompt = renderer
        .store()
        .find_prompt(id)
        .ok_or_else(|| AppError::not_found("prompt", id))?;

    let mut draft = prompt.to_draft();
    apply_fields(renderer, &mut draft, fields)?;
    renderer.save_prompt(Some(id), &draft).await?;
    Ok(())
}

pub async fn handle_delete<A: PromptApi, T: Toaster>(
    renderer: &PromptListRenderer<A, T>,
    id: &str,
    confirmer: &impl Confirmer,
    out: &mut impl Write,
) -> Result<()> {
    renderer.refresh().await?;
    if renderer.store().find_prompt(id).is_none() {
        return Err(AppError::not_found("prompt", id).into());
    }
    match renderer.delete_prompt(id, confirmer).await {
        DeleteOutcome::Deleted => Ok(()),
        DeleteOutcome::Cancelled => {
            writeln!(out, "  Cancelled")?;
            Ok(())
        }
        DeleteOutcome::Failed => bail!("Prompt '{}' was not deleted", id),
    }
}

pub async fn handle_copy<A: PromptApi, T: Toaster>(
    renderer: &PromptListRenderer<A, T>,
    id: &str,
    clipboard: &mut impl ClipboardSink,
) -> Result<()> {
    renderer.refresh().await?;
    if renderer.store().find_prompt(id).is_none() {
        return Err(AppError::not_found("prompt", id).into());
    }
    if !renderer.copy_prompt(id, clipboard) {
        bail!("Could not copy prompt '{}'", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::filter::{FilterEngine, TagMatch};
    use crate::model::{Category, Comment, Prompt, Tag};
    use crate::notify::{AutoConfirm, ToastQueue};
    use crate::renderer::testing::FakeApi;
    use crate::store::AppStore;

    fn renderer(page_size: usize) -> PromptListRenderer<FakeApi, ToastQueue> {
        colored::control::set_override(false);
        let mut prompts = vec![
            Prompt::new("p1", "Explain lifetimes", "Explain the borrow error")
                .with_category("c1")
                .with_tags(["t1"]),
            Prompt::new("p2", "Essay outline", "Outline an essay").with_category("c2"),
        ];
        prompts[1].description = Some("Long-form writing".to_string());
        let api = FakeApi::with_library(
            prompts,
            vec![Category::new("c1", "Coding"), Category::new("c2", "Writing")],
            vec![Tag::new("t1", "rust")],
        );
        PromptListRenderer::new(
            AppStore::new(),
            api,
            ToastQueue::new(),
            FilterEngine::new(page_size, TagMatch::NameOrId),
        )
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_list_resolves_category_name() {
        let r = renderer(20);
        let mut out = Vec::new();
        let criteria = FilterCriteria::new().with_category("writing");
        handle_list(&r, criteria, false, false, &mut out).await.unwrap();

        let text = output(out);
        assert!(text.contains("Essay outline"));
        assert!(!text.contains("Explain lifetimes"));
        assert_eq!(r.criteria().category_id.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn test_list_pages_and_all() {
        let r = renderer(1);
        let mut out = Vec::new();
        handle_list(&r, FilterCriteria::new(), false, false, &mut out).await.unwrap();
        assert!(output(out).contains("Showing 1 of 2"));

        let mut out = Vec::new();
        handle_list(&r, FilterCriteria::new(), true, true, &mut out).await.unwrap();
        let cards: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(cards.as_array().unwrap().len(), 2);
        assert_eq!(cards[0]["category_label"], "Coding");
    }

    #[tokio::test]
    async fn test_show_verbose_includes_comments() {
        let r = renderer(20);
        r.api().comments.borrow_mut().push(Comment {
            id: "cm1".to_string(),
            prompt_id: "p2".to_string(),
            content: "Great for blogs".to_string(),
            author: Some("sam".to_string()),
            created_at: None,
        });
        let mut out = Vec::new();
        handle_show(&r, "p2", true, &mut out).await.unwrap();

        let text = output(out);
        assert!(text.contains("Writing"));
        assert!(text.contains("Long-form writing"));
        assert!(text.contains("Outline an essay"));
        assert!(text.contains("sam: Great for blogs"));
    }

    #[tokio::test]
    async fn test_show_unknown_prompt() {
        let r = renderer(20);
        let err = handle_show(&r, "nope", false, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::NotFound { kind: "prompt", .. })
        ));
    }

    #[tokio::test]
    async fn test_new_uses_piped_content_and_names() {
        let r = renderer(20);
        let fields = PromptFields {
            title: Some("Refactor".to_string()),
            category: Some("coding".to_string()),
            tags: vec!["rust".to_string()],
            ..PromptFields::default()
        };
        handle_new(&r, fields, Some("Refactor this module".to_string())).await.unwrap();

        let created = r.api().prompts.borrow().last().cloned().unwrap();
        assert_eq!(created.content, "Refactor this module");
        assert_eq!(created.category, "c1");
        assert_eq!(created.tags, vec!["t1"]);
    }

    #[tokio::test]
    async fn test_new_without_content_fails_validation() {
        let r = renderer(20);
        let fields = PromptFields {
            title: Some("Empty".to_string()),
            category: Some("c1".to_string()),
            ..PromptFields::default()
        };
        let err = handle_new(&r, fields, None).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_edit_changes_only_given_fields() {
        let r = renderer(20);
        let fields = PromptFields {
            title: Some("Lifetimes, explained".to_string()),
            ..PromptFields::default()
        };
        handle_edit(&r, "p1", fields).await.unwrap();

        let edited = r.store().find_prompt("p1").unwrap();
        assert_eq!(edited.title, "Lifetimes, explained");
        assert_eq!(edited.content, "Explain the borrow error");
        assert_eq!(edited.tags, vec!["t1"]);

        assert!(handle_edit(&r, "p1", PromptFields::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_and_copy() {
        let r = renderer(20);
        let mut out = Vec::new();
        handle_delete(&r, "p1", &AutoConfirm(false), &mut out).await.unwrap();
        assert!(output(out).contains("Cancelled"));

        let mut clipboard = MemoryClipboard::default();
        handle_copy(&r, "p1", &mut clipboard).await.unwrap();
        assert_eq!(clipboard.contents.as_deref(), Some("Explain the borrow error"));

        handle_delete(&r, "p1", &AutoConfirm(true), &mut Vec::new()).await.unwrap();
        assert!(r.api().prompts.borrow().iter().all(|p| p.id != "p1"));
        assert!(handle_delete(&r, "p1", &AutoConfirm(true), &mut Vec::new()).await.is_err());
    }
}

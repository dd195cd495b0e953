//! Subcommands of the `conviz` binary and their dispatch.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Subcommand;
use conviz_core::time::format_ms;
use conviz_events::EventBus;
use conviz_llm::ConceptProcessor;
use conviz_settings::{ConvizSettings, ImportConflictStrategy};
use conviz_store::{Visualization, VisualizationStore};

use crate::pipeline::{ConceptPipeline, VisualizeRequest};

/// `conviz` subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Break a concept down through the configured endpoint.
    Visualize {
        /// Concept text.
        concept: String,
        /// Save the breakdown to the dashboard.
        #[arg(long)]
        save: bool,
        /// Title to save under (default: breakdown heading).
        #[arg(long)]
        title: Option<String>,
        /// Category to save under (default: first related concept).
        #[arg(long)]
        category: Option<String>,
        /// Dashboard folder.
        #[arg(long)]
        folder: Option<String>,
        /// Tag, repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List saved visualizations.
    List {
        /// Only this category.
        #[arg(long)]
        category: Option<String>,
        /// Only this folder.
        #[arg(long)]
        folder: Option<String>,
        /// Case-insensitive match on title or content.
        #[arg(long)]
        search: Option<String>,
    },
    /// Print one visualization.
    Show {
        /// Visualization id.
        id: String,
    },
    /// Change fields of a saved visualization.
    Edit {
        /// Visualization id.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New category.
        #[arg(long)]
        category: Option<String>,
        /// New folder.
        #[arg(long)]
        folder: Option<String>,
        /// Replace the content with this file.
        #[arg(long)]
        content_file: Option<PathBuf>,
    },
    /// Delete a visualization.
    Delete {
        /// Visualization id.
        id: String,
    },
    /// Export all visualizations to a JSON file.
    Export {
        /// Target directory (default: `export.directory` setting).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Import visualizations from an exported JSON file.
    Import {
        /// File to import.
        file: PathBuf,
        /// What to do with ids that already exist.
        #[arg(long, value_name = "fail|skip|reassign")]
        on_conflict: Option<ImportConflictStrategy>,
    },
}

/// Shared handles a command runs against.
pub struct Context<'a> {
    pub settings: &'a ConvizSettings,
    pub bus: &'a EventBus,
    pub store: &'a VisualizationStore,
    pub processor: &'a dyn ConceptProcessor,
}

/// Execute `command`, writing user-facing output to `out`.
pub async fn run(command: Command, ctx: &Context<'_>, out: &mut impl Write) -> Result<()> {
    let store = ctx.store;
    match command {
        Command::Visualize {
            concept,
            save,
            title,
            category,
            folder,
            tags,
        } => {
            let pipeline = ConceptPipeline::new(ctx.processor, ctx.bus, store);
            let outcome = pipeline
                .visualize(VisualizeRequest {
                    concept,
                    save,
                    title,
                    category,
                    folder,
                    tags,
                })
                .await?;
            writeln!(out, "{}", outcome.markdown.trim_end())?;
            if let Some(saved) = outcome.saved {
                writeln!(out, "\nsaved as {} ({})", saved.id, saved.category)?;
            }
        }
        Command::List {
            category,
            folder,
            search,
        } => {
            let mut items = match (&category, &folder) {
                (Some(category), _) => store.list_by_category(category).await?,
                (None, Some(folder)) => store.list_by_folder(folder).await?,
                (None, None) => {
                    store.load_visualizations().await?;
                    store.items()
                }
            };
            if let (Some(_), Some(folder)) = (&category, &folder) {
                items.retain(|v| v.folder.as_deref() == Some(folder.as_str()));
            }
            if let Some(term) = &search {
                items.retain(|v| v.matches(term));
            }
            if items.is_empty() {
                writeln!(out, "no visualizations")?;
            }
            for v in &items {
                writeln!(out, "{}", list_line(v))?;
            }
        }
        Command::Show { id } => {
            let v = find(store, &id).await?;
            writeln!(out, "id:       {}", v.id)?;
            writeln!(out, "title:    {}", v.title)?;
            writeln!(out, "category: {}", v.category)?;
            if let Some(folder) = &v.folder {
                writeln!(out, "folder:   {folder}")?;
            }
            if let Some(tags) = &v.tags {
                writeln!(out, "tags:     {}", tags.join(", "))?;
            }
            writeln!(out, "created:  {}", format_ms(v.timestamp).unwrap_or_default())?;
            writeln!(out, "\n{}", v.content.trim_end())?;
        }
        Command::Edit {
            id,
            title,
            category,
            folder,
            content_file,
        } => {
            let mut v = find(store, &id).await?;
            if let Some(title) = title {
                v.title = title;
            }
            if let Some(category) = category {
                v.category = category;
            }
            if folder.is_some() {
                v.folder = folder;
            }
            if let Some(path) = content_file {
                v.content = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
            }
            store.update_visualization(v).await?;
            writeln!(out, "updated {id}")?;
        }
        Command::Delete { id } => {
            let _ = find(store, &id).await?;
            store.delete_visualization(&id).await?;
            writeln!(out, "deleted {id}")?;
        }
        Command::Export { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&ctx.settings.export.directory));
            store.load_visualizations().await?;
            let path = store.export_visualizations(&dir).await?;
            writeln!(out, "exported {} to {}", store.items().len(), path.display())?;
        }
        Command::Import { file, .. } => {
            let report = store.import_visualizations(&file).await?;
            writeln!(
                out,
                "imported {}, skipped {}, reassigned {}",
                report.imported, report.skipped, report.reassigned
            )?;
        }
    }
    Ok(())
}

async fn find(store: &VisualizationStore, id: &str) -> Result<Visualization> {
    match store.get_visualization(id).await? {
        Some(v) => Ok(v),
        None => bail!("visualization {id} not found"),
    }
}

fn list_line(v: &Visualization) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        v.id,
        v.title,
        v.category,
        v.folder.as_deref().unwrap_or("-"),
        format_ms(v.timestamp).unwrap_or_default()
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

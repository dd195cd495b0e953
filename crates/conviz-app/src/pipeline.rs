//! The concept pipeline: concept in, markdown breakdown out, optionally saved.
//!
//! Event sequence on success:
//!
//! ```text
//! CONCEPT_INPUT
//! SYSTEM_STATUS busy
//! PROCESSING_START llm        PROCESSING_END llm
//! PROCESSING_START visualization  (save only; the store publishes
//! PROCESSING_END visualization     STATE_UPDATE + VISUALIZATION_READY)
//! SYSTEM_STATUS ready
//! ```
//!
//! On failure an `ERROR` event is published, followed by
//! `SYSTEM_STATUS error`.

use conviz_events::{AppEvent, EventBus, Stage, Status};
use conviz_llm::{ConceptError, ConceptProcessor, extract_category, extract_title};
use conviz_store::{StoreError, Visualization, VisualizationDraft, VisualizationStore};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, instrument};

/// Errors surfaced by [`ConceptPipeline::visualize`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The concept was empty after trimming.
    #[error("concept is empty")]
    EmptyConcept,
    /// The endpoint call failed.
    #[error(transparent)]
    Concept(#[from] ConceptError),
    /// Persisting the breakdown failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    fn code(&self) -> &'static str {
        match self {
            Self::EmptyConcept => "EMPTY_CONCEPT",
            Self::Concept(e) => e.code(),
            Self::Store(_) => conviz_store::STORE_ERROR_CODE,
        }
    }
}

/// What to do with a concept.
#[derive(Clone, Debug, Default)]
pub struct VisualizeRequest {
    /// Concept text.
    pub concept: String,
    /// Persist the breakdown.
    pub save: bool,
    /// Title override; defaults to the breakdown heading, then the concept.
    pub title: Option<String>,
    /// Category override; defaults to the first related concept.
    pub category: Option<String>,
    /// Dashboard folder.
    pub folder: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
}

/// Result of a pipeline run.
#[derive(Clone, Debug)]
pub struct VisualizeOutcome {
    /// Breakdown markdown.
    pub markdown: String,
    /// Stored record, when saving was requested.
    pub saved: Option<Visualization>,
}

/// Connects the endpoint, the bus, and the store.
pub struct ConceptPipeline<'a> {
    processor: &'a dyn ConceptProcessor,
    bus: &'a EventBus,
    store: &'a VisualizationStore,
}

impl<'a> ConceptPipeline<'a> {
    /// Create a pipeline over borrowed collaborators.
    pub fn new(
        processor: &'a dyn ConceptProcessor,
        bus: &'a EventBus,
        store: &'a VisualizationStore,
    ) -> Self {
        Self {
            processor,
            bus,
            store,
        }
    }

    /// Run one concept through the pipeline.
    #[instrument(skip_all, fields(save = request.save))]
    pub async fn visualize(
        &self,
        request: VisualizeRequest,
    ) -> Result<VisualizeOutcome, PipelineError> {
        let concept = request.concept.trim().to_string();
        if concept.is_empty() {
            return Err(self.report(PipelineError::EmptyConcept));
        }

        self.bus.publish(AppEvent::concept_input(&*concept));
        self.bus.publish(AppEvent::system_status(Status::Busy, None));

        match self.run(&concept, request).await {
            Ok(outcome) => {
                self.bus.publish(AppEvent::system_status(Status::Ready, None));
                Ok(outcome)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    async fn run(
        &self,
        concept: &str,
        request: VisualizeRequest,
    ) -> Result<VisualizeOutcome, PipelineError> {
        self.bus.publish(AppEvent::processing_start(Stage::Llm));
        let result = self.processor.process(concept).await;
        self.bus.publish(AppEvent::processing_end(Stage::Llm));
        let markdown = result?;

        if !request.save {
            return Ok(VisualizeOutcome {
                markdown,
                saved: None,
            });
        }

        self.bus.publish(AppEvent::processing_start(Stage::Visualization));
        let draft = draft_from_breakdown(concept, &markdown, request);
        let saved = self.store.save_visualization(draft).await;
        self.bus.publish(AppEvent::processing_end(Stage::Visualization));
        let saved = saved?;

        info!(id = %saved.id, title = %saved.title, "breakdown saved");
        Ok(VisualizeOutcome {
            markdown,
            saved: Some(saved),
        })
    }

    fn report(&self, err: PipelineError) -> PipelineError {
        // the store publishes its own ERROR event
        if !matches!(err, PipelineError::Store(_)) {
            let mut context = Map::new();
            let _ = context.insert("stage".into(), Value::from("pipeline"));
            self.bus
                .publish(AppEvent::error(err.code(), err.to_string(), Some(context)));
        }
        self.bus
            .publish(AppEvent::system_status(Status::Error, Some(err.to_string())));
        err
    }
}

/// Build the record to save from a breakdown and the request overrides.
pub fn draft_from_breakdown(
    concept: &str,
    markdown: &str,
    request: VisualizeRequest,
) -> VisualizationDraft {
    let title = request
        .title
        .or_else(|| extract_title(markdown))
        .unwrap_or_else(|| concept.to_string());
    let category = request
        .category
        .unwrap_or_else(|| extract_category(markdown));
    VisualizationDraft {
        content: markdown.to_string(),
        title,
        category,
        tags: (!request.tags.is_empty()).then_some(request.tags),
        folder: request.folder,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{bail, Result};
use clickdemo_contracts::events::{EventPayload, EventWriter};
use clickdemo_contracts::region::RegionCode;
use clickdemo_contracts::widget::{missing_page_markers, WidgetConfig};
use serde_json::{json, Value};

use crate::attachment::ImageAttachment;
use crate::client::GenerationClient;
use crate::invoker::{RetryState, RetryingInvoker};
use crate::stages::{extract, synthesize, DesignSystemDescription, RenderedPage, Stage};

/// Everything one generation needs, already read from disk.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub main: ImageAttachment,
    pub contexts: Vec<ImageAttachment>,
    pub widget: WidgetConfig,
}

impl PipelineInputs {
    pub fn from_paths(main: &Path, contexts: &[PathBuf], widget: WidgetConfig) -> Result<Self> {
        let main = ImageAttachment::from_path(main)?;
        let contexts = contexts
            .iter()
            .map(|path| ImageAttachment::from_path(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            main,
            contexts,
            widget,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub design_system: DesignSystemDescription,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub page: RenderedPage,
    pub extraction_attempts: u32,
    pub synthesis_attempts: u32,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct PipelineFailure {
    pub stage: Stage,
    pub attempts: u32,
    pub error: anyhow::Error,
}

/// Where a generation stands after a step. `Synthesis` and `Failure` are
/// terminal.
#[derive(Debug)]
pub enum PipelineOutcome {
    Extraction(ExtractionResult),
    Synthesis(SynthesisResult),
    Failure(PipelineFailure),
}

impl PipelineOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineOutcome::Extraction(_))
    }
}

pub struct Pipeline<'a> {
    client: &'a dyn GenerationClient,
    backoff: Duration,
    events: EventWriter,
    event_log_errors: Mutex<Vec<String>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(client: &'a dyn GenerationClient, backoff: Duration, events: EventWriter) -> Self {
        Self {
            client,
            backoff,
            events,
            event_log_errors: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> &EventWriter {
        &self.events
    }

    /// Event-log writes that failed so far. They never change the outcome of
    /// a generation; callers decide whether to surface them.
    pub fn event_log_errors(&self) -> Vec<String> {
        self.event_log_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reads the images, then runs extraction and synthesis. Errors are
    /// returned exactly as the failing step produced them.
    pub fn generate(
        &self,
        main_image: &Path,
        contract_id: &str,
        region: RegionCode,
        context_images: &[PathBuf],
    ) -> Result<RenderedPage> {
        let widget = WidgetConfig::new(contract_id, region)?;
        let inputs = PipelineInputs::from_paths(main_image, context_images, widget)?;
        Ok(self.run(&inputs)?.page)
    }

    pub fn run(&self, inputs: &PipelineInputs) -> Result<SynthesisResult> {
        self.emit(
            "pipeline_started",
            json!({
                "provider": self.client.name(),
                "model": self.client.model(),
                "contract_id": inputs.widget.contract_id(),
                "region": inputs.widget.region().as_str(),
                "context_images": inputs.contexts.len(),
            }),
        );
        let mut outcome = self.start(inputs);
        while !outcome.is_terminal() {
            outcome = self.advance(inputs, outcome);
        }
        match outcome {
            PipelineOutcome::Synthesis(result) => {
                self.emit(
                    "pipeline_completed",
                    json!({
                        "html_bytes": result.page.as_str().len(),
                        "warnings": result.warnings.len(),
                    }),
                );
                Ok(result)
            }
            PipelineOutcome::Failure(failure) => Err(failure.error),
            PipelineOutcome::Extraction(_) => bail!("pipeline stopped after design extraction"),
        }
    }

    /// Runs design extraction.
    pub fn start(&self, inputs: &PipelineInputs) -> PipelineOutcome {
        let stage = Stage::Extraction;
        self.emit_stage_started(stage, inputs.contexts.len() + 1);
        let invoker = RetryingInvoker::new(self.client, self.backoff);
        let attempted = extract(
            &invoker,
            inputs.main.clone(),
            inputs.contexts.iter().cloned(),
            |state, err| self.emit_retry(stage, state, err),
        );
        match attempted.result {
            Ok(design_system) => {
                self.emit(
                    "stage_completed",
                    json!({
                        "stage": stage.as_str(),
                        "attempts": attempted.state.attempt,
                        "output_chars": design_system.as_str().chars().count(),
                    }),
                );
                PipelineOutcome::Extraction(ExtractionResult {
                    design_system,
                    attempts: attempted.state.attempt,
                })
            }
            Err(error) => self.fail(stage, attempted.state, error),
        }
    }

    /// Moves a non-terminal outcome one step forward; terminal outcomes are
    /// returned unchanged.
    pub fn advance(&self, inputs: &PipelineInputs, outcome: PipelineOutcome) -> PipelineOutcome {
        let extraction = match outcome {
            PipelineOutcome::Extraction(extraction) => extraction,
            terminal => return terminal,
        };
        let stage = Stage::Synthesis;
        self.emit_stage_started(stage, 1);
        let invoker = RetryingInvoker::new(self.client, self.backoff);
        let attempted = synthesize(
            &invoker,
            inputs.main.clone(),
            &extraction.design_system,
            &inputs.widget,
            |state, err| self.emit_retry(stage, state, err),
        );
        let page = match attempted.result {
            Ok(page) => page,
            Err(error) => return self.fail(stage, attempted.state, error),
        };
        self.emit(
            "stage_completed",
            json!({
                "stage": stage.as_str(),
                "attempts": attempted.state.attempt,
                "output_chars": page.as_str().chars().count(),
            }),
        );

        let warnings: Vec<String> = missing_page_markers(page.as_str())
            .into_iter()
            .map(|marker| format!("generated page is missing {marker}"))
            .collect();
        if !warnings.is_empty() {
            self.emit("page_warnings", json!({ "warnings": warnings }));
        }
        PipelineOutcome::Synthesis(SynthesisResult {
            page,
            extraction_attempts: extraction.attempts,
            synthesis_attempts: attempted.state.attempt,
            warnings,
        })
    }

    fn fail(&self, stage: Stage, state: RetryState, error: anyhow::Error) -> PipelineOutcome {
        self.emit(
            "stage_failed",
            json!({
                "stage": stage.as_str(),
                "attempts": state.attempt,
                "error": format!("{error:#}"),
            }),
        );
        PipelineOutcome::Failure(PipelineFailure {
            stage,
            attempts: state.attempt,
            error,
        })
    }

    fn emit_stage_started(&self, stage: Stage, images: usize) {
        self.emit(
            "stage_started",
            json!({ "stage": stage.as_str(), "images": images }),
        );
    }

    fn emit_retry(&self, stage: Stage, state: &RetryState, err: &anyhow::Error) {
        self.emit(
            "stage_retry",
            json!({
                "stage": stage.as_str(),
                "attempt": state.attempt,
                "max_attempts": state.max_attempts,
                "backoff_s": self.backoff.as_secs_f64(),
                "error": err.to_string(),
            }),
        );
    }

    fn emit(&self, event_type: &str, payload: Value) {
        let payload: EventPayload = match payload {
            Value::Object(map) => map,
            _ => EventPayload::new(),
        };
        if let Err(err) = self.events.emit(event_type, payload) {
            self.event_log_errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("failed to record {event_type} event: {err:#}"));
        }
    }
}

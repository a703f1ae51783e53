//! Screenshot-to-demo generation: design extraction followed by page
//! synthesis against a multimodal model, with the clickthrough widget wired
//! into the returned HTML.

mod attachment;
mod client;
mod config;
mod dryrun;
mod gemini;
mod invoker;
mod pipeline;
mod prompts;
mod stages;

#[cfg(test)]
mod testing;

pub use attachment::{GenerationRequest, ImageAttachment, RequestPart, ATTACHMENT_MEDIA_TYPE};
pub use client::{
    client_from_config, default_client_registry, is_overload_error, ClientRegistry,
    GenerationClient, ModelCallError,
};
pub use config::{EngineConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
pub use dryrun::DryrunClient;
pub use gemini::GeminiClient;
pub use invoker::{Attempted, RetryState, RetryingInvoker, MAX_ATTEMPTS};
pub use pipeline::{
    ExtractionResult, Pipeline, PipelineFailure, PipelineInputs, PipelineOutcome, SynthesisResult,
};
pub use prompts::{synthesis_instruction, DESIGN_EXTRACTION_INSTRUCTION};
pub use stages::{
    extract, extraction_request, sanitize_fenced_html, synthesis_request, synthesize,
    DesignSystemDescription, RenderedPage, Stage,
};

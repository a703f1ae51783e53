use std::fmt;

use clickdemo_contracts::widget::{render_widget, WidgetConfig};

use crate::attachment::{GenerationRequest, ImageAttachment};
use crate::invoker::{Attempted, RetryState, RetryingInvoker};
use crate::prompts::{synthesis_instruction, DESIGN_EXTRACTION_INSTRUCTION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extraction,
    Synthesis,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Extraction => "extraction",
            Stage::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unparsed style summary returned by the extraction stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignSystemDescription(String);

impl DesignSystemDescription {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage(String);

impl RenderedPage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn extraction_request(
    main: ImageAttachment,
    contexts: impl IntoIterator<Item = ImageAttachment>,
) -> GenerationRequest {
    GenerationRequest::new(DESIGN_EXTRACTION_INSTRUCTION)
        .with_image(main)
        .with_images(contexts)
}

pub fn synthesis_request(
    main: ImageAttachment,
    design_system: &DesignSystemDescription,
    widget: &WidgetConfig,
) -> GenerationRequest {
    let snippet = render_widget(widget);
    GenerationRequest::new(synthesis_instruction(design_system.as_str(), &snippet)).with_image(main)
}

pub fn extract(
    invoker: &RetryingInvoker<'_>,
    main: ImageAttachment,
    contexts: impl IntoIterator<Item = ImageAttachment>,
    on_retry: impl FnMut(&RetryState, &anyhow::Error),
) -> Attempted<DesignSystemDescription> {
    let request = extraction_request(main, contexts);
    invoker
        .invoke(&request, RetryState::new(), on_retry)
        .map(DesignSystemDescription::new)
}

pub fn synthesize(
    invoker: &RetryingInvoker<'_>,
    main: ImageAttachment,
    design_system: &DesignSystemDescription,
    widget: &WidgetConfig,
    on_retry: impl FnMut(&RetryState, &anyhow::Error),
) -> Attempted<RenderedPage> {
    let request = synthesis_request(main, design_system, widget);
    invoker
        .invoke(&request, RetryState::new(), on_retry)
        .map(|raw| RenderedPage(sanitize_fenced_html(&raw)))
}

/// Drops markdown code fences ("```html" and bare "```", each with an
/// optional trailing newline) wherever they occur, then trims.
pub fn sanitize_fenced_html(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let stripped = strip_fences_once(&text);
        if stripped == text {
            break;
        }
        text = stripped;
    }
    text.trim().to_string()
}

fn strip_fences_once(text: &str) -> String {
    text.replace("```html\n", "")
        .replace("```html", "")
        .replace("```\n", "")
        .replace("```", "")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clickdemo_contracts::region::RegionCode;

    use super::*;
    use crate::attachment::RequestPart;
    use crate::testing::ScriptedClient;

    fn image(tag: &str) -> ImageAttachment {
        ImageAttachment::from_bytes(tag.as_bytes().to_vec())
    }

    #[test]
    fn extraction_attaches_main_then_contexts_in_caller_order() {
        for count in 0..=5usize {
            let contexts: Vec<ImageAttachment> =
                (1..=count).map(|idx| image(&format!("C{idx}"))).collect();
            let request = extraction_request(image("M"), contexts);

            let mut expected = vec!["M".to_string()];
            expected.extend((1..=count).map(|idx| format!("C{idx}")));
            let actual: Vec<String> = request
                .images()
                .map(|img| String::from_utf8_lossy(img.bytes()).to_string())
                .collect();
            assert_eq!(actual, expected);
            assert!(matches!(request.parts()[0], RequestPart::Text(_)));
            assert_eq!(request.instruction(), DESIGN_EXTRACTION_INSTRUCTION);
        }
    }

    #[test]
    fn synthesis_sends_only_the_main_image() {
        let widget = WidgetConfig::new("abc-123", RegionCode::Eu).unwrap();
        let design = DesignSystemDescription::new("colors: primary #112233");
        let request = synthesis_request(image("M"), &design, &widget);

        assert_eq!(request.parts().len(), 2);
        assert_eq!(request.images().count(), 1);
        assert!(request.instruction().contains("colors: primary #112233"));
        assert!(request.instruction().contains("abc-123"));
    }

    #[test]
    fn region_base_url_is_the_only_one_in_the_instruction() {
        let design = DesignSystemDescription::new("flat");
        for region in RegionCode::ALL {
            let widget = WidgetConfig::new("abc-123", region).unwrap();
            let instruction = synthesis_request(image("M"), &design, &widget)
                .instruction()
                .to_string();
            assert!(instruction.contains(&format!("baseUrl: \"{}\"", region.base_url())));
            for other in RegionCode::ALL.into_iter().filter(|other| *other != region) {
                assert!(!instruction.contains(other.base_url()));
            }
        }
    }

    #[test]
    fn extract_passes_model_text_through_unchanged() {
        let client = ScriptedClient::new();
        client.push_ok("  ```not json at all\n");
        let invoker = RetryingInvoker::new(&client, Duration::ZERO);

        let outcome = extract(&invoker, image("M"), vec![image("C1")], |_, _| {});
        assert_eq!(
            outcome.result.unwrap().as_str(),
            "  ```not json at all\n"
        );
        assert_eq!(outcome.state.attempt, 1);
    }

    #[test]
    fn synthesize_strips_fences_from_the_response() {
        let client = ScriptedClient::new();
        client.push_ok("```html\n<!DOCTYPE html>\n<html></html>\n```\n");
        let invoker = RetryingInvoker::new(&client, Duration::ZERO);
        let widget = WidgetConfig::new("abc-123", RegionCode::Us).unwrap();

        let outcome = synthesize(
            &invoker,
            image("M"),
            &DesignSystemDescription::new("flat"),
            &widget,
            |_, _| {},
        );
        assert_eq!(
            outcome.result.unwrap().as_str(),
            "<!DOCTYPE html>\n<html></html>"
        );
    }

    #[test]
    fn sanitize_removes_fences_anywhere() {
        assert_eq!(
            sanitize_fenced_html("Here you go:\n```html\n<p>a</p>\n```\n```\n<p>b</p>```"),
            "Here you go:\n<p>a</p>\n<p>b</p>"
        );
        assert_eq!(sanitize_fenced_html("```html<p>x</p>```"), "<p>x</p>");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "<!DOCTYPE html><html></html>",
            "  ```html\n<div>x</div>\n```  ",
            "``` ```html\n` nested",
            "``````html\n`",
            "",
        ];
        for sample in samples {
            let once = sanitize_fenced_html(sample);
            assert_eq!(sanitize_fenced_html(&once), once, "sample {sample:?}");
        }
        let clean = "<!DOCTYPE html>\n<body>`code`</body>";
        assert_eq!(sanitize_fenced_html(clean), clean);
    }
}

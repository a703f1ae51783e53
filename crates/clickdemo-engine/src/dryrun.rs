use anyhow::Result;
use clickdemo_contracts::widget::{
    EMAIL_INPUT_ID, SUBMIT_BUTTON_ID, WIDGET_CONTAINER_ID, WIDGET_LOADER_URL,
};
use sha2::{Digest, Sha256};

use crate::attachment::GenerationRequest;
use crate::client::GenerationClient;
use crate::prompts::DESIGN_SYSTEM_HEADING;

/// Offline client. Answers extraction requests with a palette derived from
/// the attached images and synthesis requests with a fenced page that
/// carries the widget markup found in the instruction.
pub struct DryrunClient {
    model: String,
}

impl DryrunClient {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }

    fn palette(request: &GenerationRequest) -> [String; 3] {
        let mut hasher = Sha256::new();
        for image in request.images() {
            hasher.update(image.bytes());
        }
        let digest = hasher.finalize();
        [
            format!("#{}", hex::encode(&digest[0..3])),
            format!("#{}", hex::encode(&digest[3..6])),
            format!("#{}", hex::encode(&digest[6..9])),
        ]
    }

    fn design_system(request: &GenerationRequest) -> String {
        let [primary, secondary, accent] = Self::palette(request);
        format!(
            "{{\n  \"colors\": {{ \"primary\": \"{primary}\", \"secondary\": \"{secondary}\", \"accent\": \"{accent}\", \"background\": \"#ffffff\", \"text\": \"#1f2937\" }},\n  \"typography\": {{ \"fontFamily\": \"Inter, Arial, sans-serif\", \"bodySize\": \"16px\" }},\n  \"spacing\": {{ \"small\": \"8px\", \"medium\": \"16px\", \"large\": \"32px\" }},\n  \"components\": {{ \"borderRadius\": \"8px\" }},\n  \"sampledImages\": {}\n}}",
            request.images().count()
        )
    }

    fn page(request: &GenerationRequest) -> String {
        let instruction = request.instruction();
        let loader = line_containing(instruction, WIDGET_LOADER_URL).unwrap_or_default();
        let container = line_containing(instruction, &format!("<div id=\"{WIDGET_CONTAINER_ID}\""))
            .unwrap_or_default();
        let script = slice_between(instruction, "<script>\nwindow.addEventListener", "</script>")
            .unwrap_or_default();
        let [primary, _, accent] = Self::palette(request);
        format!(
            "```html\n<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Demo</title>\n<style>\n:root {{ --primary: {primary}; --accent: {accent}; --text-muted: #6b7280; --border-color: #e5e7eb; --border-radius: 8px; --background-subtle: #f9fafb; --success-color: #16a34a; }}\nbody {{ font-family: Inter, Arial, sans-serif; margin: 0; padding: 32px; }}\n#{SUBMIT_BUTTON_ID} {{ background: var(--primary); color: #fff; border: 0; border-radius: var(--border-radius); padding: 12px 24px; }}\n</style>\n{loader}\n</head>\n<body>\n<form>\n<input id=\"{EMAIL_INPUT_ID}\" type=\"email\" placeholder=\"you@example.com\">\n{container}\n<button id=\"{SUBMIT_BUTTON_ID}\" type=\"submit\">Continue</button>\n</form>\n{script}\n</body>\n</html>\n```\n"
        )
    }
}

impl GenerationClient for DryrunClient {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate_text(&self, request: &GenerationRequest) -> Result<String> {
        if request.instruction().contains(DESIGN_SYSTEM_HEADING) {
            return Ok(Self::page(request));
        }
        Ok(Self::design_system(request))
    }
}

fn line_containing<'a>(text: &'a str, needle: &str) -> Option<&'a str> {
    text.lines().find(|line| line.contains(needle)).map(str::trim)
}

fn slice_between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)?;
    let to = text[from..].find(end)? + from + end.len();
    Some(&text[from..to])
}

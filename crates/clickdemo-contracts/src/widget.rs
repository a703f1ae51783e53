use crate::region::RegionCode;

pub const WIDGET_LOADER_URL: &str = "https://sdk.example-region.com/clickwrap/v1/sdk.js";
pub const WIDGET_CONTAINER_ID: &str = "clickthrough-container";
pub const WIDGET_LOADED_EVENT: &str = "clickthroughLoaded";
pub const SUBMIT_BUTTON_ID: &str = "submit-btn";
pub const EMAIL_INPUT_ID: &str = "email-input";

const MAX_CONTRACT_ID_CHARS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetConfigError {
    #[error("contract id is empty")]
    EmptyContractId,
    #[error("contract id exceeds 256 characters")]
    ContractIdTooLong,
    #[error("contract id contains control characters")]
    ControlCharacters,
    #[error("contract id has leading or trailing whitespace")]
    SurroundingWhitespace,
}

/// Parameters injected into the clickthrough widget bootstrap script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    contract_id: String,
    region: RegionCode,
}

impl WidgetConfig {
    pub fn new(contract_id: &str, region: RegionCode) -> Result<Self, WidgetConfigError> {
        if contract_id.trim().is_empty() {
            return Err(WidgetConfigError::EmptyContractId);
        }
        if contract_id.trim() != contract_id {
            return Err(WidgetConfigError::SurroundingWhitespace);
        }
        if contract_id.chars().count() > MAX_CONTRACT_ID_CHARS {
            return Err(WidgetConfigError::ContractIdTooLong);
        }
        if contract_id.chars().any(char::is_control) {
            return Err(WidgetConfigError::ControlCharacters);
        }
        Ok(Self {
            contract_id: contract_id.to_string(),
            region,
        })
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn region(&self) -> RegionCode {
        self.region
    }

    pub fn base_url(&self) -> &'static str {
        self.region.base_url()
    }
}

/// The three pieces of markup the generated page has to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSnippet {
    pub loader_tag: String,
    pub container: String,
    pub bootstrap_script: String,
}

const LOADER_TAG_TEMPLATE: &str = r#"<script type="module" src="__LOADER_URL__"></script>"#;

const CONTAINER_TEMPLATE: &str = r#"<div id="__CONTAINER_ID__" style="margin: 10px 0; padding: 8px; font-size: 12px; color: var(--text-muted); border: 1px solid var(--border-color); border-radius: var(--border-radius); background: var(--background-subtle);"></div>"#;

const BOOTSTRAP_TEMPLATE: &str = r#"<script>
window.addEventListener(__LOADED_EVENT__, function () {
  try {
    const clickthrough = new ClickthroughWidget({
      clickwrapId: __CLICKWRAP_ID__,
      hostLocationDomId: __CONTAINER_ID__,
      baseUrl: __BASE_URL__
    });
    clickthrough.init();

    const submitBtn = document.getElementById(__SUBMIT_ID__) ||
                     document.querySelector('button[type="submit"]') ||
                     document.querySelector('button');

    if (submitBtn) {
      const originalOnclick = submitBtn.onclick;

      submitBtn.onclick = function (e) {
        e.preventDefault();

        const emailInput = document.getElementById(__EMAIL_ID__) ||
                          document.querySelector('input[type="email"]') ||
                          document.querySelector('input[name="email"]') ||
                          document.querySelector('input[type="text"]');

        const emailValue = emailInput ? emailInput.value : "demo@example.com";

        const originalText = submitBtn.textContent;
        submitBtn.textContent = "Processing...";
        submitBtn.disabled = true;

        clickthrough.submit({
          user_identifier: emailValue,
          first_name: "Demo",
          last_name: "User",
          user_email: emailValue
        }).then(contractData => {
          submitBtn.textContent = "✓ Success!";
          submitBtn.style.backgroundColor = "var(--success-color)";

          setTimeout(() => {
            alert("Terms accepted and contract created!\n\nContract ID: " + contractData.id);
            console.log("Contract Data:", contractData);

            submitBtn.textContent = originalText;
            submitBtn.disabled = false;
            submitBtn.style.backgroundColor = "";

            if (originalOnclick) originalOnclick.call(this, e);
          }, 1500);
        }).catch(error => {
          console.error("Clickthrough Error:", error);
          alert("Demo: Terms acceptance simulated\n\nError: " + error.message);

          submitBtn.textContent = originalText;
          submitBtn.disabled = false;
        });
      };
    }

    console.log("Clickthrough initialized successfully");
  } catch (error) {
    console.error("Failed to initialize Clickthrough:", error);
  }
});
</script>"#;

/// Single injection point for widget parameters. Every interpolated value is
/// emitted as an escaped JavaScript string literal.
pub fn render_widget(config: &WidgetConfig) -> WidgetSnippet {
    let loaded_event = js_string_literal(WIDGET_LOADED_EVENT);
    let clickwrap_id = js_string_literal(config.contract_id());
    let container_id = js_string_literal(WIDGET_CONTAINER_ID);
    let base_url = js_string_literal(config.base_url());
    let submit_id = js_string_literal(SUBMIT_BUTTON_ID);
    let email_id = js_string_literal(EMAIL_INPUT_ID);
    WidgetSnippet {
        loader_tag: fill_template(LOADER_TAG_TEMPLATE, &[("__LOADER_URL__", WIDGET_LOADER_URL)]),
        container: fill_template(
            CONTAINER_TEMPLATE,
            &[("__CONTAINER_ID__", WIDGET_CONTAINER_ID)],
        ),
        bootstrap_script: fill_template(
            BOOTSTRAP_TEMPLATE,
            &[
                ("__LOADED_EVENT__", loaded_event.as_str()),
                ("__CLICKWRAP_ID__", clickwrap_id.as_str()),
                ("__CONTAINER_ID__", container_id.as_str()),
                ("__BASE_URL__", base_url.as_str()),
                ("__SUBMIT_ID__", submit_id.as_str()),
                ("__EMAIL_ID__", email_id.as_str()),
            ],
        ),
    }
}

/// Substitutes placeholders in one left-to-right pass. Inserted values are
/// never scanned again.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter_map(|&(placeholder, value)| {
                rest.find(placeholder).map(|at| (at, placeholder, value))
            })
            .min_by_key(|&(at, _, _)| at);
        match next {
            Some((at, placeholder, value)) => {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + placeholder.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Quoted literal safe to place inside an inline `<script>` block.
pub fn js_string_literal(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Markers the widget wiring depends on that are absent from `html`. The
/// container and the submit control must be present as element ids; the
/// bootstrap script mentioning them does not count.
pub fn missing_page_markers(html: &str) -> Vec<&'static str> {
    let lowered = html.to_ascii_lowercase();
    let mut missing = Vec::new();
    if !lowered.trim_start().starts_with("<!doctype html") {
        missing.push("<!DOCTYPE html>");
    }
    if !html.contains(WIDGET_LOADER_URL) {
        missing.push("widget loader script");
    }
    if !has_id_attribute(&lowered, WIDGET_CONTAINER_ID) {
        missing.push("widget container");
    }
    if !has_id_attribute(&lowered, SUBMIT_BUTTON_ID) {
        missing.push("submit-btn control");
    }
    missing
}

fn has_id_attribute(lowered_html: &str, id: &str) -> bool {
    lowered_html.contains(&format!("id=\"{id}\"")) || lowered_html.contains(&format!("id='{id}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_config_rejects_unusable_contract_ids() {
        assert_eq!(
            WidgetConfig::new("   ", RegionCode::Eu),
            Err(WidgetConfigError::EmptyContractId)
        );
        assert_eq!(
            WidgetConfig::new("abc\n123", RegionCode::Eu),
            Err(WidgetConfigError::ControlCharacters)
        );
        assert_eq!(
            WidgetConfig::new(&"x".repeat(MAX_CONTRACT_ID_CHARS + 1), RegionCode::Eu),
            Err(WidgetConfigError::ContractIdTooLong)
        );
        assert_eq!(
            WidgetConfig::new(" abc-123 ", RegionCode::Us),
            Err(WidgetConfigError::SurroundingWhitespace)
        );
        let config = WidgetConfig::new("abc-123", RegionCode::Us).unwrap();
        assert_eq!(config.contract_id(), "abc-123");
        assert_eq!(config.base_url(), "https://api.us.example-region.com/");
    }

    #[test]
    fn bootstrap_script_embeds_contract_and_region_url() {
        for region in RegionCode::ALL {
            let config = WidgetConfig::new("abc-123", region).unwrap();
            let snippet = render_widget(&config);
            let expected = format!("baseUrl: \"{}\"", region.base_url());
            assert!(snippet.bootstrap_script.contains(&expected));
            assert!(snippet
                .bootstrap_script
                .contains("clickwrapId: \"abc-123\""));
            for other in RegionCode::ALL.into_iter().filter(|other| *other != region) {
                assert!(!snippet.bootstrap_script.contains(other.base_url()));
            }
        }
    }

    #[test]
    fn rendered_templates_leave_no_placeholders() {
        let config = WidgetConfig::new("abc-123", RegionCode::In).unwrap();
        let snippet = render_widget(&config);
        for piece in [
            &snippet.loader_tag,
            &snippet.container,
            &snippet.bootstrap_script,
        ] {
            assert!(!piece.contains("__"), "placeholder left in {piece}");
        }
        assert!(snippet.loader_tag.contains(WIDGET_LOADER_URL));
        assert!(snippet
            .container
            .starts_with("<div id=\"clickthrough-container\""));
    }

    #[test]
    fn contract_id_cannot_break_out_of_the_script() {
        let config = WidgetConfig::new("\"});</script><script>alert(1)", RegionCode::Eu).unwrap();
        let snippet = render_widget(&config);
        assert!(!snippet.bootstrap_script.contains("</script><script>"));
        assert!(snippet
            .bootstrap_script
            .contains(r#"clickwrapId: "\"});<\/script><script>alert(1)""#));
    }

    #[test]
    fn missing_markers_reports_what_the_page_lacks() {
        let config = WidgetConfig::new("abc-123", RegionCode::Eu).unwrap();
        let snippet = render_widget(&config);
        let complete = format!(
            "<!DOCTYPE html><html><head>{}</head><body><button id=\"submit-btn\">Go</button>{}{}</body></html>",
            snippet.loader_tag, snippet.container, snippet.bootstrap_script
        );
        assert!(missing_page_markers(&complete).is_empty());
        assert_eq!(
            missing_page_markers("<html><body></body></html>"),
            vec![
                "<!DOCTYPE html>",
                "widget loader script",
                "widget container",
                "submit-btn control"
            ]
        );
    }

    #[test]
    fn placeholder_text_in_contract_id_is_not_substituted_again() {
        for contract_id in ["__BASE_URL__", "__CLICKWRAP_ID__", "x__SUBMIT_ID__y"] {
            let config = WidgetConfig::new(contract_id, RegionCode::Eu).unwrap();
            let script = render_widget(&config).bootstrap_script;
            assert!(
                script.contains(&format!("clickwrapId: \"{contract_id}\",")),
                "contract id rewritten in {script}"
            );
            assert_eq!(
                script.matches("https://api.eu.example-region.com/").count(),
                1
            );
            assert!(script.contains("baseUrl: \"https://api.eu.example-region.com/\""));
            assert!(script.contains("getElementById(\"submit-btn\")"));
        }
    }

    #[test]
    fn copied_script_alone_does_not_satisfy_container_or_button() {
        let config = WidgetConfig::new("abc-123", RegionCode::Eu).unwrap();
        let snippet = render_widget(&config);
        let page = format!(
            "<!DOCTYPE html><html><head>{}</head><body><p>No form here</p>{}</body></html>",
            snippet.loader_tag, snippet.bootstrap_script
        );
        assert_eq!(
            missing_page_markers(&page),
            vec!["widget container", "submit-btn control"]
        );

        let single_quoted = page.replace(
            "<p>No form here</p>",
            "<div id='clickthrough-container'></div><button id='submit-btn'>Go</button>",
        );
        assert!(missing_page_markers(&single_quoted).is_empty());
    }
}

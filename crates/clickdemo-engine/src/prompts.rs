use clickdemo_contracts::widget::{WidgetSnippet, EMAIL_INPUT_ID, SUBMIT_BUTTON_ID};

/// Heading that opens the design-system section of the synthesis instruction.
pub const DESIGN_SYSTEM_HEADING: &str = "DESIGN SYSTEM TO FOLLOW EXACTLY:";

pub const DESIGN_EXTRACTION_INSTRUCTION: &str = r##"You are an expert design-system analyst with a precise eye for color. Study the attached images and extract the complete visual language they share.

GOAL: produce a design-system specification detailed enough to rebuild the page pixel for pixel.

EXTRACT:

1. COLOR PALETTE (be exact):
   - primary, secondary and accent colors (hex values where possible)
   - background colors, including light and dark variants
   - text colors: primary, secondary, muted
   - border colors
   - button colors for default, hover and active states
   - link colors

2. TYPOGRAPHY:
   - font families in use (name them if recognizable: Inter, Roboto, Helvetica, Arial, ...)
   - font weights
   - heading sizes (H1, H2, H3) and body text size
   - letter spacing and line heights

3. SPACING & LAYOUT:
   - margin and padding scales (small, medium, large)
   - grid system, if one is visible
   - container max-widths
   - spacing between sections

4. COMPONENT STYLES:
   - buttons: border-radius, padding, shadows
   - input fields: borders, focus states, padding
   - cards and containers
   - shadow patterns, border styles and thickness

5. DESIGN PERSONALITY:
   - overall aesthetic (minimal, bold, corporate, playful, ...)
   - corner rounding preference (sharp, slightly rounded, very rounded)
   - shadow usage (none, subtle, prominent)
   - color temperature (warm, cool, neutral)

RETURN FORMAT: a detailed JSON-like specification with exact values, for example:
{
  "colors": {
    "primary": "#3B82F6",
    "secondary": "#64748B",
    "background": "#FFFFFF",
    "text": "#1F2937"
  },
  "typography": {
    "fontFamily": "Inter, Arial, sans-serif",
    "headingWeight": "600",
    "bodySize": "16px"
  },
  "spacing": {
    "small": "8px",
    "medium": "16px",
    "large": "32px"
  },
  "components": {
    "borderRadius": "8px",
    "buttonPadding": "12px 24px",
    "shadow": "0 4px 6px rgba(0,0,0,0.1)"
  }
}

Be as specific as possible about colors, sizes and measurements: this specification will be used to recreate the exact aesthetic."##;

/// Second-stage instruction: the extracted design system plus the widget
/// markup that must be carried into the page verbatim.
pub fn synthesis_instruction(design_system: &str, widget: &WidgetSnippet) -> String {
    format!(
        r#"You are an expert frontend developer. Recreate the attached screenshot as precisely as possible using the design system below.

{DESIGN_SYSTEM_HEADING}
{design_system}

PRIORITIES:
1. Use the exact colors, fonts, spacing and component styles from the design system
2. Match the screenshot pixel for pixel
3. Apply the design system consistently across the page
4. Produce a complete, working HTML page

IMPLEMENTATION REQUIREMENTS:
1. A complete document with <!DOCTYPE html>, <html>, <head> and <body>
2. All CSS inline in the document - no external stylesheets
3. Declare the design-system values as CSS custom properties (including --text-muted, --border-color, --border-radius, --background-subtle and --success-color)
4. Responsive layout with modern CSS (flexbox/grid)
5. Working form controls with these ids:
   - id="{EMAIL_INPUT_ID}" on the email field
   - id="{SUBMIT_BUTTON_ID}" on the main call-to-action button
6. Placeholder text copied exactly from the screenshot

CLICKTHROUGH WIDGET INTEGRATION:
Place the widget naturally in the page flow, above or next to the main call to action. Copy the markup below exactly.

Before </head>:
{loader_tag}

In the body (positioned naturally):
{container}

Before </body>:
{bootstrap_script}

RETURN: only the complete HTML document - no markdown, no explanations.
The result must look identical to the screenshot while following the design system above."#,
        loader_tag = widget.loader_tag,
        container = widget.container,
        bootstrap_script = widget.bootstrap_script,
    )
}

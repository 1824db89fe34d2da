//! Message Renderer
//!
//! Turns the operator's message template into the HTML fragment sent to one
//! contact. Rendering is pure: the same template, fields and image markup
//! always give the same output.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Attachment;

pub const NAME_TOKEN: &str = "{{name}}";
pub const NUMBER_TOKEN: &str = "{{number}}";
pub const IMAGE_TOKEN: &str = "{{image}}";

/// Style block placed in front of every message
pub const BASE_STYLE: &str = r#"<style>
  body { font-family: Arial, sans-serif; font-size: 14px; }
  p { margin: 6px 0 !important; line-height: 1.4; }
  ul { margin: 6px 0 10px 20px; }
  li { margin-bottom: 4px; }
  img { display: block; margin: 10px 0; max-width: 100%; }
</style>"#;

static BLANK_LINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\n\s*){2,}").expect("blank line pattern compiles"));

/// Substitute the first `{{name}}` and the first `{{number}}`.
pub fn personalize(template: &str, name: Option<&str>, number: Option<&str>) -> String {
    template
        .replacen(NAME_TOKEN, name.unwrap_or(""), 1)
        .replacen(NUMBER_TOKEN, number.unwrap_or(""), 1)
}

/// Collapse blank-line runs, then wrap each non-empty trimmed line in `<p>`.
pub fn format_paragraphs(text: &str) -> String {
    let collapsed = BLANK_LINE_RUNS.replace_all(text, "\n");

    collapsed
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>", line))
        .collect()
}

/// `<img>` tags for every inline attachment, in attachment order
pub fn image_tags(attachments: &[Attachment]) -> String {
    attachments
        .iter()
        .map(|attachment| format!(r#"<img src="{}">"#, attachment.cid_url()))
        .collect()
}

/// Replace the first `{{image}}`, if any, with the image markup.
pub fn embed_images(html: &str, images_html: &str) -> String {
    if html.contains(IMAGE_TOKEN) {
        html.replacen(IMAGE_TOKEN, images_html, 1)
    } else {
        html.to_string()
    }
}

/// Full rendering pipeline for one contact
pub fn render_message(
    template: &str,
    name: Option<&str>,
    number: Option<&str>,
    images_html: &str,
) -> String {
    let personalized = personalize(template, name, number);
    let formatted = format_paragraphs(&personalized);
    let body = embed_images(&formatted, images_html);

    format!("{}{}", BASE_STYLE, body)
}

//! Markup and static assets for the floating chat widget

use chatbot_core::{Settings, WidgetPosition};
use html_escape::{encode_double_quoted_attribute, encode_text};

pub const SCRIPT: &str = include_str!("../assets/widget.js");
pub const STYLE: &str = include_str!("../assets/widget.css");

const BUBBLE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="currentColor" width="24" height="24"><path d="M20 2H4c-1.1 0-2 .9-2 2v18l4-4h14c1.1 0 2-.9 2-2V4c0-1.1-.9-2-2-2z"></path></svg>"#;
const SEND_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="currentColor" width="20" height="20"><path d="M2.01 21L23 12 2.01 3 2 10l15 2-15 2z"></path></svg>"#;

/// URLs and token the rendered widget talks back to
pub struct WidgetLinks<'a> {
    pub chat_endpoint: &'a str,
    pub script_url: &'a str,
    pub style_url: &'a str,
    pub nonce: &'a str,
}

/// Render the embeddable fragment: stylesheet, color variables, the bubble
/// and panel, and the script that drives them.
pub fn render(settings: &Settings, links: &WidgetLinks<'_>) -> String {
    let position_class = match settings.position() {
        WidgetPosition::Left => "chatbot-position-left",
        WidgetPosition::Right => "",
    };

    format!(
        r#"<link rel="stylesheet" href="{style_url}">
<style>:root {{ --chatbot-primary-color: {primary}; --chatbot-title-color: {title_color}; }}</style>
<div id="ai-chatbot-container" class="{position_class}" data-endpoint="{endpoint}" data-nonce="{nonce}">
  <div id="ai-chatbot-bubble">{BUBBLE_ICON}</div>
  <div id="ai-chatbot-widget" class="hidden">
    <div id="ai-chatbot-header">
      <h3>{title}</h3>
      <button id="ai-chatbot-close" type="button" aria-label="Close">&times;</button>
    </div>
    <div id="ai-chatbot-messages"></div>
    <div id="ai-chatbot-input-container">
      <input type="text" id="ai-chatbot-input" placeholder="Type your message...">
      <button id="ai-chatbot-send" type="button" aria-label="Send">{SEND_ICON}</button>
    </div>
  </div>
</div>
<script src="{script_url}" defer></script>
"#,
        style_url = encode_double_quoted_attribute(links.style_url),
        primary = settings.primary_color(),
        title_color = settings.title_color(),
        endpoint = encode_double_quoted_attribute(links.chat_endpoint),
        nonce = encode_double_quoted_attribute(links.nonce),
        title = encode_text(settings.title()),
        script_url = encode_double_quoted_attribute(links.script_url),
    )
}

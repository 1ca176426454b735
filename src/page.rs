//! HTML served to browsers.

const INDEX_TEMPLATE: &str = include_str!("../assets/index.html");

/// Escape text for embedding in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The landing page; its script fills in the file list client-side.
pub fn index(clipboard: &str, poll_interval_ms: u64) -> String {
    INDEX_TEMPLATE
        .replace("{{POLL_INTERVAL_MS}}", &poll_interval_ms.to_string())
        .replace("{{CLIPBOARD}}", &escape_html(clipboard))
}

pub fn clipboard_fragment(clipboard: &str) -> String {
    format!(
        "<html>\n<body>\n    <h3>Clipboard</h3>\n    <p>Current Clipboard: {}</p>\n</body>\n</html>",
        escape_html(clipboard)
    )
}

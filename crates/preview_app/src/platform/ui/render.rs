use std::fmt::Write;

use preview_core::{PreviewView, PreviewViewModel};

use super::constants::*;

/// Renders the preview as a self-contained HTML fragment.
pub fn render_html(view: &PreviewViewModel) -> String {
    let mut out = String::new();
    let _ = write!(out, r#"<div class="{CLASS_CONTAINER}">"#);

    match &view.preview {
        PreviewView::Loading { text } => {
            let _ = write!(
                out,
                r#"<div class="{CLASS_LOADING}" role="status"><span class="{CLASS_ICON_LOADER}" aria-hidden="true"></span><p>{}</p></div>"#,
                escape(text)
            );
        }
        PreviewView::Error { message } => {
            let _ = write!(
                out,
                r#"<div class="{CLASS_ERROR}" role="alert"><span class="{CLASS_ICON_ERROR}" aria-hidden="true"></span><span class="{CLASS_DESTRUCTIVE}">{}</span></div>"#,
                escape(message)
            );
        }
        PreviewView::Image {
            src,
            alt,
            width,
            height,
        } => {
            let _ = write!(
                out,
                r#"<img class="{CLASS_IMAGE}" src="{}" alt="{}""#,
                escape(src),
                escape(alt)
            );
            if let (Some(w), Some(h)) = (width, height) {
                let _ = write!(out, r#" width="{w}" height="{h}""#);
            }
            out.push_str(" />");
        }
    }

    out.push_str("</div>");
    out
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

//! Wrapped-file envelope handling
//!
//! Files arrive from the hosting shell as a small XML fragment:
//! `<file><name>...</name><content>BASE64</content></file>`. Only the
//! `content` element matters for decoding; `name` is informational.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decode the raw bytes held in a wrapped-file envelope.
pub fn unpack_bytes(wrapped: &str) -> Result<Vec<u8>> {
    let doc = roxmltree::Document::parse(wrapped).context("Malformed file envelope")?;

    let content = doc
        .root_element()
        .children()
        .find(|node| node.has_tag_name("content"))
        .and_then(|node| node.text())
        .unwrap_or("");

    STANDARD
        .decode(content.trim())
        .context("File content is not valid base64")
}

/// Decode the envelope payload as text, replacing invalid UTF-8 sequences.
pub fn unpack_text(wrapped: &str) -> Result<String> {
    let bytes = unpack_bytes(wrapped)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Wrap raw file bytes the way the hosting shell does.
pub fn pack_file(name: &str, bytes: &[u8]) -> String {
    format!(
        "<file><name>{}</name><content>{}</content></file>",
        name,
        STANDARD.encode(bytes)
    )
}

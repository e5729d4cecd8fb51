use std::io::{Cursor, Read};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{join_units, ExtractError};

const DOCUMENT_XML: &str = "word/document.xml";

fn paragraph_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<empty><w:p(?:\s[^>]*)?/>)|(?P<open><w:p(?:\s[^>]*)?>)|(?P<close></w:p>)").unwrap()
    })
}

fn run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(?P<text>.*?)</w:t>|(?P<tab><w:tab/>)|(?P<br><w:(?:br|cr)(?:\s[^>]*)?/>)|(?P<nested><w:p(?:\s[^>]*)?>|</w:p>)")
            .unwrap()
    })
}

/// Top-level `<w:p>` elements of the document body, in order.
///
/// Paragraphs nest inside text boxes (`w:txbxContent`), so the scan tracks depth and only
/// yields an element once its own closing tag is reached. An unclosed trailing paragraph is
/// dropped.
fn top_level_paragraphs(xml: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for caps in paragraph_tag_re().captures_iter(xml) {
        if let Some(empty) = caps.name("empty") {
            if depth == 0 {
                paragraphs.push(empty.as_str());
            }
        } else if let Some(open) = caps.name("open") {
            if depth == 0 {
                start = open.start();
            }
            depth += 1;
        } else if let Some(close) = caps.name("close") {
            match depth {
                0 => {}
                1 => {
                    depth = 0;
                    paragraphs.push(&xml[start..close.start()]);
                }
                _ => depth -= 1,
            }
        }
    }
    paragraphs
}

/// Extracts text from a DOCX (Office Open XML) document, one line per paragraph.
///
/// Empty paragraphs are kept as empty lines since blank lines delimit resume sections.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::CorruptDocument(format!("not a DOCX archive: {e}")))?;

    let mut xml = Vec::new();
    archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| ExtractError::CorruptDocument(format!("missing {DOCUMENT_XML}: {e}")))?
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::CorruptDocument(format!("unreadable {DOCUMENT_XML}: {e}")))?;

    let xml = String::from_utf8(xml)
        .map_err(|e| ExtractError::CorruptDocument(format!("{DOCUMENT_XML} is not UTF-8: {e}")))?;

    let mut paragraph_count = 0usize;
    let text = join_units(top_level_paragraphs(&xml).into_iter().map(|paragraph| {
        paragraph_count += 1;
        match paragraph_text(paragraph) {
            Ok(text) => Some(text),
            Err(reason) => {
                warn!("Skipping DOCX paragraph {paragraph_count}: {reason}");
                None
            }
        }
    }));

    debug!(
        "Extracted {} chars from {} DOCX paragraphs",
        text.len(),
        paragraph_count
    );
    Ok(text)
}

/// Text of one top-level paragraph. Paragraphs nested in a text box go on their own lines.
fn paragraph_text(paragraph_xml: &str) -> Result<String, String> {
    let mut out = String::new();
    let mut pending_break = false;
    for caps in run_re().captures_iter(paragraph_xml) {
        if caps.name("nested").is_some() {
            pending_break = true;
            continue;
        }
        if pending_break && !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        pending_break = false;

        if let Some(text) = caps.name("text") {
            out.push_str(&unescape_xml(text.as_str())?);
        } else if caps.name("tab").is_some() {
            out.push('\t');
        } else if caps.name("br").is_some() {
            out.push('\n');
        }
    }
    Ok(out)
}

/// Resolves the five predefined XML entities and numeric character references.
fn unescape_xml(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| format!("unterminated entity near '{}'", truncate(after, 12)))?;
        let entity = &after[..semi];

        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid entity '&{entity};'"))?
            }
        };
        out.push(decoded);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

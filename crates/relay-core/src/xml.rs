//! Element text extraction for the small XML documents the gateway exchanges.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("malformed xml: {0}")]
    Syntax(String),
    #[error("malformed xml: {0}")]
    Structure(&'static str),
}

/// Collects the text of the first element matching each of `names`.
///
/// Elements are matched by local name at any depth. Text is kept as sent,
/// whitespace included; an element that is present but empty maps to an
/// empty string. The document must be well-formed and
/// have exactly one root element.
pub fn element_texts<'n>(
    xml: &[u8],
    names: &[&'n str],
) -> Result<HashMap<&'n str, String>, XmlError> {
    let mut reader = Reader::from_reader(xml);

    let mut buf = Vec::new();
    let mut found: HashMap<&'n str, String> = HashMap::new();
    let mut depth = 0usize;
    let mut roots = 0usize;
    // (name, depth) of the element whose text is being collected
    let mut capture: Option<(&'n str, usize)> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| XmlError::Syntax(e.to_string()))?;
        match event {
            Event::Start(start) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
                let local = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                if capture.is_none() {
                    if let Some(name) = unclaimed(names, &found, &local) {
                        found.insert(name, String::new());
                        capture = Some((name, depth));
                    }
                }
            }
            Event::Empty(empty) => {
                if depth == 0 {
                    roots += 1;
                }
                let local = String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();
                if let Some(name) = unclaimed(names, &found, &local) {
                    found.insert(name, String::new());
                }
            }
            Event::End(_) => {
                if matches!(capture, Some((_, d)) if d == depth) {
                    capture = None;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| XmlError::Syntax(e.to_string()))?;
                if depth == 0 {
                    if !value.trim().is_empty() {
                        return Err(XmlError::Structure("text outside the root element"));
                    }
                } else if let Some((name, d)) = capture {
                    if d == depth {
                        if let Some(slot) = found.get_mut(name) {
                            slot.push_str(&value);
                        }
                    }
                }
            }
            Event::CData(data) => {
                if let Some((name, d)) = capture {
                    if d == depth {
                        let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        if let Some(slot) = found.get_mut(name) {
                            slot.push_str(&value);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        if roots > 1 {
            return Err(XmlError::Structure("more than one root element"));
        }
        buf.clear();
    }

    if roots == 0 {
        return Err(XmlError::Structure("no root element"));
    }
    if depth != 0 {
        return Err(XmlError::Structure("unclosed element"));
    }
    Ok(found)
}

fn unclaimed<'n>(
    names: &[&'n str],
    found: &HashMap<&'n str, String>,
    local: &str,
) -> Option<&'n str> {
    names
        .iter()
        .copied()
        .find(|name| *name == local && !found.contains_key(name))
}

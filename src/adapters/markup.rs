//! Minimal markup loader for [`MemoryDocument`].
//!
//! Handles the subset forms are written in: nested elements, quoted/unquoted/bare
//! attributes, void and self-closing tags, comments, `<option>` lists inside
//! `<select>` and `<textarea>` text. It is not an HTML5 parser.

use crate::domain::model::SelectOption;
use crate::utils::error::{BindError, Result};
use regex::Regex;
use std::sync::LazyLock;

use super::memory_dom::{MemoryDocument, MemoryElement, ROOT};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9-]*)((?:\s+[^\s=/>]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*(/?)>"#)
        .expect("markup token pattern")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("markup attribute pattern")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Text content of a markup fragment.
pub fn strip_tags(markup: &str) -> String {
    decode_entities(&TAG.replace_all(markup, ""))
}

fn parse_attributes(raw: &str, element: &mut MemoryElement) {
    for caps in ATTRIBUTE.captures_iter(raw) {
        let name = caps[1].to_string();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| decode_entities(m.as_str()))
            .unwrap_or_default();
        match name.as_str() {
            "id" if !value.trim().is_empty() => element.id = Some(value.trim().to_string()),
            "class" => element.classes = value.split_whitespace().map(str::to_string).collect(),
            "value" => element.value = value.clone(),
            _ => {}
        }
        element.attributes.insert(name, value);
    }
}

impl MemoryDocument {
    pub fn parse(markup: &str) -> Result<Self> {
        let mut doc = MemoryDocument::new();
        let mut open: Vec<usize> = vec![ROOT];
        let mut cursor = 0;

        for caps in TOKEN.captures_iter(markup) {
            let Some(whole) = caps.get(0) else { continue };
            doc.append_content(&open, &markup[cursor..whole.start()]);
            cursor = whole.end();

            let Some(tag) = caps.get(2) else {
                doc.append_content(&open, whole.as_str());
                continue;
            };
            let tag = tag.as_str().to_ascii_lowercase();
            let closing = !caps[1].is_empty();

            if closing {
                let Some(depth) = open.iter().rposition(|&i| i != ROOT && doc.nodes[i].tag == tag) else {
                    return Err(BindError::MarkupError {
                        position: whole.start(),
                        message: format!("unexpected </{}>", tag),
                    });
                };
                for &index in &open[depth..] {
                    doc.finish_element(index);
                }
                open.truncate(depth);
                doc.append_content(&open, whole.as_str());
                continue;
            }

            let mut element = MemoryElement::new(&tag);
            parse_attributes(caps.get(3).map_or("", |m| m.as_str()), &mut element);
            if doc.id_taken(element.id.as_deref()) {
                return Err(BindError::MarkupError {
                    position: whole.start(),
                    message: format!("duplicate id '{}'", element.id.unwrap_or_default()),
                });
            }

            doc.append_content(&open, whole.as_str());
            let parent = *open.last().unwrap_or(&ROOT);
            element.parent = Some(parent);
            let index = doc.nodes.len();
            doc.nodes.push(element);
            doc.nodes[parent].children.push(index);

            let self_closing = !caps[4].is_empty() || VOID_ELEMENTS.contains(&tag.as_str());
            if self_closing {
                doc.finish_element(index);
            } else {
                open.push(index);
            }
        }
        doc.append_content(&open, &markup[cursor..]);

        if let Some(&unclosed) = open.get(1) {
            return Err(BindError::MarkupError {
                position: markup.len(),
                message: format!("unclosed <{}>", doc.nodes[unclosed].tag),
            });
        }
        Ok(doc)
    }

    fn id_taken(&self, id: Option<&str>) -> bool {
        id.is_some_and(|id| self.nodes.iter().any(|n| n.id.as_deref() == Some(id)))
    }

    /// Content is kept as inner markup, so every open ancestor sees it.
    fn append_content(&mut self, open: &[usize], raw: &str) {
        if raw.is_empty() {
            return;
        }
        for &index in open.iter().filter(|&&i| i != ROOT) {
            self.nodes[index].content.push_str(raw);
        }
    }

    /// Applies per-tag semantics once an element's content is complete.
    fn finish_element(&mut self, index: usize) {
        match self.nodes[index].tag.as_str() {
            "textarea" => {
                let text = decode_entities(self.nodes[index].content.trim());
                self.nodes[index].value = text;
            }
            "select" => {
                let option_indices: Vec<usize> = self.nodes[index]
                    .children
                    .iter()
                    .copied()
                    .filter(|&c| self.nodes[c].tag == "option")
                    .collect();
                let mut selected = None;
                let mut options = Vec::new();
                for child in &option_indices {
                    let node = &self.nodes[*child];
                    let text = strip_tags(&node.content).trim().to_string();
                    let value = node
                        .attributes
                        .get("value")
                        .cloned()
                        .unwrap_or_else(|| text.clone());
                    if node.attributes.contains_key("selected") {
                        selected = Some(value.clone());
                    }
                    options.push(SelectOption { value, text });
                }
                let select = &mut self.nodes[index];
                select.children.retain(|c| !option_indices.contains(c));
                select.selected = selected.or_else(|| options.first().map(|o| o.value.clone()));
                select.options = options;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Channel, ElementId};
    use crate::domain::ports::ElementAccess;

    #[test]
    fn test_parse_nested_form() {
        let doc = MemoryDocument::parse(
            r#"
<!-- account form -->
<form id="bound-form">
  <input id="first" type="text" wc="val:FirstName" class="field wide">
  <input wc='val:LastName' disabled />
  <span id="full" wc="text:FullName">Ada <b>L</b></span>
  <textarea id="notes">  hello &amp; bye </textarea>
</form>
<p id="outside" wc="text:FullName"></p>
"#,
        )
        .unwrap();

        let first = doc.element(&ElementId::new("first")).unwrap();
        assert_eq!(first.tag, "input");
        assert_eq!(first.classes, vec!["field", "wide"]);
        assert_eq!(first.attributes["wc"], "val:FirstName");

        assert_eq!(doc.read(&ElementId::new("full"), Channel::Text).unwrap(), "Ada L");
        assert_eq!(doc.read(&ElementId::new("notes"), Channel::Value).unwrap(), "hello & bye");

        let declared = doc.query_declared(&ElementId::new("bound-form"), "wc").unwrap();
        assert_eq!(declared.len(), 3);
        assert_eq!(declared[1].id, None);
        assert_eq!(declared[1].declaration, "val:LastName");
    }

    #[test]
    fn test_parse_select_options() {
        let doc = MemoryDocument::parse(
            r#"<select id="s"><option value="1">Mr</option><option value="2" selected>Mrs</option><option>Other</option></select>"#,
        )
        .unwrap();
        let select = doc.element(&ElementId::new("s")).unwrap();
        assert_eq!(select.options.len(), 3);
        assert_eq!(select.options[2], SelectOption::new("Other", "Other"));
        assert_eq!(doc.read(&ElementId::new("s"), Channel::Value).unwrap(), "2");
    }

    #[test]
    fn test_parse_rejects_unbalanced_markup() {
        assert!(MemoryDocument::parse("<div><span></div>").is_ok());
        assert!(matches!(
            MemoryDocument::parse("<div></span>"),
            Err(BindError::MarkupError { .. })
        ));
        assert!(matches!(
            MemoryDocument::parse("<div><p>"),
            Err(BindError::MarkupError { .. })
        ));
        assert!(matches!(
            MemoryDocument::parse(r#"<i id="a"></i><b id="a"></b>"#),
            Err(BindError::MarkupError { .. })
        ));
    }

    #[test]
    fn test_strip_and_escape() {
        assert_eq!(strip_tags("<em>a</em> &lt;b&gt;"), "a <b>");
        assert_eq!(escape_text("a & <b>"), "a &amp; &lt;b&gt;");
    }
}

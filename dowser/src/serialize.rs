//! HTML5-correct serialization of the arena DOM.
//!
//! - Void elements never get end tags
//! - Text content is escaped; raw text elements (script, style) are not
//! - RCDATA elements (title, textarea) escape only `&` and `<`
//! - Attribute values are escaped and double-quoted

use crate::dom::{Document, NodeId, NodeKind};

/// Options for HTML serialization.
#[derive(Clone, Debug)]
pub struct SerializeOptions {
    /// Whether to emit `<!DOCTYPE ...>` when the document carries one
    /// (default: true).
    pub include_doctype: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            include_doctype: true,
        }
    }
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the DOCTYPE declaration even when the document has one.
    pub fn without_doctype(mut self) -> Self {
        self.include_doctype = false;
        self
    }
}

/// Serialize a whole document, starting at the root element.
pub fn serialize_document(doc: &Document, opts: &SerializeOptions) -> String {
    let mut out = String::new();
    if opts.include_doctype
        && let Some(doctype) = &doc.doctype
    {
        out.push_str("<!DOCTYPE ");
        out.push_str(doctype.as_ref());
        out.push('>');
    }
    write_node(doc, doc.root(), &mut out);
    out
}

/// Serialize a subtree, including the node itself.
pub fn serialize_node(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

/// Serialize the children of a node (its inner HTML).
pub fn serialize_children(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        write_node(doc, child, &mut out);
    }
    out
}

/// HTML5 void elements - these never have end tags.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Raw text elements - content is not escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// RCDATA elements - only `&` and `<` are escaped.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

fn is_rcdata_element(tag: &str) -> bool {
    RCDATA_ELEMENTS.contains(&tag)
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match &doc.get(id).kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_node(doc, child, out);
            }
        }
        NodeKind::Element(elem) => {
            let tag = elem.tag.as_ref();
            out.push('<');
            out.push_str(tag);
            for (name, value) in &elem.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(value.as_ref(), out);
                out.push('"');
            }
            out.push('>');

            if is_void_element(tag) {
                return;
            }

            if is_raw_text_element(tag) {
                for child in doc.children(id) {
                    if let NodeKind::Text(text) = &doc.get(child).kind {
                        out.push_str(text.as_ref());
                    }
                }
            } else if is_rcdata_element(tag) {
                for child in doc.children(id) {
                    if let NodeKind::Text(text) = &doc.get(child).kind {
                        escape_rcdata(text.as_ref(), out);
                    }
                }
            } else {
                for child in doc.children(id) {
                    write_node(doc, child, out);
                }
            }

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeKind::Text(text) => escape_text(text.as_ref(), out),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text.as_ref());
            out.push_str("-->");
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_rcdata(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_roundtrip_simple() {
        let doc = parse("<!DOCTYPE html><html><head></head><body><div>Hello</div></body></html>");
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html><html><head></head><body><div>Hello</div></body></html>"
        );
    }

    #[test]
    fn test_without_doctype() {
        let doc = parse("<!DOCTYPE html><html><head></head><body></body></html>");
        let html = serialize_document(&doc, &SerializeOptions::new().without_doctype());
        assert_eq!(html, "<html><head></head><body></body></html>");
    }

    #[test]
    fn test_escaping() {
        let doc = parse("<html><body><div>&lt;script&gt; &amp; \"quotes\"</div></body></html>");
        let div = doc.select("div").get(0).unwrap();
        assert_eq!(
            serialize_node(&doc, div),
            "<div>&lt;script&gt; &amp; \"quotes\"</div>"
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let doc = parse(r#"<html><body><div title="a &quot;b&quot; <c>"></div></body></html>"#);
        let div = doc.select("div").get(0).unwrap();
        assert_eq!(
            serialize_node(&doc, div),
            "<div title=\"a &quot;b&quot; &lt;c&gt;\"></div>"
        );
    }

    #[test]
    fn test_void_elements() {
        let doc = parse(r#"<html><body><br><img src="x.png"></body></html>"#);
        let body = doc.body().unwrap();
        assert_eq!(
            serialize_children(&doc, body),
            "<br><img src=\"x.png\">"
        );
    }

    #[test]
    fn test_raw_text_not_escaped() {
        let doc = parse("<html><head><script>if (a < b) {}</script></head><body></body></html>");
        let script = doc.select("script").get(0).unwrap();
        assert_eq!(serialize_node(&doc, script), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn test_inner_html() {
        let doc = parse("<html><body><ul><li>1</li><li>2</li></ul></body></html>");
        let ul = doc.select("ul").get(0).unwrap();
        assert_eq!(serialize_children(&doc, ul), "<li>1</li><li>2</li>");
    }
}

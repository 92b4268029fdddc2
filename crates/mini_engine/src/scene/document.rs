//! Parsed scene documents
//!
//! The scene builder never sees XML or RON directly. Both front ends produce
//! the same [`Document`]: an ordered list of top-level [`DocumentNode`]s, each
//! with a tag, attributes and nested elements.
//!
//! A well-formed XML file has exactly one root element, which would hide the
//! "several scene roots" mistake inside an opaque XML error. The XML front
//! end therefore parses the body inside a synthetic wrapper element and
//! reports every top-level element it finds.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

const WRAPPER_TAG: &str = "scene-document";
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// 1-based line and column of an element in its source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPosition {
    /// Line number
    pub line: u32,
    /// Column number (in characters)
    pub column: u32,
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// One document element
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Element tag
    pub tag: String,

    /// Attributes by name
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Nested elements in document order
    #[serde(default)]
    pub children: Vec<DocumentNode>,

    /// Source location, when known
    #[serde(skip)]
    pub position: Option<TextPosition>,
}

impl DocumentNode {
    /// Element with the given tag and nothing else
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a nested element
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Attribute value by name
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Number of elements in this subtree, including `self`
    #[must_use]
    pub fn element_count(&self) -> usize {
        1 + self.children.iter().map(Self::element_count).sum::<usize>()
    }
}

/// A parsed scene document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Top-level elements in document order
    #[serde(default)]
    pub elements: Vec<DocumentNode>,
}

impl Document {
    /// Document with the given top-level elements
    #[must_use]
    pub fn new(elements: Vec<DocumentNode>) -> Self {
        Self { elements }
    }

    /// Parse XML scene text
    ///
    /// A leading byte order mark is skipped; positions are counted after it.
    ///
    /// # Errors
    /// [`roxmltree::Error`] for text that is not well-formed XML.
    pub fn from_xml_str(text: &str) -> Result<Self, roxmltree::Error> {
        let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
        let (prolog, body) = split_prolog(text);
        let open = format!("<{WRAPPER_TAG}>");
        let wrapped = format!("{prolog}{open}{body}</{WRAPPER_TAG}>");

        let xml = roxmltree::Document::parse(&wrapped)?;
        let locator = Locator::new(text, prolog.len(), open.len());
        let elements = xml
            .root_element()
            .children()
            .filter(roxmltree::Node::is_element)
            .map(|node| convert(node, &locator))
            .collect();

        Ok(Self { elements })
    }

    /// Parse RON scene text
    ///
    /// # Errors
    /// [`ron::error::SpannedError`] for text that does not describe a document.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Serialize to pretty RON text
    ///
    /// # Errors
    /// [`ron::Error`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

/// Split off a leading `<?xml ...?>` declaration, which must stay first
fn split_prolog(text: &str) -> (&str, &str) {
    if text.starts_with("<?xml") {
        if let Some(end) = text.find("?>") {
            return text.split_at(end + 2);
        }
    }
    ("", text)
}

fn convert(node: roxmltree::Node<'_, '_>, locator: &Locator) -> DocumentNode {
    DocumentNode {
        tag: node.tag_name().name().to_owned(),
        attributes: node
            .attributes()
            .map(|attr| (attr.name().to_owned(), attr.value().to_owned()))
            .collect(),
        children: node
            .children()
            .filter(roxmltree::Node::is_element)
            .map(|child| convert(child, locator))
            .collect(),
        position: Some(locator.position(node.range().start)),
    }
}

/// Maps byte offsets in the wrapped text back to the original text
struct Locator<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
    prolog_len: usize,
    wrapper_len: usize,
}

impl<'a> Locator<'a> {
    fn new(text: &'a str, prolog_len: usize, wrapper_len: usize) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            text,
            line_starts,
            prolog_len,
            wrapper_len,
        }
    }

    fn position(&self, wrapped_offset: usize) -> TextPosition {
        let offset = if wrapped_offset >= self.prolog_len + self.wrapper_len {
            wrapped_offset - self.wrapper_len
        } else {
            wrapped_offset.min(self.prolog_len)
        };
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self.text.get(line_start..offset).map_or(0, |s| s.chars().count());

        TextPosition {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: u32::try_from(column + 1).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_elements_and_attributes() {
        let doc = Document::from_xml_str(
            r#"<?xml version="1.0"?>
<scene type="scene">
    <!-- a comment -->
    <mesh type="mesh" filename="bunny.obj">
        <float name="scale" value="2"/>
    </mesh>
</scene>"#,
        )
        .unwrap();

        assert_eq!(doc.elements.len(), 1);
        let scene = &doc.elements[0];
        assert_eq!(scene.tag, "scene");
        assert_eq!(scene.attribute("type"), Some("scene"));
        assert_eq!(scene.children.len(), 1);

        let mesh = &scene.children[0];
        assert_eq!(mesh.attribute("filename"), Some("bunny.obj"));
        assert_eq!(mesh.children[0].tag, "float");
        assert_eq!(scene.element_count(), 3);
    }

    #[test]
    fn test_xml_positions_refer_to_original_text() {
        let doc = Document::from_xml_str("<scene type=\"scene\">\n  <mesh type=\"mesh\"/>\n</scene>").unwrap();

        let scene = &doc.elements[0];
        assert_eq!(scene.position, Some(TextPosition { line: 1, column: 1 }));
        assert_eq!(scene.children[0].position, Some(TextPosition { line: 2, column: 3 }));
    }

    #[test]
    fn test_xml_with_prolog_positions() {
        let doc = Document::from_xml_str("<?xml version=\"1.0\"?><scene type=\"scene\"/>").unwrap();
        assert_eq!(doc.elements[0].position, Some(TextPosition { line: 1, column: 22 }));
    }

    #[test]
    fn test_xml_after_byte_order_mark() {
        let doc = Document::from_xml_str("\u{FEFF}<scene type=\"scene\">\n  <mesh type=\"mesh\"/>\n</scene>").unwrap();
        assert_eq!(doc.elements[0].position, Some(TextPosition { line: 1, column: 1 }));
        assert_eq!(doc.elements[0].children[0].position, Some(TextPosition { line: 2, column: 3 }));
    }

    #[test]
    fn test_xml_reports_every_top_level_element() {
        let doc = Document::from_xml_str(r#"<scene type="scene"/><scene type="scene"/>"#).unwrap();
        assert_eq!(doc.elements.len(), 2);

        let doc = Document::from_xml_str("<!-- nothing -->").unwrap();
        assert!(doc.elements.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(Document::from_xml_str("<scene type=\"scene\">").is_err());
    }

    #[test]
    fn test_ron_document() {
        let doc = Document::from_ron_str(
            r#"(
                elements: [
                    (
                        tag: "scene",
                        attributes: {"type": "scene"},
                        children: [
                            (tag: "mesh", attributes: {"type": "mesh", "filename": "bunny.obj"}),
                        ],
                    ),
                ],
            )"#,
        )
        .unwrap();

        let mesh = &doc.elements[0].children[0];
        assert_eq!(mesh.attribute("filename"), Some("bunny.obj"));
        assert_eq!(mesh.position, None);
    }

    #[test]
    fn test_ron_roundtrip_of_built_document() {
        let doc = Document::new(vec![DocumentNode::new("scene")
            .with_attribute("type", "scene")
            .with_child(DocumentNode::new("camera").with_attribute("type", "camera"))]);

        let text = doc.to_ron_string().unwrap();
        assert_eq!(Document::from_ron_str(&text).unwrap(), doc);
    }
}

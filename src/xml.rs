//! Minimal read-only XML tree built on top of quick-xml's event reader.
//!
//! HamQTH responses are small, flat documents, so the whole body is decoded
//! into an owned [`XmlNode`] tree that the response interpreter can walk by
//! tag name. Namespace prefixes are dropped: nodes are keyed by local name.

use crate::error::{HamQthError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

/// One element of a decoded XML document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    tag: String,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Start tag to node; attributes are walked only so quick-xml checks
    /// their syntax and uniqueness
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        for attribute in start.attributes() {
            attribute.map_err(|e| HamQthError::malformed(format!("bad attribute: {}", e)))?;
        }
        Ok(Self::new(String::from_utf8_lossy(start.local_name().as_ref())))
    }

    /// Local tag name of this element
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Character data directly inside this element, untrimmed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Direct child elements in document order
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Text of the first direct child with the given tag
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.child(tag).map(XmlNode::text)
    }

    /// Follow a `/`-separated chain of child tags, e.g. `"session/error"`
    pub fn find(&self, path: &str) -> Option<&XmlNode> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// First element with the given tag anywhere below this one (depth-first)
    pub fn descendant(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find_map(|c| {
            if c.tag == tag {
                Some(c)
            } else {
                c.descendant(tag)
            }
        })
    }
}

/// Decode `text` into a tree rooted at the document element.
///
/// Fails with [`HamQthError::MalformedResponse`] when the document is not
/// well-formed: mismatched or unclosed tags, bad entities, stray content
/// outside the root, or no root element at all.
pub fn parse_xml(text: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if stack.is_empty() && root.is_some() {
                    return Err(HamQthError::malformed("multiple root elements"));
                }
                stack.push(XmlNode::from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                attach(&mut stack, &mut root, XmlNode::from_start(&start)?)?;
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| HamQthError::malformed("closing tag without an open element"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(content)) => {
                let content = content
                    .unescape()
                    .map_err(|e| HamQthError::malformed(e.to_string()))?;
                push_text(&mut stack, &content)?;
            }
            Ok(Event::CData(content)) => {
                let content = content.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&content))?;
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions and doctypes carry no data
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to parse XML response: {}", e);
                return Err(HamQthError::malformed(format!(
                    "{} (at byte {})",
                    e,
                    reader.buffer_position()
                )));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(HamQthError::malformed(format!(
            "unclosed element <{}>",
            open.tag
        )));
    }

    root.ok_or_else(|| HamQthError::malformed("document has no root element"))
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(HamQthError::malformed("multiple root elements")),
    }
    Ok(())
}

fn push_text(stack: &mut [XmlNode], content: &str) -> Result<()> {
    match stack.last_mut() {
        Some(node) => node.text.push_str(content),
        None if content.trim().is_empty() => {}
        None => return Err(HamQthError::malformed("text outside the root element")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let root = parse_xml("<root><child>value</child></root>").unwrap();
        assert_eq!(root.tag(), "root");
        assert_eq!(root.child("child").unwrap().text(), "value");
        assert_eq!(root.child_text("child"), Some("value"));
        assert!(root.child("missing").is_none());
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        let err = parse_xml("<root><child></root>").unwrap_err();
        assert!(matches!(err, HamQthError::MalformedResponse { .. }));
        assert!(err.to_string().contains("XML"));
    }

    #[test]
    fn test_broken_attributes_are_rejected() {
        let err = parse_xml("<HamQTH version=><session/></HamQTH>").unwrap_err();
        assert!(matches!(err, HamQthError::MalformedResponse { .. }));
        assert!(err.to_string().contains("XML"));

        assert!(parse_xml(r#"<HamQTH a="1" a="2"><session/></HamQTH>"#).is_err());
        assert!(parse_xml(r#"<HamQTH><session id="1" id="2"/></HamQTH>"#).is_err());
        assert!(parse_xml(r#"<HamQTH version="2.8"><session/></HamQTH>"#).is_ok());
    }

    #[test]
    fn test_unclosed_and_empty_documents_are_rejected() {
        assert!(parse_xml("<root><child>value</child>").is_err());
        assert!(parse_xml("").is_err());
        assert!(parse_xml("   ").is_err());
        assert!(parse_xml("not xml at all").is_err());
        assert!(parse_xml("<a/><b/>").is_err());
    }

    #[test]
    fn test_namespaces_declaration_and_entities() {
        let doc = r#"<?xml version="1.0"?>
<HamQTH version="2.8" xmlns="https://www.hamqth.com">
  <session>
    <error>Tom &amp; Jerry</error>
    <empty/>
  </session>
</HamQTH>"#;
        let root = parse_xml(doc).unwrap();
        assert_eq!(root.tag(), "HamQTH");
        assert_eq!(root.find("session/error").unwrap().text(), "Tom & Jerry");
        assert_eq!(root.find("session/empty").unwrap().text(), "");
        assert!(root.find("session/missing").is_none());
    }

    #[test]
    fn test_descendant_search_is_depth_first() {
        let root = parse_xml("<a><b><c>deep</c></b><c>shallow</c></a>").unwrap();
        assert_eq!(root.descendant("c").unwrap().text(), "deep");
        assert_eq!(root.child("c").unwrap().text(), "shallow");
    }

    #[test]
    fn test_cdata_is_text() {
        let root = parse_xml("<a><![CDATA[<raw>]]></a>").unwrap();
        assert_eq!(root.text(), "<raw>");
    }
}

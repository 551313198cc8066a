//! Owned XML tree
//!
//! [`XmlElement`] is built from `quick-xml` events and offers the handful
//! of lookups service modules need (find by tag, children, attributes,
//! text). Tag and attribute names are stored without namespace prefixes;
//! `xmlns` declarations keep their full name.

use crate::error::{Result, ServiceError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// An empty element, mostly useful in tests
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    attach(&mut stack, &mut root, element);
                },
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ServiceError::parse("XML end tag without a start tag"))?;
                    attach(&mut stack, &mut root, element);
                },
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                },
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if !stack.is_empty() {
            return Err(ServiceError::parse("XML document ended inside an element"));
        }
        root.ok_or_else(|| ServiceError::parse("XML document has no root element"))
    }

    /// Parse raw bytes, replacing invalid UTF-8
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::parse(&String::from_utf8_lossy(bytes))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let full = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let key = if full.starts_with("xmlns") {
                full
            } else {
                String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned()
            };
            attributes.push((key, attr.unescape_value()?.into_owned()));
        }

        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    /// Local tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Text directly inside this element (whitespace trimmed)
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == tag)
    }

    /// All direct children with the given tag
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == tag)
    }

    /// Text of the first direct child with the given tag
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.child(tag).map(XmlElement::text)
    }

    /// First element with the given tag, depth first, this element included
    pub fn find(&self, tag: &str) -> Option<&XmlElement> {
        if self.name == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(tag))
    }

    /// Every element with the given tag, in document order
    pub fn find_all(&self, tag: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect(tag, &mut found);
        found
    }

    fn collect<'a>(&'a self, tag: &str, found: &mut Vec<&'a XmlElement>) {
        if self.name == tag {
            found.push(self);
        }
        for child in &self.children {
            child.collect(tag, found);
        }
    }

    /// Builder helper: add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder helper: set the text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder helper: append a child
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<registry xmlns="http://hupo.psi.org/psicquic/registry">
  <service>
    <name>IntAct</name>
    <restUrl>https://www.ebi.ac.uk/intact/psicquic/webservices/current/search/</restUrl>
    <active>true</active>
  </service>
  <service>
    <name>MINT &amp; co</name>
    <restUrl><![CDATA[https://mint.example/search/?a=1&b=2]]></restUrl>
    <active>false</active>
  </service>
</registry>"#;

    #[test]
    fn test_parse_and_find() {
        let root = XmlElement::parse(REGISTRY).unwrap();
        assert_eq!(root.name(), "registry");
        assert_eq!(root.attr("xmlns"), Some("http://hupo.psi.org/psicquic/registry"));

        let services = root.find_all("service");
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].child_text("name"), Some("IntAct"));
        assert_eq!(services[1].child_text("name"), Some("MINT & co"));
        assert_eq!(
            services[1].child_text("restUrl"),
            Some("https://mint.example/search/?a=1&b=2")
        );
        assert_eq!(root.find("active").map(XmlElement::text), Some("true"));
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn test_namespace_prefixes_are_stripped() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
            <soap:Body><ns:reply ns:kind="lite">ok</ns:reply><empty flag="1"/></soap:Body>
        </soap:Envelope>"#;
        let root = XmlElement::parse(xml).unwrap();
        assert_eq!(root.name(), "Envelope");
        assert!(root.attr("xmlns:soap").is_some());

        let body = root.child("Body").unwrap();
        assert_eq!(body.children().len(), 2);
        let reply = body.child("reply").unwrap();
        assert_eq!(reply.text(), "ok");
        assert_eq!(reply.attr("kind"), Some("lite"));
        assert_eq!(body.child("empty").and_then(|e| e.attr("flag")), Some("1"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(XmlElement::parse("").is_err());
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<a><b>").is_err());
    }

    #[test]
    fn test_builder_helpers() {
        let element = XmlElement::new("entry")
            .with_attr("dataset", "Swiss-Prot")
            .with_child(XmlElement::new("accession").with_text("P43403"));
        assert_eq!(element.attr("dataset"), Some("Swiss-Prot"));
        assert_eq!(element.child_text("accession"), Some("P43403"));
        assert_eq!(element.children_named("accession").count(), 1);
    }
}

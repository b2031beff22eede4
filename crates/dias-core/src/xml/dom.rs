//! Minimal read-side element tree.
//!
//! The validator and inspector only need element names, attributes and
//! text. Lookups ignore namespace prefixes so `mets:file` and `file` match
//! the same element.

use crate::PackageError;
use crate::Result;
use quick_xml::Reader;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;

/// One parsed element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Qualified name as written, e.g. `mets:file`.
    pub name: String,
    /// Attributes in document order, qualified names as written.
    pub attrs: Vec<(String, String)>,
    /// Child elements.
    pub children: Vec<XmlNode>,
    /// Concatenated, trimmed text content.
    pub text: String,
}

impl XmlNode {
    /// Parses a document and returns its root element.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Xml`] for malformed input or a document
    /// without a root element.
    ///
    /// # Examples
    ///
    /// ```
    /// use dias_core::xml::XmlNode;
    ///
    /// let root = XmlNode::parse(r#"<m:mets TYPE="SIP"><m:metsHdr/></m:mets>"#)?;
    /// assert_eq!(root.local_name(), "mets");
    /// assert_eq!(root.attr("TYPE"), Some("SIP"));
    /// assert!(root.child("metsHdr").is_some());
    /// # Ok::<(), dias_core::PackageError>(())
    /// ```
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Self> = Vec::new();
        let mut root: Option<Self> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(Self::from_start(&e)?),
                Event::Empty(e) => {
                    let node = Self::from_start(&e)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| PackageError::Xml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(t) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(t.unescape()?.trim());
                    }
                }
                Event::CData(t) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(String::from_utf8_lossy(&t.into_inner()).trim());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(PackageError::Xml("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| PackageError::Xml("document has no root element".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Self::default()
        })
    }

    /// Name without namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Attribute value by local name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| local(k) == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with local name `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.local_name() == name)
    }

    /// Direct children with local name `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.local_name() == name)
    }

    /// First descendant (depth-first, excluding self) with local name `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        for child in &self.children {
            if child.local_name() == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with local name `name`, in document order.
    #[must_use]
    pub fn find_all(&self, name: &str) -> Vec<&Self> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a Self>) {
        for child in &self.children {
            if child.local_name() == name {
                found.push(child);
            }
            child.collect(name, found);
        }
    }
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        Ok(())
    } else if root.is_none() {
        *root = Some(node);
        Ok(())
    } else {
        Err(PackageError::Xml(
            "document has more than one root element".to_string(),
        ))
    }
}

fn local(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mets:mets xmlns:mets="http://www.loc.gov/METS/" LABEL="A &amp; B">
    <mets:metsHdr RECORDSTATUS="NEW">
        <mets:agent ROLE="ARCHIVIST"><mets:name>Org</mets:name></mets:agent>
        <mets:agent ROLE="CREATOR"><mets:name>Creator</mets:name></mets:agent>
    </mets:metsHdr>
    <mets:fileSec><mets:fileGrp><mets:file ID="ID1"/></mets:fileGrp></mets:fileSec>
</mets:mets>"#;

    #[test]
    fn test_parse_and_lookup() {
        let root = XmlNode::parse(DOC).unwrap();
        assert_eq!(root.name, "mets:mets");
        assert_eq!(root.attr("LABEL"), Some("A & B"));

        let header = root.child("metsHdr").unwrap();
        let names: Vec<_> = header
            .children_named("agent")
            .map(|a| a.child("name").unwrap().text.as_str())
            .collect();
        assert_eq!(names, vec!["Org", "Creator"]);
        assert_eq!(root.find("file").unwrap().attr("ID"), Some("ID1"));
        assert_eq!(root.find_all("agent").len(), 2);
    }

    #[test]
    fn test_namespaced_attribute_by_local_name() {
        let root = XmlNode::parse(r#"<a xlink:href="file:x"/>"#).unwrap();
        assert_eq!(root.attr("href"), Some("file:x"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(XmlNode::parse("").is_err());
        assert!(XmlNode::parse("<a><b></a>").is_err());
        assert!(XmlNode::parse("<a>").is_err());
        assert!(XmlNode::parse("<a/><b/>").is_err());
    }
}

//! Indented XML output on top of `quick_xml::Writer`.

use crate::Result;
use quick_xml::Writer;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;

/// Builds one UTF-8 document in memory.
///
/// Attributes are written in the order given; attribute values and text
/// are escaped.
pub struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl XmlBuilder {
    /// Starts a document indented by `indent` spaces per level.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration cannot be written.
    pub fn new(indent: usize) -> Result<Self> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(Self { writer })
    }

    /// Opens `name` with `attrs`.
    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for attr in attrs {
            element.push_attribute(*attr);
        }
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    /// Closes `name`.
    pub fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Writes a self-closing `name` with `attrs`.
    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for attr in attrs {
            element.push_attribute(*attr);
        }
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    /// Writes `<name attrs>text</name>`; empty text yields a self-closing tag.
    pub fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        if text.is_empty() {
            return self.empty(name, attrs);
        }
        self.start(name, attrs)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// Writes `<name>text</name>` without attributes.
    pub fn leaf(&mut self, name: &str, text: &str) -> Result<()> {
        self.text_element(name, &[], text)
    }

    /// Finishes the document and returns it as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the output is not valid UTF-8.
    pub fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        Ok(String::from_utf8(bytes)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_document() {
        let mut xml = XmlBuilder::new(2).unwrap();
        xml.start("root", &[("a", "1"), ("b", "2")]).unwrap();
        xml.leaf("child", "text").unwrap();
        xml.empty("flag", &[]).unwrap();
        xml.end("root").unwrap();
        let doc = xml.finish().unwrap();

        assert_eq!(
            doc,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <root a=\"1\" b=\"2\">\n  <child>text</child>\n  <flag/>\n</root>\n"
        );
    }

    #[test]
    fn test_values_are_escaped() {
        let mut xml = XmlBuilder::new(4).unwrap();
        xml.text_element("n", &[("LABEL", "a \"quoted\" <label>")], "R&D")
            .unwrap();
        let doc = xml.finish().unwrap();
        assert!(doc.contains("LABEL=\"a &quot;quoted&quot; &lt;label&gt;\""));
        assert!(doc.contains(">R&amp;D</n>"));
    }

    #[test]
    fn test_empty_text_is_self_closing() {
        let mut xml = XmlBuilder::new(4).unwrap();
        xml.leaf("value", "").unwrap();
        assert!(xml.finish().unwrap().ends_with("<value/>\n"));
    }
}

//! Minimal XML support for the SOAP adapters.
//!
//! Requests are written with [`XmlBuilder`], one statically shaped builder
//! function per request type. Replies are read into an [`XmlElement`] tree
//! keyed by *local* names: namespace prefixes are dropped while reading, so
//! `<v12:Severity>` and `<Severity>` are found by the same lookup.

use crate::utils::error::{CarrierError, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Display;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Default)]
pub struct XmlBuilder {
    buf: String,
}

impl XmlBuilder {
    pub fn new() -> Self {
        Self {
            buf: DECLARATION.to_string(),
        }
    }

    /// Opens `name`, lets `body` write the children, then closes it.
    pub fn element<F>(&mut self, name: &str, attributes: &[(&str, &str)], body: F) -> &mut Self
    where
        F: FnOnce(&mut XmlBuilder),
    {
        self.open_tag(name, attributes);
        body(self);
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
        self
    }

    pub fn leaf(&mut self, name: &str, value: impl Display) -> &mut Self {
        let value = value.to_string();
        self.open_tag(name, &[]);
        self.buf.push_str(&escape(value.as_str()));
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
        self
    }

    /// Writes the leaf only when `value` is not blank.
    pub fn leaf_present(&mut self, name: &str, value: &str) -> &mut Self {
        if !value.trim().is_empty() {
            self.leaf(name, value);
        }
        self
    }

    pub fn empty(&mut self, name: &str) -> &mut Self {
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push_str("/>");
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }

    fn open_tag(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.buf.push('<');
        self.buf.push_str(name);
        for (key, value) in attributes {
            self.buf.push(' ');
            self.buf.push_str(key);
            self.buf.push_str("=\"");
            self.buf.push_str(&escape(*value));
            self.buf.push('"');
        }
        self.buf.push('>');
    }
}

/// Element of a parsed reply. Names are local (prefix-free).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    /// Parses a document and returns its root element.
    pub fn parse(xml: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event().map_err(CarrierError::xml)? {
                Event::Start(start) => stack.push(Self::open(&start)?),
                Event::Empty(start) => {
                    let element = Self::open(&start)?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| CarrierError::xml("unexpected closing tag"))?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text.unescape().map_err(CarrierError::xml)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(CarrierError::xml(format!("unclosed element <{}>", open.name)));
        }
        root.ok_or_else(|| CarrierError::xml("document has no root element"))
    }

    fn open(start: &BytesStart<'_>) -> Result<XmlElement> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(CarrierError::xml)?;
            if attribute.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(CarrierError::xml)?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(XmlElement {
            name,
            attributes,
            ..Default::default()
        })
    }

    fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Text of this element and all of its descendants, in document order.
    pub fn text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text());
        }
        out
    }

    /// Text of the element at a child path such as `Address/City`; empty when absent.
    pub fn child_text(&self, path: &str) -> String {
        self.select_first(path).map(XmlElement::text).unwrap_or_default()
    }

    /// Path lookup. `//A/B` starts at any depth (self included), `A/B` walks
    /// children from `self`, `*` matches any element name.
    pub fn select<'a>(&'a self, path: &str) -> Vec<&'a XmlElement> {
        let (anywhere, rest) = match path.strip_prefix("//") {
            Some(rest) => (true, rest),
            None => (false, path),
        };
        let mut steps = rest.split('/').filter(|step| !step.is_empty());

        let mut current: Vec<&XmlElement> = if anywhere {
            match steps.next() {
                Some(first) => {
                    let mut found = Vec::new();
                    self.collect_descendants(first, &mut found);
                    found
                }
                None => return Vec::new(),
            }
        } else {
            vec![self]
        };

        for step in steps {
            current = current
                .into_iter()
                .flat_map(|element| {
                    element
                        .children
                        .iter()
                        .filter(move |child| step == "*" || child.name == step)
                })
                .collect();
        }
        current
    }

    pub fn select_first(&self, path: &str) -> Option<&XmlElement> {
        self.select(path).into_iter().next()
    }

    /// Text of the first match, empty when nothing matches.
    pub fn select_text(&self, path: &str) -> String {
        self.select_first(path).map(XmlElement::text).unwrap_or_default()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.select_first(path).is_some()
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        if name == "*" || self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect_descendants(name, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_escapes_text_and_attributes() {
        let mut xml = XmlBuilder::new();
        xml.element("Root", &[("xmlns", "urn:a&b")], |xml| {
            xml.leaf("Name", "Smith & Sons <Ltd>");
            xml.leaf_present("Skipped", "  ");
            xml.empty("Flag");
        });
        let out = xml.finish();

        assert!(out.starts_with(DECLARATION));
        assert!(out.contains(r#"<Root xmlns="urn:a&amp;b">"#));
        assert!(out.contains("<Name>Smith &amp; Sons &lt;Ltd&gt;</Name>"));
        assert!(!out.contains("Skipped"));
        assert!(out.ends_with("<Flag/></Root>"));
    }

    #[test]
    fn test_parse_strips_namespace_prefixes() {
        let doc = XmlElement::parse(
            r#"<?xml version="1.0"?>
            <soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
              <soapenv:Body>
                <v12:RateReply xmlns:v12="http://fedex.com/ws/rate/v12">
                  <v12:Notifications><v12:Severity>SUCCESS</v12:Severity></v12:Notifications>
                  <v12:Notifications><v12:Severity>NOTE</v12:Severity></v12:Notifications>
                </v12:RateReply>
              </soapenv:Body>
            </soapenv:Envelope>"#,
        )
        .unwrap();

        assert_eq!(doc.name(), "Envelope");
        assert_eq!(doc.select("//Notifications/Severity").len(), 2);
        assert_eq!(doc.select_text("//Notifications/Severity"), "SUCCESS");
        assert_eq!(doc.select_text("Body/RateReply/Notifications/Severity"), "SUCCESS");
        assert!(!doc.exists("//Missing"));
        assert_eq!(doc.select_text("//Missing"), "");
    }

    #[test]
    fn test_parse_attributes_wildcards_and_text() {
        let doc = XmlElement::parse(
            r#"<Rates><PostagePrice TotalAmount="7.25"><MailClass>Priority</MailClass>
               <Postage><MailService>Priority Mail</MailService></Postage></PostagePrice>
               <Image>AAA</Image><Image><![CDATA[BBB]]></Image></Rates>"#,
        )
        .unwrap();

        let price = doc.select_first("//PostagePrice").unwrap();
        assert_eq!(price.attribute("TotalAmount"), Some("7.25"));
        assert_eq!(price.select_text("*/MailService"), "Priority Mail");
        let images: Vec<String> = doc.select("//Image").iter().map(|i| i.text()).collect();
        assert_eq!(images, vec!["AAA", "BBB"]);
        assert_eq!(doc.children_named("Image").count(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<a>").is_err());
        assert!(XmlElement::parse("not xml at all").is_err());
    }
}

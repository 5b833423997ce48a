//! A minimal owned XML element tree.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::{FeedflowError, Result};

/// One XML element with its attributes, child elements and direct text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified element name.
    pub name: String,
    /// Attributes in document order, values unescaped.
    /// Namespace declarations are not attributes.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Concatenated text and CDATA directly inside this element.
    pub text: String,
}

impl XmlElement {
    /// Parses a complete document and returns its root element.
    ///
    /// The document must be well-formed: matching end tags, exactly one root
    /// element and no non-whitespace text outside it.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(strip_bom(xml));
        let mut stack: Vec<Self> = Vec::new();
        let mut root: Option<Self> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                FeedflowError::ParseFailure(format!("{e} at byte {}", reader.buffer_position()))
            })?;
            match event {
                Event::Start(start) => stack.push(Self::open(&start)?),
                Event::Empty(start) => {
                    let element = Self::open(&start)?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| FeedflowError::parse("unexpected closing tag"))?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(FeedflowError::parse)?;
                    Self::push_text(&mut stack, &text)?;
                }
                Event::CData(data) => {
                    let text = String::from_utf8(data.to_vec()).map_err(FeedflowError::parse)?;
                    Self::push_text(&mut stack, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(FeedflowError::ParseFailure(format!(
                "unexpected end of document inside <{}>",
                open.name
            )));
        }
        root.ok_or_else(|| FeedflowError::parse("document has no root element"))
    }

    /// First child element named `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first child element named `name`, or empty.
    #[must_use]
    pub fn child_text(&self, name: &str) -> &str {
        self.child(name).map_or("", |c| c.text.as_str())
    }

    /// The first attribute in document order.
    #[must_use]
    pub fn first_attribute(&self) -> Option<(&str, &str)> {
        self.attributes.first().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Value of the attribute named `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of direct child elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.children.len()
    }

    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(FeedflowError::parse)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let value = attr.unescape_value().map_err(FeedflowError::parse)?;
            attributes.push((key, value.into_owned()));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn attach(stack: &mut [Self], root: &mut Option<Self>, element: Self) -> Result<()> {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(element);
        } else if root.is_some() {
            return Err(FeedflowError::parse("multiple root elements"));
        } else {
            *root = Some(element);
        }
        Ok(())
    }

    fn push_text(stack: &mut [Self], text: &str) -> Result<()> {
        match stack.last_mut() {
            Some(element) => element.text.push_str(text),
            None if text.trim().is_empty() => {}
            None => return Err(FeedflowError::parse("text outside the root element")),
        }
        Ok(())
    }
}

pub(crate) fn strip_bom(xml: &str) -> &str {
    xml.strip_prefix('\u{feff}').unwrap_or(xml)
}

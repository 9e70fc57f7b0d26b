//! XML to generic JSON tree.
//!
//! The mapping follows the layout popularised by `xml2js`:
//!
//! * the document becomes `{"<root>": [<root value>]}`;
//! * an element without attributes or child elements becomes its text;
//! * any other element becomes an object with attributes under `"$"`,
//!   non-blank text under `"_"`, and child elements grouped by tag name
//!   into arrays, in document order.

use crate::convert::error::ConvertError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

struct OpenElement {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl OpenElement {
    fn start(tag: &BytesStart<'_>) -> Result<Self, ConvertError> {
        let mut attributes = Map::new();
        for attr in tag.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.insert(key, Value::String(value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(tag.name().as_ref()).into_owned(),
            attributes,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn push_child(&mut self, name: String, value: Value) {
        let slot = self
            .children
            .entry(name)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = slot {
            items.push(value);
        }
    }

    fn into_value(self) -> (String, Value) {
        if self.attributes.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }
        let mut object = Map::new();
        if !self.attributes.is_empty() {
            object.insert("$".to_string(), Value::Object(self.attributes));
        }
        if !self.text.trim().is_empty() {
            object.insert("_".to_string(), Value::String(self.text));
        }
        object.extend(self.children);
        (self.name, Value::Object(object))
    }
}

/// Parses a whole XML document into a JSON value.
pub fn xml_to_json(xml: &str) -> Result<Value, ConvertError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(tag) => stack.push(OpenElement::start(&tag)?),
            Event::Empty(tag) => {
                let element = OpenElement::start(&tag)?;
                close(element, &mut stack, &mut root);
            }
            Event::End(tag) => {
                let element = stack.pop().ok_or_else(|| {
                    ConvertError::UnexpectedEnd(String::from_utf8_lossy(tag.name().as_ref()).into_owned())
                })?;
                close(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            // comments, declarations, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ConvertError::Unclosed(open.name));
    }

    let (name, value) = root.ok_or(ConvertError::EmptyDocument)?;
    let mut document = Map::new();
    document.insert(name, Value::Array(vec![value]));
    Ok(Value::Object(document))
}

fn close(element: OpenElement, stack: &mut [OpenElement], root: &mut Option<(String, Value)>) {
    let (name, value) = element.into_value();
    match stack.last_mut() {
        Some(parent) => parent.push_child(name, value),
        // a second top-level element is not well-formed; keep the first
        None if root.is_none() => *root = Some((name, value)),
        None => {}
    }
}

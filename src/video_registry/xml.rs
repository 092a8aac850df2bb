// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

// A fully materialized markup tree. The registry reader only ever needs tag
// names, ordered attributes, ordered children with interspersed text and the
// line each element starts at.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::RegistryError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub nodes: Vec<XmlNode>,
    pub line: u32,
}

impl XmlElement {
    fn new(name: String, attributes: Vec<(String, String)>, line: u32) -> Self {
        Self {
            name,
            attributes,
            nodes: Vec::new(),
            line,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.nodes.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    // Concatenation of all text, including that of nested elements.
    pub fn text(&self) -> String {
        let mut s = String::new();
        self.append_text(&mut s);
        s
    }

    fn append_text(&self, s: &mut String) {
        for n in self.nodes.iter() {
            match n {
                XmlNode::Text(t) => s.push_str(t),
                XmlNode::Element(e) => e.append_text(s),
            }
        }
    }

    pub fn parse(input: &str) -> Result<Self, RegistryError> {
        let mut reader = Reader::from_str(input);
        let mut lines = LineTracker::new(input);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            let start_line = lines.line_at(reader.buffer_position() as usize);
            let event = reader.read_event().map_err(|e| RegistryError::Xml {
                line: lines.line_at(reader.error_position() as usize),
                message: e.to_string(),
            })?;
            match event {
                Event::Start(e) => {
                    let element = Self::new_from_start(&e, start_line)?;
                    stack.push(element);
                }
                Event::Empty(e) => {
                    let element = Self::new_from_start(&e, start_line)?;
                    Self::attach(&mut stack, &mut root, element, start_line)?;
                }
                Event::End(_) => {
                    // quick-xml has already verified that the end tag matches.
                    let element = match stack.pop() {
                        Some(element) => element,
                        None => {
                            return Err(RegistryError::Xml {
                                line: start_line,
                                message: "unbalanced end tag".to_owned(),
                            });
                        }
                    };
                    Self::attach(&mut stack, &mut root, element, start_line)?;
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| RegistryError::Xml {
                        line: start_line,
                        message: e.to_string(),
                    })?;
                    if let Some(top) = stack.last_mut() {
                        top.nodes.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Event::CData(t) => {
                    if let Some(top) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                        top.nodes.push(XmlNode::Text(text));
                    }
                }
                Event::Eof => break,
                // Markup comments, declarations and processing instructions
                // carry nothing of interest.
                _ => (),
            }
        }

        if !stack.is_empty() {
            return Err(RegistryError::Xml {
                line: lines.line_at(input.len()),
                message: format!("unclosed element <{}>", stack[stack.len() - 1].name),
            });
        }
        root.ok_or_else(|| RegistryError::Xml {
            line: 1,
            message: "no root element".to_owned(),
        })
    }

    fn new_from_start(e: &BytesStart, line: u32) -> Result<Self, RegistryError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| RegistryError::Xml {
                line,
                message: err.to_string(),
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|err| RegistryError::Xml {
                line,
                message: err.to_string(),
            })?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self::new(name, attributes, line))
    }

    fn attach(
        stack: &mut [XmlElement],
        root: &mut Option<XmlElement>,
        element: XmlElement,
        line: u32,
    ) -> Result<(), RegistryError> {
        match stack.last_mut() {
            Some(parent) => {
                parent.nodes.push(XmlNode::Element(element));
                Ok(())
            }
            None if root.is_none() => {
                *root = Some(element);
                Ok(())
            }
            None => Err(RegistryError::Xml {
                line,
                message: format!("second root element <{}>", element.name),
            }),
        }
    }
}

// Translates byte offsets into 1-based line numbers. Offsets handed in are
// mostly increasing, so counting resumes from the last position.
struct LineTracker<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> LineTracker<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, pos: usize) -> u32 {
        let pos = pos.min(self.input.len());
        if pos < self.pos {
            self.pos = 0;
            self.line = 1;
        }
        self.line += self.input[self.pos..pos]
            .iter()
            .filter(|c| **c == b'\n')
            .count() as u32;
        self.pos = pos;
        self.line
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

// Generic shape checks on registry elements: which attributes and child
// elements are expected, how often, and with what values.

use std::collections::HashMap;

use tracing::warn;

use super::error::{check_for_error, RegistryError, SpecViolation, SpecWarning};
use super::xml::XmlElement;

// An attribute name together with its permitted values. An empty value list
// permits anything. Values are comma separated tokens, each checked on its own.
pub(super) type AttributeSpec<'a> = (&'a str, &'a [&'a str]);

#[derive(Debug, Default)]
pub(super) struct Diagnostics {
    warnings: Vec<SpecWarning>,
}

impl Diagnostics {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn warn(&mut self, line: u32, message: String) {
        warn!(line, "{}", message);
        self.warnings.push(SpecWarning { line, message });
    }

    pub(super) fn check_for_warning(&mut self, cond: bool, line: u32, message: impl FnOnce() -> String) {
        if !cond {
            self.warn(line, message());
        }
    }

    pub(super) fn into_warnings(self) -> Vec<SpecWarning> {
        self.warnings
    }

    // Required attributes must be present with permitted values. Anything
    // not listed as required must be optional, else a warning is issued. A
    // non-permitted value of an optional attribute only warns, too.
    pub(super) fn check_attributes(
        &mut self,
        element: &XmlElement,
        required: &[AttributeSpec],
        optional: &[AttributeSpec],
    ) -> Result<(), RegistryError> {
        let line = element.line;
        for (name, permitted) in required.iter() {
            let value = match element.attribute(name) {
                Some(value) => value,
                None => {
                    return Err(RegistryError::at_line(
                        line,
                        SpecViolation::MissingAttribute((*name).to_owned()),
                    ));
                }
            };
            if !permitted.is_empty() {
                for v in value.split(',') {
                    check_for_error(permitted.contains(&v), line, || {
                        SpecViolation::UnexpectedAttributeValue {
                            attribute: (*name).to_owned(),
                            value: v.to_owned(),
                        }
                    })?;
                }
            }
        }

        for (name, value) in element.attributes.iter() {
            if required.iter().any(|(r, _)| *r == name.as_str()) {
                continue;
            }
            match optional.iter().find(|(o, _)| *o == name.as_str()) {
                None => self.warn(line, format!("unknown attribute <{}>", name)),
                Some((_, permitted)) => {
                    if permitted.is_empty() {
                        continue;
                    }
                    for v in value.split(',') {
                        self.check_for_warning(permitted.contains(&v), line, || {
                            format!("unknown attribute value <{}> in attribute <{}>", v, name)
                        });
                    }
                }
            }
        }
        Ok(())
    }

    // Each required element must be present, exactly once if flagged so.
    // Elements neither required nor optional produce a warning.
    pub(super) fn check_elements(
        &mut self,
        element: &XmlElement,
        required: &[(&str, bool)],
        optional: &[&str],
    ) -> Result<(), RegistryError> {
        let mut encountered: HashMap<&str, usize> = HashMap::new();
        for child in element.children() {
            *encountered.entry(child.name.as_str()).or_insert(0) += 1;
            let known = required.iter().any(|(r, _)| *r == child.name)
                || optional.iter().any(|o| *o == child.name);
            self.check_for_warning(known, child.line, || {
                format!("unknown element <{}>", child.name)
            });
        }

        for (name, exactly_once) in required.iter() {
            let count = encountered.get(name).copied().unwrap_or(0);
            check_for_error(count != 0, element.line, || {
                SpecViolation::MissingElement((*name).to_owned())
            })?;
            check_for_error(!exactly_once || count == 1, element.line, || {
                SpecViolation::ElementMultiplicity {
                    element: (*name).to_owned(),
                    count,
                }
            })?;
        }
        Ok(())
    }
}

// The single child of the given name, which must carry some text.
pub(super) fn child_text(element: &XmlElement, name: &str) -> Result<String, RegistryError> {
    let child = match element.children().find(|c| c.name == name) {
        Some(child) => child,
        None => {
            return Err(RegistryError::at_line(
                element.line,
                SpecViolation::MissingElement(name.to_owned()),
            ));
        }
    };
    let text = child.text();
    let text = text.trim();
    check_for_error(!text.is_empty(), child.line, || {
        SpecViolation::MissingText(name.to_owned())
    })?;
    Ok(text.to_owned())
}

pub(super) fn required_attribute<'a>(
    element: &'a XmlElement,
    name: &str,
) -> Result<&'a str, RegistryError> {
    element.attribute(name).ok_or_else(|| {
        RegistryError::at_line(element.line, SpecViolation::MissingAttribute(name.to_owned()))
    })
}

pub fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(doc: &str) -> XmlElement {
        XmlElement::parse(doc).unwrap()
    }

    #[test]
    fn missing_required_attribute_is_fatal() {
        let e = parse("<type name=\"x\"/>");
        let mut d = Diagnostics::new();
        let err = d
            .check_attributes(&e, &[("name", &[]), ("category", &[])], &[])
            .unwrap_err();
        assert_eq!(
            err.violation(),
            Some(&SpecViolation::MissingAttribute("category".to_owned()))
        );
    }

    #[test]
    fn unexpected_required_value_is_fatal() {
        let e = parse("<extension supported=\"vulkan,gl\"/>");
        let mut d = Diagnostics::new();
        let err = d
            .check_attributes(&e, &[("supported", &["vulkan"])], &[])
            .unwrap_err();
        assert_eq!(
            err.violation(),
            Some(&SpecViolation::UnexpectedAttributeValue {
                attribute: "supported".to_owned(),
                value: "gl".to_owned()
            })
        );
    }

    #[test]
    fn unknown_attributes_and_optional_values_only_warn() {
        let e = parse("<member optional=\"maybe\" bogus=\"1\"/>");
        let mut d = Diagnostics::new();
        d.check_attributes(&e, &[], &[("optional", &["true", "false"])])
            .unwrap();
        let warnings = d.into_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("maybe"));
        assert!(warnings[1].message.contains("bogus"));
    }

    #[test]
    fn element_multiplicity() {
        let e = parse("<r><types/><types/><comment/><other/></r>");
        let mut d = Diagnostics::new();
        let err = d
            .check_elements(&e, &[("comment", false), ("types", true)], &[])
            .unwrap_err();
        assert_eq!(
            err.violation(),
            Some(&SpecViolation::ElementMultiplicity {
                element: "types".to_owned(),
                count: 2
            })
        );
        assert_eq!(d.into_warnings().len(), 1);

        let mut d = Diagnostics::new();
        let err = d.check_elements(&e, &[("enums", false)], &["types", "comment", "other"]);
        assert_eq!(
            err.unwrap_err().violation(),
            Some(&SpecViolation::MissingElement("enums".to_owned()))
        );
    }

    #[test]
    fn numbers() {
        assert!(is_number("0"));
        assert!(is_number("32"));
        assert!(!is_number(""));
        assert!(!is_number("0x10"));
        assert!(!is_number("STD_VIDEO_H264_CPB_CNT_LIST_SIZE"));
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use regex::Regex;

use super::checks::{child_text, is_number, required_attribute};
use super::entities::{
    ConstantDescriptor, DefineDescriptor, EnumAlias, EnumDescriptor, EnumValueDescriptor,
    ExtensionDescriptor, ExternalTypeDescriptor, IncludeDescriptor, MemberDescriptor, MemberType,
    RequireBlock, StructureDescriptor, TypeQualifiers,
};
use super::error::{check_for_error, RegistryError, SpecViolation};
use super::find_extension;
use super::type_registry::TypeCategory;
use super::xml::{XmlElement, XmlNode};
use super::RegistryBuilder;

pub(super) struct RegistryRegexpsCache {
    pub re_hex_number: Regex,
    pub re_depends_header: Regex,
    pub re_array_dims: Regex,
    pub re_array_dim: Regex,
    pub re_bit_width: Regex,
}

impl RegistryRegexpsCache {
    pub(super) fn new() -> Self {
        let re_hex_number = Regex::new(r"^0[xX][0-9A-Fa-f]+$").unwrap();

        // A required "type" naming the header of another extension, like
        // "vk_video/vulkan_video_codec_h264std.h".
        let re_depends_header = Regex::new(r"^vk_video/(?P<EXT>\w+)\.h$").unwrap();

        // Member modifiers following the member's name: one or more array
        // dimensions, each a literal or a constant, or a bit field width.
        let re_array_dims = Regex::new(r"^(?:\[\s*\w+\s*\]\s*)+$").unwrap();
        let re_array_dim = Regex::new(r"\[\s*(?P<SIZE>\w+)\s*\]").unwrap();
        let re_bit_width = Regex::new(r"^:\s*(?P<BITS>[0-9]+)$").unwrap();

        Self {
            re_hex_number,
            re_depends_header,
            re_array_dims,
            re_array_dim,
            re_bit_width,
        }
    }

    fn is_literal(&self, value: &str) -> bool {
        is_number(value) || self.re_hex_number.is_match(value)
    }
}

const CONSTANT_DEFAULT_TYPE: &str = "uint32_t";

// Required enums with these suffixes describe the extension itself and
// don't get recorded as constants.
const SKIPPED_CONSTANT_SUFFIXES: [&str; 2] = ["_SPEC_VERSION", "_EXTENSION_NAME"];

impl RegistryBuilder {
    pub(super) fn read_registry(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        let line = element.line;
        check_for_error(element.name == "registry", line, || {
            SpecViolation::MissingElement("registry".to_owned())
        })?;
        self.diagnostics.check_attributes(element, &[], &[])?;
        self.diagnostics.check_elements(
            element,
            &[("comment", false), ("extensions", true), ("types", true)],
            &["enums"],
        )?;

        for child in element.children() {
            match child.name.as_str() {
                "comment" => {
                    let comment = child.text();
                    let comment = comment.trim();
                    if comment.starts_with("Copyright") && self.copyright.is_empty() {
                        self.copyright = comment.to_owned();
                    }
                }
                "enums" => self.read_enums(child)?,
                "extensions" => self.read_extensions(child)?,
                "types" => self.read_types(child)?,
                _ => (),
            }
        }

        if self.copyright.is_empty() {
            return Err(RegistryError::in_document(SpecViolation::MissingCopyright));
        }
        Ok(())
    }

    fn read_types(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        self.diagnostics
            .check_attributes(element, &[], &[("comment", &[])])?;
        self.diagnostics
            .check_elements(element, &[("type", false)], &["comment"])?;

        for child in element.children().filter(|c| c.name == "type") {
            self.read_types_type(child)?;
        }
        Ok(())
    }

    fn read_types_type(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        let line = element.line;
        match element.attribute("category") {
            Some("define") => self.read_type_define(element),
            Some("enum") => self.read_type_enum(element),
            Some("include") => self.read_type_include(element),
            Some("struct") => self.read_type_struct(element),
            Some(category) => Err(RegistryError::at_line(
                line,
                SpecViolation::UnknownCategory(category.to_owned()),
            )),
            None if element.attribute("requires").is_some() => self.read_type_requires(element),
            None => {
                // The only type without category or include is the bare "int".
                let name = element.attribute("name").unwrap_or("");
                check_for_error(
                    element.attributes.len() == 1 && name == "int",
                    line,
                    || SpecViolation::UnknownType(name.to_owned()),
                )?;
                self.types.declare(name, TypeCategory::Unknown, line)
            }
        }
    }

    fn read_type_define(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        let line = element.line;
        self.diagnostics.check_attributes(
            element,
            &[("category", &["define"])],
            &[("requires", &[])],
        )?;
        self.diagnostics
            .check_elements(element, &[("name", true)], &["type"])?;

        let name = child_text(element, "name")?;
        // A <type> child names the define macro this one expands to.
        if element.children().any(|c| c.name == "type") {
            let base = child_text(element, "type")?;
            check_for_error(self.entities.defines.contains(&base), line, || {
                SpecViolation::UnknownDefine {
                    name: name.clone(),
                    define: base.clone(),
                }
            })?;
        }
        let requires = element.attribute("requires").map(|r| r.to_owned());
        if let Some(requires) = &requires {
            check_for_error(self.entities.defines.contains(requires), line, || {
                SpecViolation::UnknownDefine {
                    name: name.clone(),
                    define: requires.clone(),
                }
            })?;
        }

        self.types.declare(&name, TypeCategory::Define, line)?;
        self.entities.defines.insert(
            DefineDescriptor {
                name,
                requires,
                line,
            },
            line,
        )
    }

    fn read_type_enum(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        let line = element.line;
        self.diagnostics.check_attributes(
            element,
            &[("category", &["enum"]), ("name", &[])],
            &[],
        )?;
        self.diagnostics.check_elements(element, &[], &[])?;

        let name = required_attribute(element, "name")?;
        self.types.declare(name, TypeCategory::Enum, line)?;
        // Only the shell for now, the values follow in the <enums> section.
        self.entities
            .enums
            .insert(EnumDescriptor::new(name.to_owned(), line), line)
    }

    fn read_type_include(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        let line = element.line;
        self.diagnostics.check_attributes(
            element,
            &[("category", &["include"]), ("name", &[])],
            &[],
        )?;
        self.diagnostics.check_elements(element, &[], &[])?;

        let name = required_attribute(element, "name")?;
        self.types.declare(name, TypeCategory::Include, line)?;
        self.entities.includes.insert(
            IncludeDescriptor {
                name: name.to_owned(),
                line,
            },
            line,
        )
    }

    fn read_type_requires(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        let line = element.line;
        self.diagnostics
            .check_attributes(element, &[("name", &[]), ("requires", &[])], &[])?;
        self.diagnostics.check_elements(element, &[], &[])?;

        let name = required_attribute(element, "name")?;
        let include = required_attribute(element, "requires")?;
        check_for_error(self.entities.includes.contains(include), line, || {
            SpecViolation::UnknownInclude {
                name: name.to_owned(),
                include: include.to_owned(),
            }
        })?;

        self.types.declare(name, TypeCategory::ExternalType, line)?;
        self.entities.external_types.insert(
            ExternalTypeDescriptor {
                name: name.to_owned(),
                include: include.to_owned(),
                line,
            },
            line,
        )
    }

    fn read_type_struct(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        let line = element.line;
        self.diagnostics.check_attributes(
            element,
            &[("category", &["struct"]), ("name", &[])],
            &[("comment", &[])],
        )?;
        self.diagnostics
            .check_elements(element, &[("member", false)], &["comment"])?;

        let name = required_attribute(element, "name")?;
        let mut members = Vec::new();
        for child in element.children().filter(|c| c.name == "member") {
            let member = self.read_struct_member(child)?;
            check_for_error(
                members
                    .iter()
                    .all(|m: &MemberDescriptor| m.name != member.name),
                member.line,
                || SpecViolation::DuplicateMember {
                    structure: name.to_owned(),
                    member: member.name.clone(),
                },
            )?;
            members.push(member);
        }

        self.types.declare(name, TypeCategory::Struct, line)?;
        self.entities.structures.insert(
            StructureDescriptor {
                name: name.to_owned(),
                members,
                comment: element.attribute("comment").map(|c| c.to_owned()),
                line,
            },
            line,
        )
    }

    // A member reads like "const <type>T</type>* <name>n</name>[<enum>N</enum>]".
    fn read_struct_member(&mut self, element: &XmlElement) -> Result<MemberDescriptor, RegistryError> {
        let line = element.line;
        self.diagnostics.check_attributes(
            element,
            &[],
            &[
                ("len", &[]),
                ("noautovalidity", &["true"]),
                ("optional", &["false", "true"]),
            ],
        )?;
        self.diagnostics.check_elements(
            element,
            &[("name", true), ("type", true)],
            &["comment", "enum"],
        )?;

        enum Stage {
            Prefix,
            Postfix,
            Modifiers,
        }
        let mut stage = Stage::Prefix;
        let mut prefix = String::new();
        let mut postfix = String::new();
        let mut modifiers = String::new();
        let mut type_name = String::new();
        let mut name = String::new();
        for node in element.nodes.iter() {
            match node {
                XmlNode::Text(t) => match stage {
                    Stage::Prefix => prefix += t,
                    Stage::Postfix => postfix += t,
                    Stage::Modifiers => modifiers += t,
                },
                XmlNode::Element(child) => match child.name.as_str() {
                    "type" => {
                        type_name = child.text().trim().to_owned();
                        stage = Stage::Postfix;
                    }
                    "name" => {
                        name = child.text().trim().to_owned();
                        stage = Stage::Modifiers;
                    }
                    "enum" => match stage {
                        Stage::Modifiers => modifiers += &child.text(),
                        _ => {
                            return Err(RegistryError::at_line(
                                child.line,
                                SpecViolation::MalformedModifiers {
                                    member: name,
                                    text: child.text(),
                                },
                            ));
                        }
                    },
                    _ => (),
                },
            }
        }
        check_for_error(!type_name.is_empty(), line, || {
            SpecViolation::MissingText("type".to_owned())
        })?;
        check_for_error(!name.is_empty(), line, || {
            SpecViolation::MissingText("name".to_owned())
        })?;

        let mut qualifiers = match prefix.trim() {
            "" => TypeQualifiers::empty(),
            "const" => TypeQualifiers::CONST,
            _ => {
                return Err(RegistryError::at_line(
                    line,
                    SpecViolation::MalformedModifiers {
                        member: name,
                        text: prefix.clone(),
                    },
                ));
            }
        };
        let postfix_stars: String = postfix.chars().filter(|c| !c.is_whitespace()).collect();
        match postfix_stars.as_str() {
            "" => (),
            "*" => qualifiers.insert(TypeQualifiers::POINTER),
            "**" => qualifiers.insert(TypeQualifiers::POINTER_TO_POINTER),
            _ => {
                return Err(RegistryError::at_line(
                    line,
                    SpecViolation::MalformedModifiers {
                        member: name,
                        text: postfix,
                    },
                ));
            }
        }

        let (array_sizes, bit_width) = self.parse_member_modifiers(&name, &modifiers, line)?;

        Ok(MemberDescriptor {
            name,
            member_type: MemberType {
                name: type_name,
                qualifiers,
            },
            array_sizes,
            bit_width,
            len: element.attribute("len").map(|l| l.to_owned()),
            optional: element.attribute("optional") == Some("true"),
            line,
        })
    }

    fn parse_member_modifiers(
        &self,
        member: &str,
        text: &str,
        line: u32,
    ) -> Result<(Vec<String>, Option<u32>), RegistryError> {
        let text = text.trim();
        let malformed = || {
            RegistryError::at_line(
                line,
                SpecViolation::MalformedModifiers {
                    member: member.to_owned(),
                    text: text.to_owned(),
                },
            )
        };

        if text.is_empty() {
            Ok((Vec::new(), None))
        } else if let Some(captures) = self.regexps.re_bit_width.captures(text) {
            let bits = captures["BITS"].parse::<u32>().map_err(|_| malformed())?;
            Ok((Vec::new(), Some(bits)))
        } else if self.regexps.re_array_dims.is_match(text) {
            let sizes = self
                .regexps
                .re_array_dim
                .captures_iter(text)
                .map(|c| c["SIZE"].to_owned())
                .collect();
            Ok((sizes, None))
        } else {
            Err(malformed())
        }
    }

    fn read_enums(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        let line = element.line;
        self.diagnostics.check_attributes(
            element,
            &[("name", &[]), ("type", &["enum"])],
            &[("comment", &[])],
        )?;
        self.diagnostics
            .check_elements(element, &[], &["comment", "enum", "unused"])?;

        let name = required_attribute(element, "name")?;
        let prefix = match self.entities.enums.get(name) {
            Some(e) => {
                check_for_error(e.values.is_empty(), line, || {
                    SpecViolation::EnumAlreadyPopulated(name.to_owned())
                })?;
                e.value_prefix()
            }
            None => {
                return Err(RegistryError::at_line(
                    line,
                    SpecViolation::EnumNotDeclared(name.to_owned()),
                ));
            }
        };

        let mut shell = EnumDescriptor::new(name.to_owned(), line);
        for child in element.children().filter(|c| c.name == "enum") {
            self.read_enums_enum(child, &mut shell, &prefix)?;
        }

        if let Some(e) = self.entities.enums.get_mut(name) {
            e.values = shell.values;
        }
        Ok(())
    }

    fn read_enums_enum(
        &mut self,
        element: &XmlElement,
        enum_data: &mut EnumDescriptor,
        prefix: &str,
    ) -> Result<(), RegistryError> {
        let line = element.line;
        let name = required_attribute(element, "name")?;
        let name_in_use = |e: &EnumDescriptor| e.find_value(name).is_some() || e.has_alias(name);

        if let Some(target) = element.attribute("alias") {
            self.diagnostics.check_attributes(
                element,
                &[("alias", &[]), ("name", &[])],
                &[("comment", &[]), ("deprecated", &["aliased"])],
            )?;
            self.diagnostics.check_elements(element, &[], &[])?;

            let value = match enum_data.find_value(target) {
                Some(value) => value,
                None => {
                    return Err(RegistryError::at_line(
                        line,
                        SpecViolation::UnknownAliasTarget {
                            alias: name.to_owned(),
                            target: target.to_owned(),
                        },
                    ));
                }
            };
            check_for_error(!name_in_use(enum_data), line, || {
                SpecViolation::DuplicateAlias(name.to_owned())
            })?;
            enum_data.values[value].aliases.push(EnumAlias {
                name: name.to_owned(),
                deprecated: element.attribute("deprecated").map(|d| d.to_owned()),
                line,
            });
        } else {
            self.diagnostics.check_attributes(
                element,
                &[("name", &[]), ("value", &[])],
                &[("comment", &[])],
            )?;
            self.diagnostics.check_elements(element, &[], &[])?;

            let value = required_attribute(element, "value")?;
            check_for_error(name.starts_with(prefix), line, || {
                SpecViolation::ValuePrefixMismatch {
                    name: name.to_owned(),
                    prefix: prefix.to_owned(),
                }
            })?;
            check_for_error(self.regexps.is_literal(value), line, || {
                SpecViolation::InvalidLiteral(value.to_owned())
            })?;
            check_for_error(!name_in_use(enum_data), line, || {
                SpecViolation::DuplicateEnumValue {
                    enum_name: enum_data.name.clone(),
                    value: name.to_owned(),
                }
            })?;
            enum_data.values.push(EnumValueDescriptor {
                name: name.to_owned(),
                value: value.to_owned(),
                comment: element.attribute("comment").map(|c| c.to_owned()),
                aliases: Vec::new(),
                line,
            });
        }
        Ok(())
    }

    fn read_extensions(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        self.diagnostics
            .check_attributes(element, &[], &[("comment", &[])])?;
        self.diagnostics
            .check_elements(element, &[("extension", false)], &["comment"])?;

        for child in element.children().filter(|c| c.name == "extension") {
            self.read_extension(child)?;
        }
        Ok(())
    }

    fn read_extension(&mut self, element: &XmlElement) -> Result<(), RegistryError> {
        let line = element.line;
        self.diagnostics.check_attributes(
            element,
            &[("name", &[]), ("number", &[]), ("supported", &["vulkan"])],
            &[("comment", &[]), ("protect", &[])],
        )?;
        self.diagnostics
            .check_elements(element, &[("require", false)], &[])?;

        let name = required_attribute(element, "name")?;
        check_for_error(find_extension(&self.extensions, name).is_none(), line, || {
            SpecViolation::DuplicateExtensionName(name.to_owned())
        })?;

        let number_text = required_attribute(element, "number")?;
        let number = match number_text.parse::<u32>() {
            Ok(number) if is_number(number_text) => number,
            _ => {
                return Err(RegistryError::at_line(
                    line,
                    SpecViolation::InvalidLiteral(number_text.to_owned()),
                ));
            }
        };
        if let Some(other) = self.extensions.iter().find(|e| e.number == number) {
            return Err(RegistryError::at_line(
                line,
                SpecViolation::DuplicateExtensionNumber {
                    name: name.to_owned(),
                    number,
                    other: other.name.clone(),
                },
            ));
        }

        let mut extension = ExtensionDescriptor {
            name: name.to_owned(),
            number,
            comment: element.attribute("comment").map(|c| c.to_owned()),
            protect: element.attribute("protect").map(|p| p.to_owned()),
            depends: None,
            require: RequireBlock::default(),
            line,
        };
        for child in element.children().filter(|c| c.name == "require") {
            self.read_extension_require(child, &mut extension)?;
        }
        self.extensions.push(extension);
        Ok(())
    }

    fn read_extension_require(
        &mut self,
        element: &XmlElement,
        extension: &mut ExtensionDescriptor,
    ) -> Result<(), RegistryError> {
        self.diagnostics
            .check_attributes(element, &[], &[("comment", &[])])?;
        self.diagnostics
            .check_elements(element, &[], &["comment", "enum", "type"])?;

        for child in element.children() {
            match child.name.as_str() {
                "enum" => self.read_require_enum(child, extension)?,
                "type" => self.read_require_type(child, extension)?,
                _ => (),
            }
        }
        Ok(())
    }

    fn read_require_enum(
        &mut self,
        element: &XmlElement,
        extension: &mut ExtensionDescriptor,
    ) -> Result<(), RegistryError> {
        let line = element.line;
        self.diagnostics.check_attributes(
            element,
            &[("name", &[])],
            &[("comment", &[]), ("type", &[]), ("value", &[])],
        )?;
        self.diagnostics.check_elements(element, &[], &[])?;

        let name = required_attribute(element, "name")?;
        if SKIPPED_CONSTANT_SUFFIXES
            .iter()
            .any(|suffix| name.ends_with(suffix))
        {
            return Ok(());
        }

        match element.attribute("value") {
            Some(value) => {
                check_for_error(self.regexps.is_literal(value), line, || {
                    SpecViolation::InvalidLiteral(value.to_owned())
                })?;
                check_for_error(extension.require.constant(name).is_none(), line, || {
                    SpecViolation::DuplicateConstant(name.to_owned())
                })?;
                extension.require.constants.push(ConstantDescriptor {
                    name: name.to_owned(),
                    type_name: element
                        .attribute("type")
                        .unwrap_or(CONSTANT_DEFAULT_TYPE)
                        .to_owned(),
                    value: value.to_owned(),
                    line,
                });
            }
            None => {
                // A mere reference to a constant declared before.
                let known = extension.require.constant(name).is_some()
                    || extension
                        .depends
                        .as_deref()
                        .and_then(|d| find_extension(&self.extensions, d))
                        .map(|d| d.require.constant(name).is_some())
                        .unwrap_or(false);
                check_for_error(known, line, || SpecViolation::UnknownConstant {
                    extension: extension.name.clone(),
                    constant: name.to_owned(),
                })?;
            }
        }
        Ok(())
    }

    fn read_require_type(
        &mut self,
        element: &XmlElement,
        extension: &mut ExtensionDescriptor,
    ) -> Result<(), RegistryError> {
        let line = element.line;
        self.diagnostics
            .check_attributes(element, &[("name", &[])], &[("comment", &[])])?;
        self.diagnostics.check_elements(element, &[], &[])?;

        let name = required_attribute(element, "name")?;

        // Requiring another extension's header makes this one depend on it.
        if let Some(captures) = self.regexps.re_depends_header.captures(name) {
            let depends = &captures["EXT"];
            let is_extension = find_extension(&self.extensions, depends).is_some();
            if is_extension || !self.types.contains(name) {
                if let Some(existing) = &extension.depends {
                    return Err(RegistryError::at_line(
                        line,
                        SpecViolation::DuplicateDepends {
                            extension: extension.name.clone(),
                            depends: existing.clone(),
                        },
                    ));
                }
                check_for_error(is_extension, line, || {
                    SpecViolation::UnknownDependsExtension {
                        extension: extension.name.clone(),
                        depends: depends.to_owned(),
                    }
                })?;
                extension.depends = Some(depends.to_owned());
                return Ok(());
            }
        }

        let type_data = match self.types.lookup_mut(name) {
            Some(type_data) => type_data,
            None => {
                return Err(RegistryError::at_line(
                    line,
                    SpecViolation::UnknownType(name.to_owned()),
                ));
            }
        };
        type_data.required_by.insert(extension.name.clone());
        if extension.require.requires_type(name) {
            self.diagnostics.warn(
                line,
                format!(
                    "type <{}> required more than once by extension <{}>",
                    name, extension.name
                ),
            );
        } else {
            extension.require.types.push(name.to_owned());
        }
        Ok(())
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use std::collections::HashSet;
use std::io::{self, Write};

use tracing::debug;

use crate::video_registry::entities::{
    EnumDescriptor, MemberDescriptor, MemberType, StructureDescriptor, TypeQualifiers,
};
use crate::video_registry::type_registry::TypeCategory;

use super::code_writer::{CodeWriter, IndentedCodeWriter};
use super::VideoHppCodeGenerator;

impl<'a> VideoHppCodeGenerator<'a> {
    pub fn generate_header<W: io::Write>(&self, out: &mut W) -> Result<(), io::Error> {
        let mut writer = CodeWriter::new(out);
        let mut iw = writer.make_writer();
        let namespace = &self.options.namespace;
        let video_namespace = &self.options.video_namespace;

        self.write_copyright(&mut iw)?;

        let include_guard = Self::format_include_guard(&self.options.header_file_name);
        writeln!(iw, "#ifndef {}", include_guard)?;
        writeln!(iw, "#define {}", include_guard)?;
        writeln!(iw)?;
        for extension in self.registry.extensions() {
            if let Some(protect) = &extension.protect {
                writeln!(iw, "{}", Self::format_guard_begin(protect))?;
            }
            writeln!(iw, "#include <vk_video/{}.h>", extension.name)?;
            if let Some(protect) = &extension.protect {
                writeln!(iw, "{}", Self::format_guard_end(protect))?;
            }
        }
        writeln!(iw, "#include <vulkan/vulkan.hpp>")?;
        writeln!(iw)?;
        writeln!(iw, "#if !defined( {} )", video_namespace)?;
        writeln!(iw, "#  define {} video", video_namespace)?;
        writeln!(iw, "#endif")?;
        writeln!(iw)?;

        writeln!(iw, "namespace {}", namespace)?;
        writeln!(iw, "{{")?;
        {
            let mut iiw = iw.make_indent();
            writeln!(iiw, "namespace {}", video_namespace)?;
            writeln!(iiw, "{{")?;
            {
                let mut iiiw = iiw.make_indent();
                self.write_constants(&mut iiiw)?;
                self.write_enums(&mut iiiw)?;
                self.write_structures(&mut iiiw)?;
            }
            writeln!(iiw, "}}   // namespace {}", video_namespace)?;
        }
        writeln!(iw, "}}   // namespace {}", namespace)?;
        writeln!(iw, "#endif")?;
        Ok(())
    }

    fn write_constants<W: io::Write>(
        &self,
        out: &mut IndentedCodeWriter<'_, W>,
    ) -> Result<(), io::Error> {
        writeln!(out, "{}", Self::format_section_banner("CONSTANTs"))?;
        for extension in self
            .registry
            .extensions()
            .iter()
            .filter(|e| !e.require.constants.is_empty())
        {
            Self::write_extension_section(out, extension, |out| {
                for constant in extension.require.constants.iter() {
                    writeln!(
                        out,
                        "VULKAN_HPP_CONSTEXPR_INLINE {} {} = {};",
                        constant.type_name,
                        self.format_constant_name(&constant.name),
                        constant.name
                    )?;
                }
                Ok(())
            })?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_enums<W: io::Write>(&self, out: &mut IndentedCodeWriter<'_, W>) -> Result<(), io::Error> {
        writeln!(out, "{}", Self::format_section_banner("ENUMs"))?;
        for extension in self.registry.extensions() {
            let enums = self.required_enums(extension);
            if enums.is_empty() {
                continue;
            }
            Self::write_extension_section(out, extension, |out| {
                for enum_data in enums.iter() {
                    writeln!(out)?;
                    self.write_enum(out, enum_data)?;
                }
                Ok(())
            })?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_enum<W: io::Write>(
        &self,
        out: &mut IndentedCodeWriter<'_, W>,
        enum_data: &EnumDescriptor,
    ) -> Result<(), io::Error> {
        writeln!(out, "enum class {}", self.strip_native_prefix(&enum_data.name))?;
        writeln!(out, "{{")?;

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for value in enum_data.values.iter() {
            let value_name = Self::format_enum_value_name(&enum_data.name, &value.name);
            seen.insert(value_name.clone());
            entries.push(format!("{} = {}", value_name, value.name));
            for alias in value.aliases.iter() {
                let alias_name = Self::format_enum_value_name(&enum_data.name, &alias.name);
                if !seen.insert(alias_name.clone()) {
                    continue;
                }
                match &alias.deprecated {
                    Some(_) => entries.push(format!(
                        "{} VULKAN_HPP_DEPRECATED_17( \"{} is deprecated, {} should be used instead.\" ) = {}",
                        alias_name, alias_name, value_name, alias.name
                    )),
                    None => entries.push(format!("{} = {}", alias_name, alias.name)),
                }
            }
        }
        if !entries.is_empty() {
            let mut iout = out.make_indent();
            writeln!(iout, "{}", entries.join(",\n"))?;
        }

        writeln!(out, "}};")?;
        Ok(())
    }

    fn write_structures<W: io::Write>(
        &self,
        out: &mut IndentedCodeWriter<'_, W>,
    ) -> Result<(), io::Error> {
        writeln!(out, "{}", Self::format_section_banner("STRUCTS"))?;
        for extension in self.registry.extensions() {
            let structures = self.required_structures(extension);
            if structures.is_empty() {
                continue;
            }
            debug!(
                extension = %extension.name,
                count = structures.len(),
                "writing structs"
            );
            Self::write_extension_section(out, extension, |out| {
                for structure in structures.iter() {
                    writeln!(out)?;
                    self.write_structure(out, structure)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    fn write_structure<W: io::Write>(
        &self,
        out: &mut IndentedCodeWriter<'_, W>,
        structure: &StructureDescriptor,
    ) -> Result<(), io::Error> {
        let native_name = &structure.name;
        writeln!(out, "struct {}", self.strip_native_prefix(native_name))?;
        writeln!(out, "{{")?;
        {
            let mut iout = out.make_indent();
            writeln!(iout, "using NativeType = {};", native_name)?;
            writeln!(iout)?;
            writeln!(iout, "operator {} const &() const VULKAN_HPP_NOEXCEPT", native_name)?;
            writeln!(iout, "{{")?;
            writeln!(
                iout,
                "  return *reinterpret_cast<const {} *>( this );",
                native_name
            )?;
            writeln!(iout, "}}")?;
            writeln!(iout)?;
            writeln!(iout, "operator {} &() VULKAN_HPP_NOEXCEPT", native_name)?;
            writeln!(iout, "{{")?;
            writeln!(iout, "  return *reinterpret_cast<{} *>( this );", native_name)?;
            writeln!(iout, "}}")?;
            writeln!(iout)?;
        }
        writeln!(out, "public:")?;
        {
            let mut iout = out.make_indent();
            for member in structure.members.iter() {
                writeln!(iout, "{}", self.format_member(member))?;
            }
        }
        writeln!(out, "}};")?;
        Ok(())
    }

    // Types of the wrapped API live in the video namespace, anything else is
    // taken verbatim.
    pub(super) fn format_type_name(&self, name: &str) -> String {
        match self.registry.types().category_of(name) {
            Some(TypeCategory::Struct) | Some(TypeCategory::Enum)
                if name.starts_with(self.options.native_prefix.as_str()) =>
            {
                format!(
                    "{}::{}::{}",
                    self.options.namespace,
                    self.options.video_namespace,
                    self.strip_native_prefix(name)
                )
            }
            _ => name.to_owned(),
        }
    }

    fn format_member_type(&self, member_type: &MemberType) -> String {
        let mut s = String::new();
        if member_type.qualifiers.contains(TypeQualifiers::CONST) {
            s += "const ";
        }
        s += &self.format_type_name(&member_type.name);
        if member_type.qualifiers.contains(TypeQualifiers::POINTER_TO_POINTER) {
            s += " **";
        } else if member_type.qualifiers.contains(TypeQualifiers::POINTER) {
            s += " *";
        }
        s
    }

    pub(super) fn format_member(&self, member: &MemberDescriptor) -> String {
        let member_type = self.format_member_type(&member.member_type);
        let sizes = &member.array_sizes;
        let declared_type = if sizes.len() == 2 {
            format!(
                "{}::ArrayWrapper2D<{}, {}, {}>",
                self.options.namespace, member_type, sizes[0], sizes[1]
            )
        } else {
            sizes.iter().rev().fold(member_type, |inner, size| {
                format!(
                    "{}::ArrayWrapper1D<{}, {}>",
                    self.options.namespace, inner, size
                )
            })
        };

        if let Some(bits) = member.bit_width {
            return format!("{} {} : {};", declared_type, member.name, bits);
        }

        let initializer = match self.first_enum_value(member) {
            Some(value) => format!(
                "{}::{}",
                self.format_type_name(&member.member_type.name),
                value
            ),
            None => "{}".to_owned(),
        };
        format!("{} {} = {};", declared_type, member.name, initializer)
    }

    // Plain enum typed members default to the enum's first value.
    fn first_enum_value(&self, member: &MemberDescriptor) -> Option<String> {
        if !member.array_sizes.is_empty() || member.member_type.is_pointer() {
            return None;
        }
        let enum_data = self
            .registry
            .entities()
            .enums
            .get(&member.member_type.name)?;
        let first = enum_data.values.first()?;
        Some(Self::format_enum_value_name(&enum_data.name, &first.name))
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use std::io::{self, Write};

use crate::video_registry::entities::ExtensionDescriptor;

use super::code_writer::CodeWriter;
use super::VideoHppCodeGenerator;

impl<'a> VideoHppCodeGenerator<'a> {
    pub fn generate_module<W: io::Write>(&self, out: &mut W) -> Result<(), io::Error> {
        let mut writer = CodeWriter::new(out);
        let mut iw = writer.make_writer();
        let namespace = &self.options.namespace;
        let video_namespace = &self.options.video_namespace;

        self.write_copyright(&mut iw)?;

        writeln!(iw, "module;")?;
        writeln!(iw)?;
        writeln!(iw, "#include <vulkan/vulkan_hpp_macros.hpp>")?;
        writeln!(iw, "#include <vulkan/{}>", self.options.header_file_name)?;
        writeln!(iw)?;
        writeln!(iw, "export module {};", self.options.module_name)?;
        writeln!(iw)?;

        writeln!(iw, "export namespace {}", namespace)?;
        writeln!(iw, "{{")?;
        {
            let mut iiw = iw.make_indent();
            writeln!(iiw, "namespace {}", video_namespace)?;
            writeln!(iiw, "{{")?;
            {
                let mut iiiw = iiw.make_indent();
                for extension in self.registry.extensions() {
                    let exports = self.exported_names(extension);
                    if exports.is_empty() {
                        continue;
                    }
                    Self::write_extension_section(&mut iiiw, extension, |out| {
                        for name in exports.iter() {
                            writeln!(
                                out,
                                "using {}::{}::{};",
                                namespace, video_namespace, name
                            )?;
                        }
                        Ok(())
                    })?;
                }
            }
            writeln!(iiw, "}}   // namespace {}", video_namespace)?;
        }
        writeln!(iw, "}}   // namespace {}", namespace)?;
        Ok(())
    }

    // Constants first, then enums, then structs in resolved order.
    fn exported_names(&self, extension: &ExtensionDescriptor) -> Vec<String> {
        let mut names: Vec<String> = extension
            .require
            .constants
            .iter()
            .map(|c| self.format_constant_name(&c.name))
            .collect();
        names.extend(
            self.required_enums(extension)
                .iter()
                .map(|e| self.strip_native_prefix(&e.name).to_owned()),
        );
        names.extend(
            self.required_structures(extension)
                .iter()
                .map(|s| self.strip_native_prefix(&s.name).to_owned()),
        );
        names
    }
}

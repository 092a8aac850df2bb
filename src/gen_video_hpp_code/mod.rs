// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

// C++ wrapper emission on top of a resolved and checked VideoRegistry.

use std::fs;
use std::io;
use std::path;

use thiserror::Error;
use tracing::{debug, info};

use crate::video_registry::entities::{EnumDescriptor, ExtensionDescriptor, StructureDescriptor};
use crate::video_registry::error::RegistryError;
use crate::video_registry::VideoRegistry;

mod camelcase_impl;
pub mod code_writer;
mod guard_impl;
mod header_impl;
mod module_impl;

#[derive(Clone, Debug)]
pub struct GeneratorOptions {
    pub header_file_name: String,
    pub module_file_name: String,
    pub module_name: String,
    pub namespace: String,
    pub video_namespace: String,
    pub native_prefix: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            header_file_name: "vulkan_video.hpp".to_owned(),
            module_file_name: "vulkan_video.cppm".to_owned(),
            module_name: "vulkan_video_hpp".to_owned(),
            namespace: "VULKAN_HPP_NAMESPACE".to_owned(),
            video_namespace: "VULKAN_HPP_VIDEO_NAMESPACE".to_owned(),
            native_prefix: "StdVideo".to_owned(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to render output: {0}")]
    Render(#[from] io::Error),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: path::PathBuf,
        source: io::Error,
    },
}

pub struct VideoHppCodeGenerator<'a> {
    registry: &'a VideoRegistry,
    options: &'a GeneratorOptions,
}

impl<'a> VideoHppCodeGenerator<'a> {
    pub fn new(registry: &'a VideoRegistry, options: &'a GeneratorOptions) -> Self {
        Self { registry, options }
    }

    // Both artifacts are rendered to memory before anything is written.
    pub fn write_files(&self, output_dir: &path::Path) -> Result<Vec<path::PathBuf>, GeneratorError> {
        let mut header = Vec::new();
        self.generate_header(&mut header)?;
        let mut module = Vec::new();
        self.generate_module(&mut module)?;

        let mut written = Vec::with_capacity(2);
        for (file_name, contents) in [
            (&self.options.header_file_name, header),
            (&self.options.module_file_name, module),
        ] {
            let path = output_dir.join(file_name);
            fs::write(&path, contents).map_err(|source| GeneratorError::Write {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "generated");
            written.push(path);
        }
        Ok(written)
    }

    // The enums required by the extension, in list order.
    fn required_enums(&self, extension: &ExtensionDescriptor) -> Vec<&'a EnumDescriptor> {
        let registry: &'a VideoRegistry = self.registry;
        extension
            .require
            .types
            .iter()
            .filter_map(|t| registry.entities().enums.get(t))
            .collect()
    }

    // The structs owned by the extension, in resolved order.
    fn required_structures(&self, extension: &ExtensionDescriptor) -> Vec<&'a StructureDescriptor> {
        let registry: &'a VideoRegistry = self.registry;
        extension
            .require
            .types
            .iter()
            .filter_map(|t| registry.entities().structures.get(t))
            .collect()
    }

    fn write_copyright<W: io::Write>(&self, out: &mut W) -> Result<(), io::Error> {
        for line in self.registry.copyright().lines() {
            let line = line.trim();
            if line.is_empty() {
                writeln!(out, "//")?;
            } else {
                writeln!(out, "// {}", line)?;
            }
        }
        writeln!(out)?;
        writeln!(
            out,
            "// This header is generated from the Khronos Vulkan XML API Registry."
        )?;
        writeln!(out)?;
        debug!("wrote copyright notice");
        Ok(())
    }

    fn format_section_banner(title: &str) -> String {
        let bar = "=".repeat(title.len() + 8);
        format!("//{}\n//=== {} ===\n//{}", bar, title, bar)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::video_registry::VideoRegistry;

    pub(crate) fn minimal_registry() -> VideoRegistry {
        VideoRegistry::read_from_str(
            r#"<registry>
    <comment>Copyright 2024 Example Authors
SPDX-License-Identifier: Apache-2.0</comment>
    <types>
        <type name="int"/>
    </types>
    <extensions>
        <extension name="example_ext" number="1" supported="vulkan">
            <require/>
        </extension>
    </extensions>
</registry>"#,
        )
        .unwrap()
    }

    #[test]
    fn section_banner() {
        assert_eq!(
            super::VideoHppCodeGenerator::format_section_banner("ENUMs"),
            "//=============\n//=== ENUMs ===\n//============="
        );
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use std::io::{self, Write};

use crate::video_registry::entities::ExtensionDescriptor;

use super::code_writer::IndentedCodeWriter;
use super::VideoHppCodeGenerator;

impl<'a> VideoHppCodeGenerator<'a> {
    pub(super) fn format_guard_begin(protect: &str) -> String {
        format!("#if defined( {} )", protect)
    }

    pub(super) fn format_guard_end(protect: &str) -> String {
        format!("#endif /*{}*/", protect)
    }

    // Emits the body wrapped into the extension's protect guard, if any,
    // and headed by the extension's name.
    pub(super) fn write_extension_section<W, F>(
        out: &mut IndentedCodeWriter<'_, W>,
        extension: &ExtensionDescriptor,
        body: F,
    ) -> Result<(), io::Error>
    where
        W: io::Write,
        F: FnOnce(&mut IndentedCodeWriter<'_, W>) -> Result<(), io::Error>,
    {
        writeln!(out)?;
        if let Some(protect) = &extension.protect {
            writeln!(out, "{}", Self::format_guard_begin(protect))?;
        }
        writeln!(out, "//=== {} ===", extension.name)?;
        body(out)?;
        if let Some(protect) = &extension.protect {
            writeln!(out, "{}", Self::format_guard_end(protect))?;
        }
        Ok(())
    }
}

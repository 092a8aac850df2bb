// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

#![allow(dead_code)]

use gen_video_hpp::video_registry::error::{RegistryError, SpecViolation};
use gen_video_hpp::video_registry::VideoRegistry;

pub const COPYRIGHT: &str = "Copyright 2021-2024 Example Authors\nSPDX-License-Identifier: Apache-2.0";

// Scalar types every test document may use for struct members.
pub const BASIC_TYPES: &str = r#"
        <type category="include" name="stdint">#include &lt;stdint.h&gt;</type>
        <type requires="stdint" name="uint8_t"/>
        <type requires="stdint" name="uint32_t"/>
        <type requires="stdint" name="int32_t"/>"#;

// Assembles a registry document from the inner markup of its <types>,
// <enums> and <extensions> sections.
pub fn document(types: &str, enums: &str, extensions: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<registry>
    <comment>
{}
    </comment>
    <types>{}{}
    </types>
{}
    <extensions>{}
    </extensions>
</registry>
"#,
        COPYRIGHT, BASIC_TYPES, types, enums, extensions
    )
}

pub fn read(types: &str, enums: &str, extensions: &str) -> Result<VideoRegistry, RegistryError> {
    VideoRegistry::read_from_str(&document(types, enums, extensions))
}

pub fn violation(types: &str, enums: &str, extensions: &str) -> SpecViolation {
    match read(types, enums, extensions) {
        Ok(_) => panic!("registry unexpectedly accepted"),
        Err(e) => match e.violation() {
            Some(v) => v.clone(),
            None => panic!("expected a registry violation, got: {}", e),
        },
    }
}

pub fn required_types(registry: &VideoRegistry, extension: &str) -> Vec<String> {
    registry
        .extension(extension)
        .map(|e| e.require.types.clone())
        .unwrap_or_default()
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use crate::video_registry::entities::to_upper_snake_case;

use super::VideoHppCodeGenerator;

impl<'a> VideoHppCodeGenerator<'a> {
    // "CPB_CNT_LIST_SIZE" -> "CpbCntListSize", "4_2_0" -> "4_2_0". An
    // underscore is only retained where it separates two digits.
    pub(super) fn camelize(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        let chars: Vec<char> = s.chars().collect();
        for (i, c) in chars.iter().enumerate() {
            if *c == '_' {
                if i > 0
                    && i + 1 < chars.len()
                    && chars[i - 1].is_ascii_digit()
                    && chars[i + 1].is_ascii_digit()
                {
                    result.push('_');
                }
            } else if i > 0 && chars[i - 1] != '_' {
                result.push(c.to_ascii_lowercase());
            } else {
                result.push(*c);
            }
        }
        result
    }

    // "StdVideoH264SpsFlags" -> "H264SpsFlags"
    pub(super) fn strip_native_prefix<'b>(&self, name: &'b str) -> &'b str {
        name.strip_prefix(self.options.native_prefix.as_str())
            .unwrap_or(name)
    }

    // "STD_VIDEO_H264_CHROMA_FORMAT_IDC_MONOCHROME" of enum
    // "StdVideoH264ChromaFormatIdc" -> "eMonochrome"
    pub(super) fn format_enum_value_name(enum_name: &str, value_name: &str) -> String {
        let prefix = to_upper_snake_case(enum_name) + "_";
        let stripped = value_name.strip_prefix(prefix.as_str()).unwrap_or(value_name);
        "e".to_owned() + &Self::camelize(stripped)
    }

    // "STD_VIDEO_H264_CPB_CNT_LIST_SIZE" -> "H264CpbCntListSize"
    pub(super) fn format_constant_name(&self, name: &str) -> String {
        let prefix = to_upper_snake_case(&self.options.native_prefix) + "_";
        Self::camelize(name.strip_prefix(prefix.as_str()).unwrap_or(name))
    }

    // "vulkan_video.hpp" -> "VULKAN_VIDEO_HPP"
    pub(super) fn format_include_guard(file_name: &str) -> String {
        file_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::minimal_registry;
    use super::super::{GeneratorOptions, VideoHppCodeGenerator};

    #[test]
    fn camelize() {
        assert_eq!(VideoHppCodeGenerator::camelize("MONOCHROME"), "Monochrome");
        assert_eq!(
            VideoHppCodeGenerator::camelize("CPB_CNT_LIST_SIZE"),
            "CpbCntListSize"
        );
        assert_eq!(VideoHppCodeGenerator::camelize("4_2_0"), "4_2_0");
        assert_eq!(VideoHppCodeGenerator::camelize("H264_LEVEL_1_0"), "H264Level1_0");
    }

    #[test]
    fn enum_value_names() {
        assert_eq!(
            VideoHppCodeGenerator::format_enum_value_name(
                "StdVideoH264ChromaFormatIdc",
                "STD_VIDEO_H264_CHROMA_FORMAT_IDC_MONOCHROME"
            ),
            "eMonochrome"
        );
        assert_eq!(
            VideoHppCodeGenerator::format_enum_value_name("ExampleType", "EXAMPLE_TYPE_FOO"),
            "eFoo"
        );
    }

    #[test]
    fn option_dependent_names() {
        let registry = minimal_registry();
        let options = GeneratorOptions::default();
        let codegen = VideoHppCodeGenerator::new(&registry, &options);
        assert_eq!(
            codegen.format_constant_name("STD_VIDEO_H264_CPB_CNT_LIST_SIZE"),
            "H264CpbCntListSize"
        );
        assert_eq!(
            codegen.strip_native_prefix("StdVideoH264SpsFlags"),
            "H264SpsFlags"
        );
        assert_eq!(codegen.strip_native_prefix("uint32_t"), "uint32_t");
        assert_eq!(
            VideoHppCodeGenerator::format_include_guard("vulkan_video.hpp"),
            "VULKAN_VIDEO_HPP"
        );
    }
}

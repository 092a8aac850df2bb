// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

mod common;

use pretty_assertions::assert_eq;

use common::{document, read, violation};
use gen_video_hpp::video_registry::error::SpecViolation;
use gen_video_hpp::video_registry::VideoRegistry;

const TABLE_STRUCT: &str = r#"
        <type category="struct" name="StdVideoTable">
            <member><type>uint8_t</type> <name>entries</name>[<enum>STD_VIDEO_TABLE_SIZE</enum>]</member>
        </type>"#;

#[test]
fn unresolved_array_size_is_fatal() {
    let extensions = r#"
        <extension name="ext1" number="1" supported="vulkan">
            <require>
                <enum name="STD_VIDEO_OTHER_SIZE" value="4"/>
                <type name="StdVideoTable"/>
            </require>
        </extension>"#;
    let doc = document(TABLE_STRUCT, "", extensions);
    let member_line = doc
        .lines()
        .position(|l| l.contains("<name>entries</name>"))
        .unwrap() as u32
        + 1;

    let err = VideoRegistry::read_from_str(&doc).unwrap_err();
    assert_eq!(
        err.violation(),
        Some(&SpecViolation::UnresolvedArraySize {
            member: "entries".to_owned(),
            constant: "STD_VIDEO_TABLE_SIZE".to_owned(),
        })
    );
    assert_eq!(err.line(), Some(member_line));
    assert!(err.to_string().starts_with(&format!("line {}: ", member_line)));
}

#[test]
fn array_size_resolves_through_depends() {
    let extensions = r#"
        <extension name="vulkan_video_codecs_common" number="1" supported="vulkan">
            <require>
                <enum name="STD_VIDEO_TABLE_SIZE" value="4"/>
            </require>
        </extension>
        <extension name="vulkan_video_codec_example" number="2" supported="vulkan">
            <require>
                <type name="vk_video/vulkan_video_codecs_common.h"/>
                <type name="StdVideoTable"/>
            </require>
        </extension>"#;
    let registry = read(TABLE_STRUCT, "", extensions).unwrap();
    assert!(registry.warnings().is_empty());
}

#[test]
fn struct_never_required_is_fatal() {
    let types = r#"
        <type category="struct" name="StdVideoOrphan">
            <member><type>uint32_t</type> <name>value</name></member>
        </type>"#;
    let extensions = r#"
        <extension name="ext1" number="1" supported="vulkan"><require/></extension>"#;
    assert_eq!(
        violation(types, "", extensions),
        SpecViolation::NeverRequired("StdVideoOrphan".to_owned())
    );
}

#[test]
fn unknown_member_type_is_fatal() {
    let types = r#"
        <type category="struct" name="StdVideoExample">
            <member><type>StdVideoMissing</type> <name>missing</name></member>
        </type>"#;
    let extensions = r#"
        <extension name="ext1" number="1" supported="vulkan">
            <require><type name="StdVideoExample"/></require>
        </extension>"#;
    assert_eq!(
        violation(types, "", extensions),
        SpecViolation::UnknownMemberType {
            member: "missing".to_owned(),
            member_type: "StdVideoMissing".to_owned(),
        }
    );
}

#[test]
fn unrequired_api_types_only_warn() {
    let types = r#"
        <type category="enum" name="StdVideoExampleMode"/>
        <type category="struct" name="StdVideoExample">
            <member><type>StdVideoExampleMode</type> <name>mode</name></member>
        </type>"#;
    let enums = r#"
    <enums name="StdVideoExampleMode" type="enum">
        <enum name="STD_VIDEO_EXAMPLE_MODE_OFF" value="0"/>
    </enums>"#;
    let extensions = r#"
        <extension name="ext1" number="1" supported="vulkan">
            <require><type name="StdVideoExample"/></require>
        </extension>"#;
    let registry = read(types, enums, extensions).unwrap();

    let messages: Vec<&str> = registry
        .warnings()
        .iter()
        .map(|w| w.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec![
            "struct member type <StdVideoExampleMode> used in struct <StdVideoExample> is never required for any extension",
            "enum <StdVideoExampleMode> is never required for any extension",
        ]
    );
}

#[test]
fn enum_required_by_two_extensions_is_fatal() {
    let types = r#"
        <type category="enum" name="StdVideoExampleMode"/>"#;
    let extensions = r#"
        <extension name="ext1" number="1" supported="vulkan">
            <require><type name="StdVideoExampleMode"/></require>
        </extension>
        <extension name="ext2" number="2" supported="vulkan">
            <require><type name="StdVideoExampleMode"/></require>
        </extension>"#;
    assert_eq!(
        violation(types, "", extensions),
        SpecViolation::MultipleOwners {
            name: "StdVideoExampleMode".to_owned(),
            owners: vec!["ext1".to_owned(), "ext2".to_owned()],
        }
    );
}

#[test]
fn repeated_requirement_only_warns() {
    let types = r#"
        <type category="enum" name="StdVideoExampleMode"/>"#;
    let extensions = r#"
        <extension name="ext1" number="1" supported="vulkan">
            <require><type name="StdVideoExampleMode"/></require>
            <require><type name="StdVideoExampleMode"/></require>
        </extension>"#;
    let registry = read(types, "", extensions).unwrap();
    assert_eq!(
        registry.extension("ext1").unwrap().require.types,
        vec!["StdVideoExampleMode".to_owned()]
    );
    assert_eq!(registry.warnings().len(), 1);
    assert_eq!(
        registry.warnings()[0].message,
        "type <StdVideoExampleMode> required more than once by extension <ext1>"
    );
}

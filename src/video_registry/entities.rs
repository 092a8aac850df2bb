// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

// Per-category detail tables, keyed by type name.

use std::collections::HashMap;

use bitflags::bitflags;

use super::error::{RegistryError, SpecViolation};
use super::type_registry::TypeCategory;

bitflags! {
    pub struct TypeQualifiers: u32 {
        const CONST = 0x01;
        const POINTER = 0x02;
        const POINTER_TO_POINTER = 0x04;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberType {
    pub name: String,
    pub qualifiers: TypeQualifiers,
}

impl MemberType {
    pub fn is_pointer(&self) -> bool {
        self.qualifiers
            .intersects(TypeQualifiers::POINTER | TypeQualifiers::POINTER_TO_POINTER)
    }
}

#[derive(Clone, Debug)]
pub struct MemberDescriptor {
    pub name: String,
    pub member_type: MemberType,
    // Each dimension is either a decimal literal or a constant's name.
    pub array_sizes: Vec<String>,
    pub bit_width: Option<u32>,
    pub len: Option<String>,
    pub optional: bool,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct StructureDescriptor {
    pub name: String,
    // Declaration order, the emitted layout mirrors it.
    pub members: Vec<MemberDescriptor>,
    pub comment: Option<String>,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct EnumAlias {
    pub name: String,
    pub deprecated: Option<String>,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub value: String,
    pub comment: Option<String>,
    pub aliases: Vec<EnumAlias>,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct EnumDescriptor {
    pub name: String,
    pub values: Vec<EnumValueDescriptor>,
    pub line: u32,
}

impl EnumDescriptor {
    pub fn new(name: String, line: u32) -> Self {
        Self {
            name,
            values: Vec::new(),
            line,
        }
    }

    // Every value's name must start with this.
    pub fn value_prefix(&self) -> String {
        to_upper_snake_case(&self.name) + "_"
    }

    pub fn find_value(&self, name: &str) -> Option<usize> {
        self.values.iter().position(|v| v.name == name)
    }

    pub fn has_alias(&self, name: &str) -> bool {
        self.values
            .iter()
            .any(|v| v.aliases.iter().any(|a| a.name == name))
    }
}

#[derive(Clone, Debug)]
pub struct DefineDescriptor {
    pub name: String,
    // Another define this one is textually based on.
    pub requires: Option<String>,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct IncludeDescriptor {
    pub name: String,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct ExternalTypeDescriptor {
    pub name: String,
    pub include: String,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantDescriptor {
    pub name: String,
    pub type_name: String,
    pub value: String,
    pub line: u32,
}

#[derive(Clone, Debug, Default)]
pub struct RequireBlock {
    // The resolver inserts into and reorders this list, it never duplicates.
    pub types: Vec<String>,
    pub constants: Vec<ConstantDescriptor>,
}

impl RequireBlock {
    pub fn constant(&self, name: &str) -> Option<&ConstantDescriptor> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn requires_type(&self, name: &str) -> bool {
        self.types.iter().any(|t| t == name)
    }
}

#[derive(Clone, Debug)]
pub struct ExtensionDescriptor {
    pub name: String,
    pub number: u32,
    pub comment: Option<String>,
    // Conditional compilation guard.
    pub protect: Option<String>,
    pub depends: Option<String>,
    pub require: RequireBlock,
    pub line: u32,
}

pub trait Named {
    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($t:ty),*) => {
        $(impl Named for $t {
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_named!(
    StructureDescriptor,
    EnumDescriptor,
    DefineDescriptor,
    IncludeDescriptor,
    ExternalTypeDescriptor
);

// Entries in insertion order plus a by-name index.
#[derive(Debug)]
pub struct NamedTable<T: Named> {
    category: TypeCategory,
    entries: Vec<T>,
    name_to_entry: HashMap<String, usize>,
}

impl<T: Named> NamedTable<T> {
    fn new(category: TypeCategory) -> Self {
        Self {
            category,
            entries: Vec::new(),
            name_to_entry: HashMap::new(),
        }
    }

    pub(super) fn insert(&mut self, entry: T, line: u32) -> Result<(), RegistryError> {
        if self.name_to_entry.contains_key(entry.name()) {
            return Err(RegistryError::at_line(
                line,
                SpecViolation::DuplicateDefinition {
                    category: self.category,
                    name: entry.name().to_owned(),
                },
            ));
        }
        self.name_to_entry
            .insert(entry.name().to_owned(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.name_to_entry.get(name).map(|i| &self.entries[*i])
    }

    pub(super) fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.name_to_entry.get(name) {
            Some(i) => Some(&mut self.entries[*i]),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_entry.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
pub struct EntityTables {
    pub structures: NamedTable<StructureDescriptor>,
    pub enums: NamedTable<EnumDescriptor>,
    pub external_types: NamedTable<ExternalTypeDescriptor>,
    pub includes: NamedTable<IncludeDescriptor>,
    pub defines: NamedTable<DefineDescriptor>,
}

impl EntityTables {
    pub fn new() -> Self {
        Self {
            structures: NamedTable::new(TypeCategory::Struct),
            enums: NamedTable::new(TypeCategory::Enum),
            external_types: NamedTable::new(TypeCategory::ExternalType),
            includes: NamedTable::new(TypeCategory::Include),
            defines: NamedTable::new(TypeCategory::Define),
        }
    }
}

impl Default for EntityTables {
    fn default() -> Self {
        Self::new()
    }
}

// "StdVideoH264ChromaFormatIdc" -> "STD_VIDEO_H264_CHROMA_FORMAT_IDC"
pub fn to_upper_snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 8);
    let mut previous_is_lowercase = false;
    let mut previous_is_digit = false;
    for c in name.chars() {
        if (c.is_ascii_uppercase() && (previous_is_lowercase || previous_is_digit))
            || (c.is_ascii_digit() && previous_is_lowercase)
        {
            result.push('_');
        }
        result.push(c.to_ascii_uppercase());
        previous_is_lowercase = c.is_ascii_lowercase();
        previous_is_digit = c.is_ascii_digit();
    }
    result
}

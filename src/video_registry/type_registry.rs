// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use std::collections::{BTreeSet, HashMap};

use super::error::{RegistryError, SpecViolation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Struct,
    Enum,
    ExternalType,
    Include,
    Define,
    Unknown,
}

#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    pub name: String,
    pub category: TypeCategory,
    pub line: u32,
    // Names of the extensions having pulled this type into scope.
    pub required_by: BTreeSet<String>,
}

impl TypeDescriptor {
    fn new(name: String, category: TypeCategory, line: u32) -> Self {
        Self {
            name,
            category,
            line,
            required_by: BTreeSet::new(),
        }
    }

    // The single owning extension, if there's exactly one.
    pub fn owner(&self) -> Option<&str> {
        if self.required_by.len() == 1 {
            self.required_by.iter().next().map(|s| s.as_str())
        } else {
            None
        }
    }
}

/// Name to descriptor lookup for every type declared in the registry's types
/// section. Entries are never removed.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: Vec<TypeDescriptor>,
    name_to_type: HashMap<String, usize>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        &mut self,
        name: &str,
        category: TypeCategory,
        line: u32,
    ) -> Result<(), RegistryError> {
        if self.name_to_type.contains_key(name) {
            return Err(RegistryError::at_line(
                line,
                SpecViolation::DuplicateType(name.to_owned()),
            ));
        }
        self.name_to_type.insert(name.to_owned(), self.types.len());
        self.types
            .push(TypeDescriptor::new(name.to_owned(), category, line));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        self.name_to_type.get(name).map(|i| &self.types[*i])
    }

    pub(super) fn lookup_mut(&mut self, name: &str) -> Option<&mut TypeDescriptor> {
        match self.name_to_type.get(name) {
            Some(i) => Some(&mut self.types[*i]),
            None => None,
        }
    }

    pub fn category_of(&self, name: &str) -> Option<TypeCategory> {
        self.lookup(name).map(|t| t.category)
    }

    pub fn is_struct(&self, name: &str) -> bool {
        self.category_of(name) == Some(TypeCategory::Struct)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_type.contains_key(name)
    }

    // In declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }
}

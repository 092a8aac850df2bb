// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

// The video codec API registry: its types, enums, structures and the
// extensions pulling them into scope.

use std::fs;
use std::path;

use tracing::debug;

pub mod checks;
pub mod entities;
pub mod error;
pub mod type_registry;
pub mod xml;

mod check_impl;
mod read_xml_impl;
mod resolve_impl;

use checks::Diagnostics;
use entities::{EntityTables, ExtensionDescriptor};
use error::{RegistryError, SpecWarning};
use read_xml_impl::RegistryRegexpsCache;
use type_registry::TypeRegistry;
use xml::XmlElement;

// Member types with this prefix belong to the API family described by the
// registry and are expected to be required by some extension.
pub const API_TYPE_PREFIX: &str = "StdVideo";

/// A fully read, dependency resolved and checked registry. Immutable once
/// constructed; emission code only ever reads from it.
#[derive(Debug)]
pub struct VideoRegistry {
    copyright: String,
    types: TypeRegistry,
    entities: EntityTables,
    extensions: Vec<ExtensionDescriptor>,
    warnings: Vec<SpecWarning>,
}

impl VideoRegistry {
    pub fn read_from_file(path: &path::Path) -> Result<Self, RegistryError> {
        let doc = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_owned(),
            source,
        })?;
        debug!(path = %path.display(), "loaded registry document");
        Self::read_from_str(&doc)
    }

    pub fn read_from_str(doc: &str) -> Result<Self, RegistryError> {
        let root = XmlElement::parse(doc)?;
        Self::read_from_element(&root)
    }

    pub fn read_from_element(root: &XmlElement) -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::new();

        builder.read_registry(root)?;
        debug!(
            extensions = builder.extensions.len(),
            structures = builder.entities.structures.len(),
            enums = builder.entities.enums.len(),
            "read registry"
        );

        builder.add_implicitly_required_types()?;
        builder.sort_structs()?;
        debug!("resolved struct dependencies");

        builder.check_correctness()?;
        debug!("registry checks passed");

        Ok(builder.finish())
    }

    pub fn copyright(&self) -> &str {
        &self.copyright
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn entities(&self) -> &EntityTables {
        &self.entities
    }

    // In document order.
    pub fn extensions(&self) -> &[ExtensionDescriptor] {
        &self.extensions
    }

    pub fn extension(&self, name: &str) -> Option<&ExtensionDescriptor> {
        find_extension(&self.extensions, name)
    }

    pub fn warnings(&self) -> &[SpecWarning] {
        &self.warnings
    }
}

// The per-document working state. The three phases are methods on this,
// spread over read_xml_impl, resolve_impl and check_impl, and only ever get
// invoked in sequence from VideoRegistry::read_from_element().
struct RegistryBuilder {
    // Set while reading; empty until the copyright comment has been seen.
    copyright: String,
    types: TypeRegistry,
    entities: EntityTables,
    extensions: Vec<ExtensionDescriptor>,
    diagnostics: Diagnostics,
    regexps: RegistryRegexpsCache,
}

impl RegistryBuilder {
    fn new() -> Self {
        Self {
            copyright: String::new(),
            types: TypeRegistry::new(),
            entities: EntityTables::new(),
            extensions: Vec::new(),
            diagnostics: Diagnostics::new(),
            regexps: RegistryRegexpsCache::new(),
        }
    }

    fn finish(self) -> VideoRegistry {
        VideoRegistry {
            copyright: self.copyright,
            types: self.types,
            entities: self.entities,
            extensions: self.extensions,
            warnings: self.diagnostics.into_warnings(),
        }
    }
}

fn find_extension<'a>(
    extensions: &'a [ExtensionDescriptor],
    name: &str,
) -> Option<&'a ExtensionDescriptor> {
    extensions.iter().find(|e| e.name == name)
}

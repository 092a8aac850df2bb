// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

// Completion and ordering of each extension's list of required types, such
// that every struct gets emitted by exactly one extension and only after all
// the structs it embeds.

use std::collections::HashMap;
use std::mem;

use tracing::debug;

use super::entities::ExtensionDescriptor;
use super::error::{RegistryError, SpecViolation};
use super::find_extension;
use super::RegistryBuilder;

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

impl RegistryBuilder {
    // The struct typed members of the given struct, with their lines.
    // Members referring to a struct through a pointer are included: the
    // emitted wrapper member names the wrapper type of that struct, which
    // therefore has to be defined first.
    fn struct_member_types(&self, structure: &str) -> Vec<(String, u32)> {
        match self.entities.structures.get(structure) {
            Some(s) => s
                .members
                .iter()
                .filter(|m| self.types.is_struct(&m.member_type.name))
                .map(|m| (m.member_type.name.clone(), m.line))
                .collect(),
            None => Vec::new(),
        }
    }

    // Structs embedded in a required struct are required as well, even if not
    // listed explicitly. Insert any such struct not claimed by some extension
    // yet right in front of its first user.
    pub(super) fn add_implicitly_required_types(&mut self) -> Result<(), RegistryError> {
        for i in 0..self.extensions.len() {
            let extension_name = self.extensions[i].name.clone();
            let depends = self.extensions[i].depends.clone();
            let listed = mem::take(&mut self.extensions[i].require.types);
            let mut completed = Vec::with_capacity(listed.len());

            for name in listed.into_iter() {
                if self.types.is_struct(&name) {
                    let mut path = vec![name.clone()];
                    self.inject_member_types(
                        &name,
                        &extension_name,
                        depends.as_deref(),
                        &mut path,
                        &mut completed,
                    )?;
                }
                completed.push(name);
            }

            self.extensions[i].require.types = completed;
        }
        Ok(())
    }

    fn inject_member_types(
        &mut self,
        structure: &str,
        extension: &str,
        depends: Option<&str>,
        path: &mut Vec<String>,
        completed: &mut Vec<String>,
    ) -> Result<(), RegistryError> {
        for (member_type, line) in self.struct_member_types(structure) {
            if path.contains(&member_type) {
                return Err(RegistryError::at_line(
                    line,
                    SpecViolation::DependencyCycle {
                        structure: structure.to_owned(),
                        member_type,
                    },
                ));
            }

            let type_data = match self.types.lookup_mut(&member_type) {
                Some(type_data) => type_data,
                None => continue,
            };
            if type_data.required_by.is_empty() {
                debug!(
                    extension,
                    structure,
                    member_type = %member_type,
                    "adding implicitly required struct"
                );
                type_data.required_by.insert(extension.to_owned());
                path.push(member_type.clone());
                self.inject_member_types(&member_type, extension, depends, path, completed)?;
                path.pop();
                completed.push(member_type);
                continue;
            }

            // Claimed already, which is fine if by this extension or by the
            // one it depends on.
            let owners: Vec<String> = type_data.required_by.iter().cloned().collect();
            if owners.len() > 1 {
                return Err(RegistryError::at_line(
                    line,
                    SpecViolation::MultipleOwners {
                        name: member_type,
                        owners,
                    },
                ));
            }
            let owner = &owners[0];
            if owner != extension && Some(owner.as_str()) != depends {
                return Err(RegistryError::at_line(
                    line,
                    SpecViolation::ConflictingOwnership {
                        name: member_type,
                        extension: extension.to_owned(),
                        owner: owner.clone(),
                    },
                ));
            }
        }
        Ok(())
    }

    // Reorder each extension's list such that a struct never precedes any
    // struct it embeds. Relative order is retained otherwise.
    pub(super) fn sort_structs(&mut self) -> Result<(), RegistryError> {
        for i in 0..self.extensions.len() {
            let listed = mem::take(&mut self.extensions[i].require.types);
            let sorted = self.sort_extension_types(&self.extensions[i], &listed)?;
            self.extensions[i].require.types = sorted;
        }
        Ok(())
    }

    fn sort_extension_types(
        &self,
        extension: &ExtensionDescriptor,
        listed: &[String],
    ) -> Result<Vec<String>, RegistryError> {
        let mut states = HashMap::new();
        let mut sorted = Vec::with_capacity(listed.len());
        for name in listed.iter() {
            self.visit_sorted(extension, name, listed, &mut states, &mut sorted)?;
        }
        Ok(sorted)
    }

    fn visit_sorted(
        &self,
        extension: &ExtensionDescriptor,
        name: &str,
        listed: &[String],
        states: &mut HashMap<String, VisitState>,
        sorted: &mut Vec<String>,
    ) -> Result<(), RegistryError> {
        if states.contains_key(name) {
            return Ok(());
        }
        states.insert(name.to_owned(), VisitState::InProgress);

        for (member_type, line) in self.struct_member_types(name) {
            match states.get(&member_type) {
                Some(VisitState::Done) => continue,
                Some(VisitState::InProgress) => {
                    return Err(RegistryError::at_line(
                        line,
                        SpecViolation::DependencyCycle {
                            structure: name.to_owned(),
                            member_type,
                        },
                    ));
                }
                None => (),
            }

            if listed.contains(&member_type) {
                debug!(
                    extension = %extension.name,
                    structure = name,
                    member_type = %member_type,
                    "moving struct in front of its user"
                );
                self.visit_sorted(extension, &member_type, listed, states, sorted)?;
                continue;
            }

            // Not listed here, so the extension depended upon must have it.
            let satisfied = extension
                .depends
                .as_deref()
                .and_then(|d| find_extension(&self.extensions, d))
                .map(|d| d.require.requires_type(&member_type))
                .unwrap_or(false);
            if !satisfied {
                return Err(RegistryError::at_line(
                    line,
                    SpecViolation::UnsatisfiedStructDependency {
                        extension: extension.name.clone(),
                        structure: name.to_owned(),
                        member_type,
                    },
                ));
            }
        }

        states.insert(name.to_owned(), VisitState::Done);
        sorted.push(name.to_owned());
        Ok(())
    }
}

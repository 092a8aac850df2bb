// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use super::checks::is_number;
use super::error::{check_for_error, RegistryError, SpecViolation};
use super::find_extension;
use super::RegistryBuilder;
use super::API_TYPE_PREFIX;

impl RegistryBuilder {
    // Whole-model invariants, only verifiable once everything has been read
    // and resolved.
    pub(super) fn check_correctness(&mut self) -> Result<(), RegistryError> {
        for structure in self.entities.structures.iter() {
            let line = structure.line;
            let type_data = match self.types.lookup(&structure.name) {
                Some(type_data) => type_data,
                None => {
                    return Err(RegistryError::at_line(
                        line,
                        SpecViolation::UnknownType(structure.name.clone()),
                    ));
                }
            };
            check_for_error(!type_data.required_by.is_empty(), line, || {
                SpecViolation::NeverRequired(structure.name.clone())
            })?;
            let owner = match type_data.owner() {
                Some(owner) => owner,
                None => {
                    return Err(RegistryError::at_line(
                        line,
                        SpecViolation::MultipleOwners {
                            name: structure.name.clone(),
                            owners: type_data.required_by.iter().cloned().collect(),
                        },
                    ));
                }
            };
            // Ownership is only ever recorded for extensions read before.
            let owner = match find_extension(&self.extensions, owner) {
                Some(owner) => owner,
                None => continue,
            };
            let depends = owner
                .depends
                .as_deref()
                .and_then(|d| find_extension(&self.extensions, d));

            for member in structure.members.iter() {
                let member_type = &member.member_type.name;
                let member_type_data = match self.types.lookup(member_type) {
                    Some(t) => t,
                    None => {
                        return Err(RegistryError::at_line(
                            member.line,
                            SpecViolation::UnknownMemberType {
                                member: member.name.clone(),
                                member_type: member_type.clone(),
                            },
                        ));
                    }
                };

                if member_type.starts_with(API_TYPE_PREFIX) {
                    self.diagnostics.check_for_warning(
                        !member_type_data.required_by.is_empty(),
                        member.line,
                        || {
                            format!(
                                "struct member type <{}> used in struct <{}> is never required for any extension",
                                member_type, structure.name
                            )
                        },
                    );
                }

                for size in member.array_sizes.iter().filter(|s| !is_number(s)) {
                    let resolved = owner.require.constant(size).is_some()
                        || depends
                            .map(|d| d.require.constant(size).is_some())
                            .unwrap_or(false);
                    check_for_error(resolved, member.line, || {
                        SpecViolation::UnresolvedArraySize {
                            member: member.name.clone(),
                            constant: size.clone(),
                        }
                    })?;
                }
            }
        }

        for enum_data in self.entities.enums.iter() {
            let type_data = match self.types.lookup(&enum_data.name) {
                Some(type_data) => type_data,
                None => continue,
            };
            match type_data.required_by.len() {
                0 => self.diagnostics.warn(
                    enum_data.line,
                    format!("enum <{}> is never required for any extension", enum_data.name),
                ),
                1 => (),
                _ => {
                    return Err(RegistryError::at_line(
                        enum_data.line,
                        SpecViolation::MultipleOwners {
                            name: enum_data.name.clone(),
                            owners: type_data.required_by.iter().cloned().collect(),
                        },
                    ));
                }
            }
        }
        Ok(())
    }
}

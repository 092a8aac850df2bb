// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use std::fmt;
use std::io;
use std::path;

use thiserror::Error;

use super::type_registry::TypeCategory;

// Where in the registry document a problem was detected. Whole-document
// checks, like the one for the copyright message, have no line to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecLocation {
    Line(u32),
    Document,
}

impl fmt::Display for SpecLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => write!(f, "line {}", line),
            Self::Document => write!(f, "document"),
        }
    }
}

/// Fatal registry errors. Any of these rejects the whole document.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SpecViolation {
    #[error("missing attribute <{0}>")]
    MissingAttribute(String),
    #[error("unexpected attribute value <{value}> in attribute <{attribute}>")]
    UnexpectedAttributeValue { attribute: String, value: String },
    #[error("missing required element <{0}>")]
    MissingElement(String),
    #[error("required element <{element}> is supposed to be listed exactly once, but is listed {count} times")]
    ElementMultiplicity { element: String, count: usize },
    #[error("element <{0}> is missing its text")]
    MissingText(String),

    #[error("type <{0}> already specified")]
    DuplicateType(String),
    #[error("{category:?} <{name}> already specified")]
    DuplicateDefinition { category: TypeCategory, name: String },
    #[error("unknown category <{0}> encountered")]
    UnknownCategory(String),
    #[error("unknown type <{0}>")]
    UnknownType(String),
    #[error("type <{name}> requires unknown include <{include}>")]
    UnknownInclude { name: String, include: String },
    #[error("define <{name}> requires unknown define <{define}>")]
    UnknownDefine { name: String, define: String },

    #[error("enum <{0}> is not listed as enum in the types section")]
    EnumNotDeclared(String),
    #[error("enum <{0}> already holds values")]
    EnumAlreadyPopulated(String),
    #[error("enum value <{name}> does not begin with expected prefix <{prefix}>")]
    ValuePrefixMismatch { name: String, prefix: String },
    #[error("<{0}> is neither a decimal nor a hexadecimal literal")]
    InvalidLiteral(String),
    #[error("enum value <{value}> already part of enum <{enum_name}>")]
    DuplicateEnumValue { enum_name: String, value: String },
    #[error("alias <{alias}> refers to unknown enum value <{target}>")]
    UnknownAliasTarget { alias: String, target: String },
    #[error("alias <{0}> already specified")]
    DuplicateAlias(String),

    #[error("extension <{0}> already specified")]
    DuplicateExtensionName(String),
    #[error("extension number <{number}> of <{name}> already used by <{other}>")]
    DuplicateExtensionNumber {
        name: String,
        number: u32,
        other: String,
    },
    #[error("extension <{extension}> already depends on <{depends}>")]
    DuplicateDepends { extension: String, depends: String },
    #[error("extension <{extension}> depends on unknown extension <{depends}>")]
    UnknownDependsExtension { extension: String, depends: String },
    #[error("required enum <{0}> already specified")]
    DuplicateConstant(String),
    #[error("extension <{extension}> references unknown constant <{constant}>")]
    UnknownConstant { extension: String, constant: String },

    #[error("member <{member}> of struct <{structure}> already specified")]
    DuplicateMember { structure: String, member: String },
    #[error("member <{member}> has malformed modifiers <{text}>")]
    MalformedModifiers { member: String, text: String },

    #[error("structure <{0}> not required by any extension")]
    NeverRequired(String),
    #[error("type <{name}> is required by more than one extension: {owners:?}")]
    MultipleOwners { name: String, owners: Vec<String> },
    #[error("struct <{name}> needed by extension <{extension}> is already owned by unrelated extension <{owner}>")]
    ConflictingOwnership {
        name: String,
        extension: String,
        owner: String,
    },
    #[error("struct <{structure}> depends on itself through member type <{member_type}>")]
    DependencyCycle {
        structure: String,
        member_type: String,
    },
    #[error("struct <{structure}> in extension <{extension}> uses struct <{member_type}>, which is neither listed by that extension nor by its dependency")]
    UnsatisfiedStructDependency {
        extension: String,
        structure: String,
        member_type: String,
    },
    #[error("struct member <{member}> uses unknown type <{member_type}>")]
    UnknownMemberType { member: String, member_type: String },
    #[error("struct member <{member}> uses unknown constant <{constant}> as array size")]
    UnresolvedArraySize { member: String, constant: String },
    #[error("missing copyright message")]
    MissingCopyright,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry file {}: {source}", .path.display())]
    Io {
        path: path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed XML at line {line}: {message}")]
    Xml { line: u32, message: String },
    #[error("{location}: {violation}")]
    Spec {
        location: SpecLocation,
        violation: SpecViolation,
    },
}

impl RegistryError {
    pub fn at_line(line: u32, violation: SpecViolation) -> Self {
        Self::Spec {
            location: SpecLocation::Line(line),
            violation,
        }
    }

    pub fn in_document(violation: SpecViolation) -> Self {
        Self::Spec {
            location: SpecLocation::Document,
            violation,
        }
    }

    pub fn violation(&self) -> Option<&SpecViolation> {
        match self {
            Self::Spec { violation, .. } => Some(violation),
            _ => None,
        }
    }

    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Spec {
                location: SpecLocation::Line(line),
                ..
            } => Some(*line),
            Self::Xml { line, .. } => Some(*line),
            _ => None,
        }
    }
}

// Fail with the given violation unless cond holds.
pub(super) fn check_for_error(
    cond: bool,
    line: u32,
    violation: impl FnOnce() -> SpecViolation,
) -> Result<(), RegistryError> {
    if cond {
        Ok(())
    } else {
        Err(RegistryError::at_line(line, violation()))
    }
}

/// A non-fatal finding. The document is still accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecWarning {
    pub line: u32,
    pub message: String,
}

impl fmt::Display for SpecWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

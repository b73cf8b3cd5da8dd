// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filesystem layout lookup.

use alloc::borrow::ToOwned;
use alloc::string::String;
use std::path::{Path, PathBuf};

use crate::error::LayoutError;
use crate::loader::LayoutSource;

/// Directory searched for system-wide layouts.
pub const SYSTEM_LAYOUT_DIR: &str = "/usr/share/understory/keyboard/layouts";

/// Directory under `$HOME` searched for user layouts.
pub const USER_LAYOUT_DIR: &str = ".config/understory/keyboard/layouts";

/// Where to look for layout documents.
///
/// Names are resolved in order: an absolute path as given, then the system
/// directory, then the user directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutSearchPaths {
    /// System directory.
    pub system: PathBuf,
    /// User directory, if any.
    pub user: Option<PathBuf>,
}

impl Default for LayoutSearchPaths {
    fn default() -> Self {
        Self {
            system: PathBuf::from(SYSTEM_LAYOUT_DIR),
            user: std::env::var_os("HOME").map(|home| PathBuf::from(home).join(USER_LAYOUT_DIR)),
        }
    }
}

impl LayoutSearchPaths {
    /// Search paths with only a system directory.
    pub fn with_system(system: impl Into<PathBuf>) -> Self {
        Self {
            system: system.into(),
            user: None,
        }
    }

    /// Resolves a document name to an existing file.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        core::iter::once(&self.system)
            .chain(self.user.as_ref())
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

/// A [`LayoutSource`] reading from [`LayoutSearchPaths`].
#[derive(Clone, Debug, Default)]
pub struct FileSource {
    paths: LayoutSearchPaths,
}

impl FileSource {
    /// Creates a source over `paths`.
    pub fn new(paths: LayoutSearchPaths) -> Self {
        Self { paths }
    }
}

impl LayoutSource for FileSource {
    fn read(&self, name: &str) -> Result<String, LayoutError> {
        let path = self.paths.resolve(name).ok_or_else(|| LayoutError::NotFound {
            name: name.to_owned(),
        })?;
        std::fs::read_to_string(&path).map_err(|source| LayoutError::Io { path, source })
    }
}

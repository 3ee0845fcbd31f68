// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The function author's surface: a scalar UDF evaluated over portable
//! datums, plus the side-file hook that lets a function pull versioned
//! resource directories onto the worker before evaluation.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::common::error::AdapterError;
use crate::data::{Datum, DatumFactory};

/// Path component that resolves to the newest version directory at
/// localization time.
pub const LATEST_TOKEN: &str = "#LATEST";

/// A scalar function over portable datums. Implementations never see which
/// backend produced their arguments; values are built through the supplied
/// factory so the result lands in the caller's representation.
pub trait ScalarUdf {
    fn eval(
        &self,
        factory: &dyn DatumFactory,
        args: &[Option<Datum>],
    ) -> Result<Option<Datum>, AdapterError>;

    /// Paths this function needs on local disk before the first `eval`.
    /// Entries may use [`LATEST_TOKEN`] as a directory component. Constant
    /// arguments are passed so a path can depend on them.
    fn required_files(&self, _constant_args: &[Option<Datum>]) -> Vec<String> {
        Vec::new()
    }
}

/// Resolve every [`LATEST_TOKEN`] component of `path` to the lexically
/// greatest child directory, left to right.
pub fn resolve_latest(path: &Path) -> anyhow::Result<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        if component.as_os_str() != LATEST_TOKEN {
            resolved.push(component);
            continue;
        }
        let mut newest: Option<String> = None;
        let entries = std::fs::read_dir(&resolved)
            .with_context(|| format!("listing {} to resolve {LATEST_TOKEN}", resolved.display()))?;
        for entry in entries {
            let entry = entry
                .with_context(|| format!("reading directory entry under {}", resolved.display()))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if newest.as_deref().is_none_or(|cur| name.as_str() > cur) {
                newest = Some(name);
            }
        }
        let newest = newest.with_context(|| {
            format!(
                "no version directories under {} to resolve {LATEST_TOKEN}",
                resolved.display()
            )
        })?;
        resolved.push(newest);
    }
    Ok(resolved)
}

/// Resolve and verify the side files a UDF declared, returning the local
/// paths in declaration order.
pub fn localize_required_files(files: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::with_capacity(files.len());
    for file in files {
        let resolved = resolve_latest(Path::new(file))?;
        std::fs::metadata(&resolved)
            .with_context(|| format!("required file {} is not present", resolved.display()))?;
        tracing::debug!("localized required file {file} -> {}", resolved.display());
        out.push(resolved);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_token_picks_lexically_greatest_version_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        for version in ["2024-01-01", "2024-06-15", "2023-12-31"] {
            std::fs::create_dir(root.path().join(version)).expect("mkdir");
        }
        // A plain file must not win over the version directories.
        std::fs::write(root.path().join("2025-zzz"), b"").expect("file");

        let path = root.path().join(LATEST_TOKEN).join("model.bin");
        std::fs::write(root.path().join("2024-06-15").join("model.bin"), b"m").expect("file");
        let resolved = resolve_latest(&path).expect("resolve");
        assert_eq!(resolved, root.path().join("2024-06-15").join("model.bin"));
    }

    #[test]
    fn resolution_fails_when_no_version_directory_exists() {
        let root = tempfile::tempdir().expect("tempdir");
        let path = root.path().join(LATEST_TOKEN).join("model.bin");
        assert!(resolve_latest(&path).is_err());
    }

    #[test]
    fn localize_verifies_presence_and_preserves_order() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::write(root.path().join("a.txt"), b"a").expect("file");
        std::fs::write(root.path().join("b.txt"), b"b").expect("file");
        let files = vec![
            root.path().join("b.txt").display().to_string(),
            root.path().join("a.txt").display().to_string(),
        ];
        let localized = localize_required_files(&files).expect("localize");
        assert_eq!(localized, vec![root.path().join("b.txt"), root.path().join("a.txt")]);

        let missing = vec![root.path().join("missing.txt").display().to_string()];
        assert!(localize_required_files(&missing).is_err());
    }
}

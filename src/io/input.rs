//! Normalisation of loosely specified inputs into an ordered `name -> path` list

use crate::io::configuration::SUPPORTED_INPUT_EXTENSIONS;
use crate::io::error::{IoContext, PackError, Result};
use std::collections::HashSet;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One input as given on the command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSpec {
    /// An image file (named by its stem) or a directory of images
    Path(PathBuf),
    /// An image file with an explicit variant name
    Named {
        /// Variant name
        name: String,
        /// Image file
        path: PathBuf,
    },
}

impl FromStr for InputSpec {
    type Err = Infallible;

    /// `NAME=PATH` gives an explicit name; anything else is a path
    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        if let Some((name, path)) = value.split_once('=') {
            if !name.is_empty() && !name.contains(['/', '\\']) && !path.is_empty() {
                return Ok(Self::Named {
                    name: name.to_string(),
                    path: PathBuf::from(path),
                });
            }
        }
        Ok(Self::Path(PathBuf::from(value)))
    }
}

/// A resolved input: one image file and the variant name it will be stored under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedInput {
    /// Variant name
    pub name: String,
    /// Image file
    pub path: PathBuf,
}

/// Whether a path carries one of the supported image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_INPUT_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// Variant name derived from a file path (its stem)
pub fn name_from_path(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn expand_directory(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory).io_context("read directory", directory)? {
        let path = entry.io_context("read directory", directory)?.path();
        if path.is_file() && is_supported_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Resolve inputs in order, expanding directories into their sorted image files
///
/// # Errors
///
/// Returns an error if:
/// - A directory cannot be read
/// - Nothing is left after expansion ([`PackError::EmptyInput`])
/// - A derived name is empty ([`PackError::InvalidVariantName`])
/// - Two inputs resolve to the same name ([`PackError::DuplicateVariantName`])
pub fn resolve_inputs(specs: &[InputSpec]) -> Result<Vec<NamedInput>> {
    let mut resolved = Vec::new();
    for spec in specs {
        match spec {
            InputSpec::Named { name, path } => resolved.push(NamedInput {
                name: name.clone(),
                path: path.clone(),
            }),
            InputSpec::Path(path) if path.is_dir() => {
                resolved.extend(expand_directory(path)?.into_iter().map(|file| NamedInput {
                    name: name_from_path(&file),
                    path: file,
                }));
            }
            InputSpec::Path(path) => resolved.push(NamedInput {
                name: name_from_path(path),
                path: path.clone(),
            }),
        }
    }

    if resolved.is_empty() {
        return Err(PackError::EmptyInput);
    }

    let mut seen = HashSet::new();
    for input in &resolved {
        if input.name.is_empty() {
            return Err(PackError::InvalidVariantName {
                name: input.name.clone(),
            });
        }
        if !seen.insert(input.name.as_str()) {
            return Err(PackError::DuplicateVariantName {
                name: input.name.clone(),
            });
        }
    }

    Ok(resolved)
}

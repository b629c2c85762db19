//! Numbered subject and sequence directories.
//!
//! Output datasets are laid out as `Patient_001/Sequence_001/...`. This module
//! scans a parent directory for the identifiers already in use and claims the
//! next one by creating its directory. Scanning and creation happen under a
//! process-wide lock, so two claims in the same process never observe the same
//! free identifier.
//!
//! # Example
//!
//! ```no_run
//! use vidframes::directory::claim_next;
//!
//! let subject = claim_next("dataset", "Patient")?;
//! println!("{} -> {}", subject.name, subject.path.display());
//! # Ok::<(), vidframes::VidframesError>(())
//! ```

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use crate::{
    allocator::{next_identifier, parse_identifier},
    error::VidframesError,
};

/// Serialises scan-then-create so an identifier is claimed atomically.
static CLAIM_LOCK: Mutex<()> = Mutex::new(());

/// A directory created by [`claim_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedDirectory {
    /// The allocated identifier.
    pub identifier: u64,
    /// Directory name, e.g. `Patient_004`.
    pub name: String,
    /// Full path of the created directory.
    pub path: PathBuf,
}

/// Format a numbered directory name with a three-digit, zero-padded suffix.
///
/// ```
/// use vidframes::directory::numbered_name;
///
/// assert_eq!(numbered_name("Sequence", 7), "Sequence_007");
/// assert_eq!(numbered_name("Patient", 1234), "Patient_1234");
/// ```
pub fn numbered_name(prefix: &str, identifier: u64) -> String {
    format!("{prefix}_{identifier:03}")
}

/// List the identifiers used by `<prefix>_<n>` entries of `parent`.
///
/// Files count as well as directories, since either blocks
/// [`claim_next`] from creating a directory of that name. Entries with
/// another prefix are ignored. A parent that does not exist yet has no
/// identifiers in use.
///
/// # Errors
///
/// - [`VidframesError::UnnumberedEntry`] if a `<prefix>_...` entry does not
///   end in an integer.
/// - [`VidframesError::IoError`] if the parent cannot be listed.
pub fn scan_identifiers<P: AsRef<Path>>(
    parent: P,
    prefix: &str,
) -> Result<Vec<i64>, VidframesError> {
    let parent = parent.as_ref();
    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error.into()),
    };

    let marker = format!("{prefix}_");
    let mut identifiers = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            log::warn!("Skipping non UTF-8 entry in {}", parent.display());
            continue;
        };

        if !name.starts_with(&marker) {
            continue;
        }

        match parse_identifier(name) {
            Some(identifier) => identifiers.push(identifier),
            None => {
                return Err(VidframesError::UnnumberedEntry { path: entry.path() });
            }
        }
    }

    Ok(identifiers)
}

/// Claim the next free `<prefix>_<n>` directory under `parent`.
///
/// `parent` is created if missing. The new directory itself is created with
/// [`fs::create_dir`], which fails rather than reusing an existing directory.
///
/// # Errors
///
/// - [`VidframesError::Collision`] if the chosen directory appeared between
///   the scan and its creation (another process writing the same tree).
/// - Any error from [`scan_identifiers`] or
///   [`next_identifier`](crate::next_identifier).
pub fn claim_next<P: AsRef<Path>>(
    parent: P,
    prefix: &str,
) -> Result<NumberedDirectory, VidframesError> {
    let parent = parent.as_ref();
    let _guard = CLAIM_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    fs::create_dir_all(parent)?;
    let used = scan_identifiers(parent, prefix)?;
    let identifier = next_identifier(&used)?;
    let name = numbered_name(prefix, identifier);
    let path = parent.join(&name);

    create_new_dir(&path)?;
    log::debug!("Claimed {}", path.display());

    Ok(NumberedDirectory {
        identifier,
        name,
        path,
    })
}

/// Create a directory, mapping "already exists" to [`VidframesError::Collision`].
pub(crate) fn create_new_dir(path: &Path) -> Result<(), VidframesError> {
    fs::create_dir(path).map_err(|error| {
        if error.kind() == ErrorKind::AlreadyExists {
            VidframesError::Collision {
                path: path.to_path_buf(),
            }
        } else {
            VidframesError::IoError(error)
        }
    })
}

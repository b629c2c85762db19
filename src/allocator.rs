//! Identifier allocation for numbered sibling directories.
//!
//! Given the identifiers already used under one parent directory (for example
//! the `3` in `Patient_003`), [`next_identifier`] returns the smallest positive
//! identifier that is still free. Gaps are filled before the sequence is
//! extended, so a dataset with `Patient_001` and `Patient_003` receives
//! `Patient_002` next.
//!
//! The allocator is pure: it never lists or creates directories. See
//! [`crate::directory`] for the filesystem side.
//!
//! # Example
//!
//! ```
//! use vidframes::next_identifier;
//!
//! assert_eq!(next_identifier(&[]).unwrap(), 1);
//! assert_eq!(next_identifier(&[1, 2, 4]).unwrap(), 3);
//! assert_eq!(next_identifier(&[2, 3, 4]).unwrap(), 1);
//! ```

use crate::error::VidframesError;

/// Return the smallest positive identifier not present in `used`.
///
/// `used` may be empty, unsorted, non-contiguous and may contain duplicates.
/// A `0` entry is accepted and never blocks identifier `1`.
///
/// A gap below the smallest identifier is filled first, duplicates or not:
/// `[5, 5, 6]` allocates `1`, not `7`.
///
/// The scan walks a sorted copy starting from a virtual boundary of `0`, so a
/// missing `1` at the very start is found the same way as an interior gap.
///
/// # Errors
///
/// Returns [`VidframesError::InvalidIdentifier`] if any entry is negative.
pub fn next_identifier(used: &[i64]) -> Result<u64, VidframesError> {
    if let Some(&negative) = used.iter().find(|&&identifier| identifier < 0) {
        return Err(VidframesError::InvalidIdentifier(negative));
    }

    let mut sorted = used.to_vec();
    sorted.sort_unstable();

    let mut previous: u64 = 0;
    for identifier in sorted.into_iter().map(|identifier| identifier as u64) {
        // Duplicates step by zero and never open a gap.
        if identifier > previous + 1 {
            return Ok(previous + 1);
        }
        previous = identifier;
    }

    Ok(previous + 1)
}

/// Extract the numeric suffix from a `Prefix_003` style name.
///
/// The name is split on its last `_`; everything after it must parse as an
/// integer. Returns `None` for names without a separator or with a
/// non-numeric suffix.
///
/// ```
/// use vidframes::allocator::parse_identifier;
///
/// assert_eq!(parse_identifier("Patient_003"), Some(3));
/// assert_eq!(parse_identifier("Sequence_A"), None);
/// ```
pub fn parse_identifier(name: &str) -> Option<i64> {
    let (_, suffix) = name.rsplit_once('_')?;
    suffix.parse::<i64>().ok()
}

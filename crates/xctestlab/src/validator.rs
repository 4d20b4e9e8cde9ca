//! Structural validation of the XCTest zip before upload.
//!
//! Test Lab rejects a bundle that does not contain exactly one top-level
//! `.xctestrun` file; catching that locally saves an upload and a doomed
//! submission.

use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use zip::ZipArchive;

pub fn validate_xctest_zip(path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|e| {
        Error::InvalidArchive(format!("cannot open '{}': {e}", path.display()))
    })?;
    let archive = ZipArchive::new(file)?;

    let mut xctestrun_count = 0usize;
    for name in archive.file_names() {
        if !name.contains('/') && name.ends_with(".xctestrun") {
            xctestrun_count += 1;
        }
    }

    match xctestrun_count {
        0 => Err(Error::InvalidArchive(
            "the zip contains no top-level .xctestrun file".to_string(),
        )),
        1 => Ok(()),
        _ => Err(Error::InvalidArchive(
            "there could be only one .xctestrun file in the zip file".to_string(),
        )),
    }
}

//! Filesystem helpers for the PawMap command line, built on `cap-std` and
//! `camino`.
//!
//! Paths arrive from configuration as UTF-8 strings and may be absolute or
//! relative to the working directory, including ones that start with `..`.
//! Every operation first opens the nearest anchoring directory with ambient
//! authority and then works relative to it.
#![forbid(unsafe_code)]

use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};

/// Suffix of the sibling file an export is staged in.
const STAGING_SUFFIX: &str = ".partial";

/// Create every missing directory above `path`.
///
/// An existing parent is left untouched.
///
/// # Errors
/// Returns any I/O error raised while opening the anchoring directory or
/// creating the missing ones.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
        return Ok(());
    };
    match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(_) => return Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    let (anchor, relative) = anchored(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    anchor.create_dir_all(&relative)
}

/// Report whether `path` names an existing regular file.
///
/// A missing file or a missing parent directory yields `false`.
///
/// # Errors
/// Returns I/O errors other than "not found", and an
/// [`io::ErrorKind::InvalidInput`] error when `path` has no file name.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match parent_and_name(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(&name) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Replace the contents of `path`, creating parent directories as needed.
///
/// `contents` is written to a sibling staging file which is then renamed
/// over the target, so readers see either the old file or the new one.
///
/// # Errors
/// Returns an [`io::ErrorKind::InvalidInput`] error when `path` has no file
/// name, and any I/O error raised while writing or renaming.
pub fn write_replacing(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = parent_and_name(path)?;
    let staging = format!("{name}{STAGING_SUFFIX}");
    dir.write(&staging, contents)?;
    if let Err(err) = dir.rename(&staging, &dir, &name) {
        drop(dir.remove_file(&staging));
        return Err(err);
    }
    Ok(())
}

/// Open the directory holding `path` and return it with the file name.
fn parent_and_name(path: &Utf8Path) -> io::Result<(Dir, String)> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{path} does not name a file"),
        )
    })?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name.to_owned()))
}

/// Split `path` into an opened anchor (filesystem root, drive, the working
/// directory, or an ancestor of it) and the remainder relative to it.
fn anchored(path: &Utf8Path) -> io::Result<(Dir, Utf8PathBuf)> {
    let (anchor, relative) = split_anchor(path);
    let dir = Dir::open_ambient_dir(&anchor, ambient_authority())?;
    Ok((dir, relative))
}

/// Move the root, drive prefix, and any leading `..` steps of `path` onto
/// the anchor side; `.` steps are dropped.
fn split_anchor(path: &Utf8Path) -> (Utf8PathBuf, Utf8PathBuf) {
    let mut anchor = Utf8PathBuf::new();
    let mut relative = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir => anchor.push(component),
            Utf8Component::ParentDir if relative.as_str().is_empty() => anchor.push(component),
            Utf8Component::CurDir => {}
            other => relative.push(other),
        }
    }
    if anchor.as_str().is_empty() {
        anchor.push(".");
    }
    (anchor, relative)
}

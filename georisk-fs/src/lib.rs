//! Capability-based filesystem helpers built on `cap-std` and `camino`.
//!
//! Output documents are replaced whole: [`write_atomic`] stages bytes in a
//! hidden sibling file and renames it over the destination, so readers see
//! either the previous file or the complete new one.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Read, Write};
use std::path::Component;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Parent directory of `path`, treating a bare file name as `.`.
fn parent_or_current(path: &Utf8Path) -> &Utf8Path {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    }
}

/// Open the directory containing `path` and return it with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent_or_current(path), ambient_authority())?;
    Ok((dir, file_name))
}

/// Create every missing directory above `path`.
///
/// Absolute paths are resolved from the filesystem root so `cap-std` never
/// sees an absolute path relative to a directory handle.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let parent = parent_or_current(path);
    if parent == Utf8Path::new(".") || parent == Utf8Path::new("/") {
        return Ok(());
    }
    let (base_dir, relative) = base_dir_and_relative(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Read a UTF-8 text file through its parent directory handle.
pub fn read_to_string(path: &Utf8Path) -> io::Result<String> {
    let (dir, name) = open_dir_and_file(path)?;
    let mut file = dir.open(name.as_str())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Replace `path` with `bytes` without ever exposing a partial file.
///
/// Parent directories are created first. The bytes are written to a hidden
/// staging file in the same directory, flushed to disk and renamed over the
/// destination. The staging file is removed if any step fails.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
///
/// georisk_fs::write_atomic(Utf8Path::new("data/out.geojson"), b"{}")?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    let staging = staging_name(&name);
    let result = stage_and_rename(&dir, &staging, &name, bytes);
    if result.is_err() {
        // The staging file may not exist if creation itself failed.
        let _cleanup = dir.remove_file(staging.as_str());
    }
    result
}

fn staging_name(name: &str) -> String {
    let sequence = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(".{name}.{}.{sequence}.tmp", process::id())
}

fn stage_and_rename(dir: &fs_utf8::Dir, staging: &str, name: &str, bytes: &[u8]) -> io::Result<()> {
    let mut options = fs_utf8::OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(staging, &options)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    dir.rename(staging, dir, name)
}

/// Split `parent` into an ambient base directory and the path below it.
pub fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();

    let (base, relative) = match std_parent.components().next() {
        // Windows drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other(format!("cannot strip prefix from {parent}")))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other(format!("cannot strip root from {parent}")))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|path| io::Error::other(format!("non-UTF-8 path {}", path.display())))?;
    Ok((dir, relative))
}

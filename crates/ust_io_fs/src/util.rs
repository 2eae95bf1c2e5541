use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::spec::{FsError, Result};

////////////////////////////////////////////////////////////////////////////////
// #region AccessChecks

/// Whether the current process may read `path`.
pub(crate) fn is_readable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        rustix::fs::access(path, rustix::fs::Access::READ_OK).is_ok()
    }
    #[cfg(not(unix))]
    {
        fs::metadata(path).is_ok()
    }
}

/// Whether the current process may write into `path`.
pub(crate) fn is_writable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        rustix::fs::access(path, rustix::fs::Access::WRITE_OK).is_ok()
    }
    #[cfg(not(unix))]
    {
        fs::metadata(path)
            .map(|meta| !meta.permissions().readonly())
            .unwrap_or(false)
    }
}

/// Closest ancestor of `path` (itself included) that exists.
pub(crate) fn nearest_existing_ancestor(path: &Path) -> Option<&Path> {
    path.ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.exists())
}

/// Whether the textual form of `path` ends with a separator, i.e. the caller
/// named a directory explicitly.
pub(crate) fn has_trailing_separator(path: &Path) -> bool {
    let c_path = path.as_os_str().to_string_lossy();
    c_path.ends_with('/') || (cfg!(windows) && c_path.ends_with('\\'))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MetadataCopy

/// Copy one file and carry over permissions, timestamps and (on Linux)
/// extended attributes.
///
/// Metadata failures do not fail the copy: they are logged and pushed onto
/// `l_warnings`.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    l_warnings: &mut Vec<String>,
) -> io::Result<()> {
    fs::copy(path_file_src, path_file_dst)?;
    if let Err(e) = apply_metadata(path_file_src, path_file_dst) {
        let c_warning = format!("metadata not preserved for {}: {e}", path_file_dst.display());
        warn!("{c_warning}");
        l_warnings.push(c_warning);
    }
    Ok(())
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> io::Result<()> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

/// Recreate the tree under `path_dir_src` at `path_dir_dst`, files included.
///
/// Returns the number of files copied.
pub(crate) fn copy_tree_with_metadata(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    l_warnings: &mut Vec<String>,
) -> io::Result<u64> {
    let mut n_files = 0u64;
    for entry in WalkDir::new(path_dir_src).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let path_rel = entry
            .path()
            .strip_prefix(path_dir_src)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let path_dst = path_dir_dst.join(path_rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&path_dst)?;
            continue;
        }
        if let Some(path_parent) = path_dst.parent() {
            fs::create_dir_all(path_parent)?;
        }
        copy_file_with_metadata(entry.path(), &path_dst, l_warnings)?;
        n_files += 1;
    }
    Ok(n_files)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExternalCopy

/// Retry a copy through the platform copy command (`cp -rf`, `xcopy`).
///
/// # Errors
/// [`FsError::OsError`] when the command cannot be spawned or exits non-zero.
pub(crate) fn copy_by_command(path_src: &Path, path_dst: &Path) -> Result<()> {
    let mut cmd = build_copy_command(path_src, path_dst);
    info!(
        "copy fallback: {:?} {} -> {}",
        cmd.get_program(),
        path_src.display(),
        path_dst.display()
    );
    let map_os_error = |message: String| FsError::OsError {
        path_src: path_src.to_path_buf(),
        path_dst: path_dst.to_path_buf(),
        message,
    };
    let output = cmd.output().map_err(|e| map_os_error(e.to_string()))?;
    if output.status.success() {
        return Ok(());
    }
    let c_stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(map_os_error(if c_stderr.is_empty() {
        format!("copy command exited with {}", output.status)
    } else {
        c_stderr
    }))
}

#[cfg(windows)]
fn build_copy_command(path_src: &Path, path_dst: &Path) -> Command {
    let mut cmd = Command::new("xcopy");
    cmd.arg(path_src).arg(path_dst).args(["/E", "/H", "/Y", "/I"]);
    cmd
}

#[cfg(not(windows))]
fn build_copy_command(path_src: &Path, path_dst: &Path) -> Command {
    let mut cmd = Command::new("cp");
    cmd.arg("-rf");
    // `src/.` copies the directory's content, whether or not `dst` exists.
    if path_src.is_dir() {
        cmd.arg(path_src.join("."));
    } else {
        cmd.arg(path_src);
    }
    cmd.arg(path_dst);
    cmd
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Convert a walkdir failure into [`FsError::Io`], keeping the offending path.
pub(crate) fn map_walkdir_error(path_root: &Path, e: walkdir::Error) -> FsError {
    let path = e
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path_root.to_path_buf());
    FsError::io(path, io::Error::from(e))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

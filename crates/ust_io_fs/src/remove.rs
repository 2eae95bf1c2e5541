//! Remove engine: file/directory/empty-only removal with root protection.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::dispatch::dispatch;
use crate::path::{is_filesystem_root, normalize_path};
use crate::report::{ReportFs, ReportFsBuilder};
use crate::spec::{FsError, Mode, PathSpec, RemoveMode, Result};

/// Remove every path denoted by `spec_path`.
///
/// Pass [`Mode::NOSET`] to remove files and directories alike. `RECURSIVE`
/// only lets `**` span directories in glob sources.
///
/// # Errors
/// - [`FsError::UnsupportedMode`] for transfer or compare flags.
/// - [`FsError::FileRemoveError`] for a filesystem root, a missing path or a
///   node the flags do not select.
pub fn remove(spec_path: impl Into<PathSpec>, mode: Mode) -> Result<ReportFs> {
    remove_with_dest(spec_path, Path::new(""), mode)
}

/// [`remove`] taking the destination argument shared by the dispatched
/// operations; any non-empty `path_dst` is rejected.
pub fn remove_with_dest(
    spec_path: impl Into<PathSpec>,
    path_dst: impl AsRef<Path>,
    mode: Mode,
) -> Result<ReportFs> {
    let spec_path = spec_path.into();
    let path_dst = path_dst.as_ref();
    dispatch(
        &spec_path,
        path_dst,
        mode,
        Mode::outside(Mode::FAMILY_REMOVE),
        |path_src, path_dst, mode, builder_fs_report| {
            if !path_dst.as_os_str().is_empty() {
                return Err(FsError::InvalidArgument(
                    "Unsupported arg 'dest'".to_string(),
                ));
            }
            remove_entry(path_src, RemoveMode::try_from(mode)?, builder_fs_report)
        },
    )
}

/// Remove one path according to `mode`.
pub fn remove_entry(
    path: &Path,
    mode: RemoveMode,
    builder_fs_report: &mut ReportFsBuilder,
) -> Result<()> {
    ensure_not_root(&path.to_string_lossy())?;
    let path_norm = normalize_path(path)?;
    ensure_not_root(&path_norm.to_string_lossy())?;

    let meta = match fs::symlink_metadata(&path_norm) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(FsError::FileRemoveError(format!(
                "Can't remove '{}': not found.",
                path_norm.display()
            )));
        }
        Err(e) => return Err(FsError::io(&path_norm, e)),
    };
    let file_type = meta.file_type();

    if mode.if_empty_only() {
        if file_type.is_dir() && is_dir_empty(&path_norm)? {
            fs::remove_dir(&path_norm).map_err(|e| FsError::io(&path_norm, e))?;
            debug!("removed empty directory {}", path_norm.display());
            builder_fs_report.add_removed();
        } else {
            debug!("kept {} (not an empty directory)", path_norm.display());
            builder_fs_report.add_skipped();
        }
        return Ok(());
    }

    if file_type.is_dir() && mode.if_remove_dirs() {
        fs::remove_dir_all(&path_norm).map_err(|e| FsError::io(&path_norm, e))?;
    } else if (file_type.is_file() || file_type.is_symlink()) && mode.if_remove_files() {
        fs::remove_file(&path_norm).map_err(|e| FsError::io(&path_norm, e))?;
    } else {
        return Err(FsError::FileRemoveError(format!(
            "Can't remove '{}' with {}: {}",
            path_norm.display(),
            mode.mode(),
            describe_stat(&meta)
        )));
    }
    debug!("removed {}", path_norm.display());
    builder_fs_report.add_removed();
    Ok(())
}

fn ensure_not_root(c_path: &str) -> Result<()> {
    if is_filesystem_root(c_path) {
        return Err(FsError::FileRemoveError(format!(
            "Can't remove filesystem root '{}'",
            c_path.trim()
        )));
    }
    Ok(())
}

fn is_dir_empty(path_dir: &Path) -> Result<bool> {
    let mut iter_entries = fs::read_dir(path_dir).map_err(|e| FsError::io(path_dir, e))?;
    Ok(iter_entries.next().is_none())
}

fn describe_stat(meta: &fs::Metadata) -> String {
    let file_type = meta.file_type();
    let c_kind = if file_type.is_dir() {
        "directory"
    } else if file_type.is_file() {
        "file"
    } else if file_type.is_symlink() {
        "symlink"
    } else {
        "special"
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        format!(
            "type={c_kind} size={} mode={:o}",
            meta.len(),
            meta.mode()
        )
    }
    #[cfg(not(unix))]
    {
        format!(
            "type={c_kind} size={} readonly={}",
            meta.len(),
            meta.permissions().readonly()
        )
    }
}

//! Copy engine: the per-source state machine and its conflict policies.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::compare::signature;
use crate::dispatch::dispatch;
use crate::path::normalize_path;
use crate::remove::remove_entry;
use crate::report::{ReportFs, ReportFsBuilder};
use crate::spec::{
    EnumConflictPolicy, FsError, Mode, PathSpec, RemoveMode, Result, SpecCopyOptions,
    TransferMode,
};
use crate::util::{
    copy_by_command, copy_file_with_metadata, copy_tree_with_metadata, has_trailing_separator,
    is_readable, is_writable, map_walkdir_error, nearest_existing_ancestor,
};

struct SpecCopyContext<'a> {
    mode: TransferMode,
    spec_cp_options: &'a SpecCopyOptions,
    builder_fs_report: &'a mut ReportFsBuilder,
}

/// Copy every source denoted by `spec_src` to `path_dst`.
///
/// [`Mode::REPLACE`] is the usual choice: an existing destination is
/// replaced. See [`copy_entry`] for the per-source rules.
///
/// # Errors
/// - [`FsError::UnsupportedMode`] for remove or compare flags.
/// - [`FsError::InvalidArgument`] for `TARGET_DIRECTORY` with a single source.
/// - Any error of [`copy_entry`]; sources before the failing one stay copied.
pub fn copy(
    spec_src: impl Into<PathSpec>,
    path_dst: impl AsRef<Path>,
    mode: Mode,
) -> Result<ReportFs> {
    copy_with_options(spec_src, path_dst, mode, &SpecCopyOptions::default())
}

/// [`copy`] with explicit engine options.
pub fn copy_with_options(
    spec_src: impl Into<PathSpec>,
    path_dst: impl AsRef<Path>,
    mode: Mode,
    spec_cp_options: &SpecCopyOptions,
) -> Result<ReportFs> {
    let spec_src = spec_src.into();
    dispatch(
        &spec_src,
        path_dst.as_ref(),
        mode,
        Mode::outside(Mode::FAMILY_TRANSFER),
        |path_src, path_dst, mode, builder_fs_report| {
            copy_entry(
                path_src,
                path_dst,
                TransferMode::try_from(mode)?,
                spec_cp_options,
                builder_fs_report,
            )
        },
    )
}

/// Copy one source.
///
/// 1. The source must be readable and the destination (or its nearest
///    existing ancestor directory) writable.
/// 2. Source and destination must differ.
/// 3. Missing parents are created; a destination spelled with a trailing
///    separator (or any destination under `TARGET_DIRECTORY`) is created as
///    a directory.
/// 4. Then, by destination state:
///    - absent: fresh file or tree copy;
///    - existing directory: a source directory is copied onto it with the
///      tree policy, a source file lands inside it under its own name
///      (under `TARGET_DIRECTORY` a source directory lands inside it too);
///    - existing file: file policy; a source directory is refused.
pub fn copy_entry(
    path_src: &Path,
    path_dst: &Path,
    mode: TransferMode,
    spec_cp_options: &SpecCopyOptions,
    builder_fs_report: &mut ReportFsBuilder,
) -> Result<()> {
    let path_src = normalize_path(path_src)?;
    let path_dst = normalize_path(path_dst)?;

    let meta_src = fs::metadata(&path_src).map_err(|e| FsError::io(&path_src, e))?;
    if !is_readable(&path_src) {
        return Err(FsError::PermissionDenied(path_src));
    }
    let path_dst_checked = if path_dst.is_dir() {
        Some(path_dst.as_path())
    } else {
        nearest_existing_ancestor(path_dst.parent().unwrap_or(path_dst.as_path()))
    };
    if let Some(path_dst_checked) = path_dst_checked {
        if !is_writable(path_dst_checked) {
            return Err(FsError::PermissionDenied(path_dst_checked.to_path_buf()));
        }
    }
    ensure_distinct(&path_src, &path_dst)?;

    generate_dirs(&path_dst, mode.if_target_directory())?;

    let mut spec_cp_ctx = SpecCopyContext {
        mode,
        spec_cp_options,
        builder_fs_report,
    };

    let path_dst = if mode.if_target_directory() {
        path_dst.join(file_name_of(&path_src)?)
    } else {
        path_dst
    };

    match fs::metadata(&path_dst) {
        Err(_) if meta_src.is_dir() => copy_tree(&path_src, &path_dst, &mut spec_cp_ctx),
        Err(_) => copy_file(&path_src, &path_dst, &mut spec_cp_ctx),
        Ok(meta_dst) if meta_dst.is_dir() => {
            if meta_src.is_dir() {
                copy_tree(&path_src, &path_dst, &mut spec_cp_ctx)
            } else {
                let path_file_dst = path_dst.join(file_name_of(&path_src)?);
                copy_file(&path_src, &path_file_dst, &mut spec_cp_ctx)
            }
        }
        Ok(_) if meta_src.is_dir() => Err(FsError::InvalidArgument(format!(
            "Can't copy directory '{}' onto file '{}'",
            path_src.display(),
            path_dst.display()
        ))),
        Ok(_) => copy_file(&path_src, &path_dst, &mut spec_cp_ctx),
    }
}

/// Create the parent chain of `path`, and `path` itself when it is spelled
/// as a directory (trailing separator) or `if_container` is set.
pub(crate) fn generate_dirs(path: &Path, if_container: bool) -> Result<()> {
    if let Some(path_parent) = path.parent() {
        if !path_parent.as_os_str().is_empty() && !path_parent.exists() {
            fs::create_dir_all(path_parent).map_err(|e| FsError::io(path_parent, e))?;
            debug!("generated {}", path_parent.display());
        }
    }
    if (if_container || has_trailing_separator(path)) && !path.exists() {
        fs::create_dir_all(path).map_err(|e| FsError::io(path, e))?;
        debug!("generated {}", path.display());
    }
    Ok(())
}

pub(crate) fn file_name_of(path: &Path) -> Result<PathBuf> {
    path.file_name().map(PathBuf::from).ok_or_else(|| {
        FsError::InvalidArgument(format!("'{}' has no file name", path.display()))
    })
}

/// Refuse to copy a path onto itself; the conflict policies would delete the
/// source before reading it.
fn ensure_distinct(path_src: &Path, path_dst: &Path) -> Result<()> {
    if path_src == path_dst {
        return Err(FsError::InvalidArgument(format!(
            "Source and destination are the same file: '{}'",
            path_src.display()
        )));
    }
    Ok(())
}

fn is_source_newer(path_src: &Path, path_dst: &Path) -> Result<bool> {
    Ok(signature(path_src)?.mtime > signature(path_dst)?.mtime)
}

/// Single-file copy honoring the conflict policy.
fn copy_file(
    path_src: &Path,
    path_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<()> {
    ensure_distinct(path_src, path_dst)?;
    if let Ok(meta_dst) = fs::symlink_metadata(path_dst) {
        if meta_dst.is_dir() {
            return Err(FsError::InvalidArgument(format!(
                "Can't overwrite directory '{}' with file '{}'",
                path_dst.display(),
                path_src.display()
            )));
        }
        match spec_cp_ctx.mode.rule_conflict() {
            EnumConflictPolicy::Replace => {}
            EnumConflictPolicy::Update => {
                if !is_source_newer(path_src, path_dst)? {
                    debug!("skip {} (destination not older)", path_dst.display());
                    spec_cp_ctx.builder_fs_report.add_skipped();
                    return Ok(());
                }
            }
            EnumConflictPolicy::Ignore => {
                debug!("skip {} (exists)", path_dst.display());
                spec_cp_ctx.builder_fs_report.add_skipped();
                return Ok(());
            }
        }
        fs::remove_file(path_dst).map_err(|e| FsError::io(path_dst, e))?;
    }

    let l_warnings = &mut spec_cp_ctx.builder_fs_report.warnings;
    match copy_file_with_metadata(path_src, path_dst, l_warnings) {
        Ok(()) => debug!("copied {} -> {}", path_src.display(), path_dst.display()),
        Err(e) => fallback_to_command(path_src, path_dst, e, spec_cp_ctx)?,
    }
    spec_cp_ctx.builder_fs_report.add_copied();
    Ok(())
}

/// Directory copy honoring the tree policy; `RECURSIVE` merges instead.
fn copy_tree(
    path_src: &Path,
    path_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<()> {
    ensure_distinct(path_src, path_dst)?;
    if path_dst.exists() {
        if spec_cp_ctx.mode.if_recursive() {
            return copy_recursively(path_src, path_dst, spec_cp_ctx);
        }
        match spec_cp_ctx.mode.rule_conflict() {
            EnumConflictPolicy::Replace => {}
            EnumConflictPolicy::Update => {
                if !is_source_newer(path_src, path_dst)? {
                    debug!("skip tree {} (destination not older)", path_dst.display());
                    spec_cp_ctx.builder_fs_report.add_skipped();
                    return Ok(());
                }
            }
            EnumConflictPolicy::Ignore => {
                debug!("skip tree {} (exists)", path_dst.display());
                spec_cp_ctx.builder_fs_report.add_skipped();
                return Ok(());
            }
        }
        remove_entry(path_dst, RemoveMode::default(), &mut ReportFsBuilder::default())?;
    }

    let l_warnings = &mut spec_cp_ctx.builder_fs_report.warnings;
    match copy_tree_with_metadata(path_src, path_dst, l_warnings) {
        Ok(n_files) => {
            debug!(
                "copied tree {} -> {} ({n_files} files)",
                path_src.display(),
                path_dst.display()
            );
            spec_cp_ctx
                .builder_fs_report
                .add_counts(&["cnt_copied"], n_files);
        }
        Err(e) => {
            fallback_to_command(path_src, path_dst, e, spec_cp_ctx)?;
            spec_cp_ctx.builder_fs_report.add_copied();
        }
    }
    Ok(())
}

/// Merge `path_src` into the existing `path_dst`: create missing
/// directories, apply the file policy to every file.
fn copy_recursively(
    path_src: &Path,
    path_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<()> {
    for entry in WalkDir::new(path_src)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| map_walkdir_error(path_src, e))?;
        let Ok(path_rel) = entry.path().strip_prefix(path_src) else {
            continue;
        };
        let path_target = path_dst.join(path_rel);
        if entry.file_type().is_dir() {
            if !path_target.exists() {
                fs::create_dir_all(&path_target).map_err(|e| FsError::io(&path_target, e))?;
                debug!("generated {}", path_target.display());
            }
            continue;
        }
        copy_file(entry.path(), &path_target, spec_cp_ctx)?;
    }
    Ok(())
}

fn fallback_to_command(
    path_src: &Path,
    path_dst: &Path,
    e: std::io::Error,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Result<()> {
    if !spec_cp_ctx.spec_cp_options.if_fallback_command {
        return Err(FsError::io(path_dst, e));
    }
    warn!(
        "native copy {} -> {} failed ({e}), retrying with the system copy command",
        path_src.display(),
        path_dst.display()
    );
    copy_by_command(path_src, path_dst)?;
    spec_cp_ctx.builder_fs_report.add_warning(format!(
        "copied {} by system command after: {e}",
        path_src.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use filetime::{FileTime, set_file_mtime};

    use super::{copy, copy_with_options};
    use crate::spec::{FsError, Mode, SpecCopyOptions};

    const N_MTIME_OLD: i64 = 1_577_836_800;
    const N_MTIME_NEW: i64 = 1_577_923_200;

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn read_text(path: &Path) -> String {
        std::fs::read_to_string(path).expect("read text")
    }

    fn pin_mtime(path: &Path, n_unix_seconds: i64) {
        set_file_mtime(path, FileTime::from_unix_time(n_unix_seconds, 0)).expect("mtime");
    }

    #[test]
    fn copy_file_into_missing_destination() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("a.txt");
        let path_dst = tmp.path().join("out/sub/b.txt");
        write_text(&path_src, "alpha");

        let report = copy(path_src.clone(), &path_dst, Mode::REPLACE).expect("copy");
        assert_eq!(read_text(&path_dst), "alpha");
        assert_eq!(report.cnt_copied, 1);
    }

    #[test]
    fn copy_file_into_existing_directory_keeps_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("a.txt");
        let path_dir = tmp.path().join("dir");
        write_text(&path_src, "alpha");
        std::fs::create_dir_all(&path_dir).expect("mkdir");

        copy(path_src, &path_dir, Mode::REPLACE).expect("copy");
        assert_eq!(read_text(&path_dir.join("a.txt")), "alpha");
    }

    #[test]
    fn trailing_separator_creates_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("a.txt");
        write_text(&path_src, "alpha");
        let c_dst = format!("{}/fresh/", tmp.path().display());

        copy(path_src, Path::new(&c_dst), Mode::REPLACE).expect("copy");
        assert_eq!(read_text(&tmp.path().join("fresh/a.txt")), "alpha");
    }

    #[test]
    fn replace_and_ignore_policies() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("a.txt");
        let path_dst = tmp.path().join("b.txt");
        write_text(&path_src, "A");
        write_text(&path_dst, "B");

        let report = copy(path_src.clone(), &path_dst, Mode::IGNORE).expect("ignore");
        assert_eq!(read_text(&path_dst), "B");
        assert_eq!(report.cnt_skipped, 1);

        copy(path_src.clone(), &path_dst, Mode::REPLACE).expect("replace");
        assert_eq!(read_text(&path_dst), "A");
    }

    #[test]
    fn update_policy_compares_mtimes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("a.txt");
        let path_dst = tmp.path().join("b.txt");
        write_text(&path_src, "new");
        write_text(&path_dst, "old");
        set_file_mtime(&path_src, FileTime::from_unix_time(1_577_923_200, 0)).expect("mtime");
        set_file_mtime(&path_dst, FileTime::from_unix_time(1_577_836_800, 0)).expect("mtime");

        copy(path_dst.clone(), &path_src, Mode::UPDATE).expect("stale update");
        assert_eq!(read_text(&path_src), "new");

        copy(path_src.clone(), &path_dst, Mode::UPDATE).expect("fresh update");
        assert_eq!(read_text(&path_dst), "new");
    }

    #[test]
    fn no_policy_flag_overwrites() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("a.txt");
        let path_dst = tmp.path().join("b.txt");
        write_text(&path_src, "A");
        write_text(&path_dst, "B");

        copy(path_src, &path_dst, Mode::NOSET).expect("copy");
        assert_eq!(read_text(&path_dst), "A");
    }

    #[test]
    fn tree_ignore_keeps_destination() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_text(&path_src.join("1.txt"), "src");
        write_text(&path_dst.join("1.txt"), "dst");

        copy(path_src, &path_dst, Mode::IGNORE).expect("copy");
        assert_eq!(read_text(&path_dst.join("1.txt")), "dst");
    }

    #[test]
    fn tree_replace_without_recursive_starts_fresh() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_text(&path_src.join("1.txt"), "src");
        write_text(&path_dst.join("stale.txt"), "stale");

        copy(path_src, &path_dst, Mode::REPLACE).expect("copy");
        assert_eq!(read_text(&path_dst.join("1.txt")), "src");
        assert!(!path_dst.join("stale.txt").exists());
    }

    #[test]
    fn tree_recursive_ignore_merges() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_text(&path_src.join("1.txt"), "src");
        write_text(&path_src.join("sub/2.txt"), "src");
        write_text(&path_dst.join("1.txt"), "dst");
        write_text(&path_dst.join("keep.txt"), "keep");

        copy(path_src, &path_dst, Mode::IGNORE | Mode::RECURSIVE).expect("copy");
        assert_eq!(read_text(&path_dst.join("1.txt")), "dst");
        assert_eq!(read_text(&path_dst.join("sub/2.txt")), "src");
        assert!(path_dst.join("keep.txt").exists());
    }

    #[test]
    fn directory_onto_file_is_invalid() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("file.txt");
        write_text(&path_src.join("1.txt"), "src");
        write_text(&path_dst, "file");

        let err = copy(path_src, &path_dst, Mode::REPLACE).expect_err("must fail");
        assert!(matches!(err, FsError::InvalidArgument(_)));
    }

    #[test]
    fn same_source_and_destination_is_invalid() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("a.txt");
        write_text(&path_src, "a");
        let c_alias = format!("{}/./a.txt", tmp.path().display());

        let err = copy(path_src, Path::new(&c_alias), Mode::REPLACE).expect_err("must fail");
        assert!(matches!(err, FsError::InvalidArgument(_)));
    }

    #[test]
    fn target_directory_collects_sources() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_a = tmp.path().join("a.txt");
        let path_tree = tmp.path().join("tree");
        write_text(&path_a, "a");
        write_text(&path_tree.join("b.txt"), "b");
        let path_out = tmp.path().join("out");

        let report = copy(
            vec![path_a.clone(), path_tree.clone()],
            &path_out,
            Mode::TARGET_DIRECTORY,
        )
        .expect("copy");
        assert_eq!(report.cnt_resolved, 2);
        assert_eq!(read_text(&path_out.join("a.txt")), "a");
        assert_eq!(read_text(&path_out.join("tree/b.txt")), "b");

        let err = copy(path_a, &path_out, Mode::TARGET_DIRECTORY).expect_err("single source");
        assert!(matches!(err, FsError::InvalidArgument(_)));
    }

    #[test]
    fn glob_sources_are_copied_in_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("in/a.txt"), "a");
        write_text(&tmp.path().join("in/b.txt"), "b");
        write_text(&tmp.path().join("in/c.log"), "c");
        let c_pattern = format!("{}/in/*.txt", tmp.path().display());
        let c_dst = format!("{}/out/", tmp.path().display());

        let report = copy(c_pattern.as_str(), Path::new(&c_dst), Mode::REPLACE).expect("copy");
        assert_eq!(report.cnt_resolved, 2);
        assert!(tmp.path().join("out/a.txt").exists());
        assert!(tmp.path().join("out/b.txt").exists());
        assert!(!tmp.path().join("out/c.log").exists());
    }

    #[test]
    fn remove_flags_are_rejected() {
        let err = copy("/tmp/a/b", Path::new("/tmp/c/"), Mode::RM_FILE).expect_err("must fail");
        assert!(matches!(err, FsError::UnsupportedMode { .. }));
    }

    #[test]
    fn file_into_its_own_directory_is_invalid() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_a = tmp.path().join("a.txt");
        let path_b = tmp.path().join("b.txt");
        write_text(&path_a, "a");
        write_text(&path_b, "b");

        let err = copy(path_a.clone(), tmp.path(), Mode::REPLACE).expect_err("same file");
        assert!(matches!(err, FsError::InvalidArgument(_)), "{err}");
        assert_eq!(read_text(&path_a), "a");

        let err = copy(
            vec![path_a.clone(), path_b.clone()],
            tmp.path(),
            Mode::REPLACE | Mode::TARGET_DIRECTORY,
        )
        .expect_err("same file");
        assert!(matches!(err, FsError::InvalidArgument(_)), "{err}");
        assert_eq!(read_text(&path_a), "a");
        assert_eq!(read_text(&path_b), "b");
    }

    #[test]
    fn tree_into_its_own_parent_is_invalid() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_tree = tmp.path().join("tree");
        let path_b = tmp.path().join("b.txt");
        write_text(&path_tree.join("1.txt"), "one");
        write_text(&path_b, "b");

        let err = copy(
            vec![path_tree.clone(), path_b],
            tmp.path(),
            Mode::REPLACE | Mode::TARGET_DIRECTORY,
        )
        .expect_err("same tree");
        assert!(matches!(err, FsError::InvalidArgument(_)), "{err}");
        assert_eq!(read_text(&path_tree.join("1.txt")), "one");
    }

    #[test]
    fn tree_update_follows_directory_mtime() {
        for (n_mtime_src, n_mtime_dst, c_expected) in
            [(N_MTIME_NEW, N_MTIME_OLD, "src"), (N_MTIME_OLD, N_MTIME_NEW, "dst")]
        {
            let tmp = tempfile::tempdir().expect("tempdir");
            let path_src = tmp.path().join("src");
            let path_dst = tmp.path().join("dst");
            write_text(&path_src.join("1.txt"), "src");
            write_text(&path_dst.join("1.txt"), "dst");
            write_text(&path_dst.join("stale.txt"), "stale");
            pin_mtime(&path_src, n_mtime_src);
            pin_mtime(&path_dst, n_mtime_dst);

            let report = copy(path_src, &path_dst, Mode::UPDATE).expect("copy");
            assert_eq!(read_text(&path_dst.join("1.txt")), c_expected);
            if c_expected == "src" {
                assert_eq!(report.cnt_copied, 1);
                assert!(!path_dst.join("stale.txt").exists());
            } else {
                assert_eq!(report.cnt_skipped, 1);
                assert!(path_dst.join("stale.txt").exists());
            }
        }
    }

    #[test]
    fn recursive_update_merges_file_by_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        write_text(&path_src.join("newer.txt"), "src");
        write_text(&path_src.join("sub/older.txt"), "src");
        write_text(&path_dst.join("newer.txt"), "dst");
        write_text(&path_dst.join("sub/older.txt"), "dst");
        pin_mtime(&path_src.join("newer.txt"), N_MTIME_NEW);
        pin_mtime(&path_dst.join("newer.txt"), N_MTIME_OLD);
        pin_mtime(&path_src.join("sub/older.txt"), N_MTIME_OLD);
        pin_mtime(&path_dst.join("sub/older.txt"), N_MTIME_NEW);

        let report = copy(path_src, &path_dst, Mode::UPDATE | Mode::RECURSIVE).expect("copy");
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(report.cnt_skipped, 1);
        assert_eq!(read_text(&path_dst.join("newer.txt")), "src");
        assert_eq!(read_text(&path_dst.join("sub/older.txt")), "dst");
    }

    #[cfg(unix)]
    #[test]
    fn failed_native_tree_copy_falls_back_to_command() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        write_text(&path_src.join("1.txt"), "one");
        std::os::unix::fs::symlink("missing-target", path_src.join("dangling"))
            .expect("symlink");

        let spec_cp_options = SpecCopyOptions {
            if_fallback_command: false,
        };
        let err = copy_with_options(
            path_src.clone(),
            tmp.path().join("strict"),
            Mode::REPLACE,
            &spec_cp_options,
        )
        .expect_err("no fallback");
        assert!(matches!(err, FsError::Io { .. }), "{err}");

        let path_dst = tmp.path().join("lenient");
        let report = copy(path_src, &path_dst, Mode::REPLACE).expect("fallback");
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(read_text(&path_dst.join("1.txt")), "one");
        assert!(std::fs::symlink_metadata(path_dst.join("dangling")).is_ok());
    }
}

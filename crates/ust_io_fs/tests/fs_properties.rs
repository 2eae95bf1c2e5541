use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use filetime::{FileTime, set_file_mtime};
use ust_io_fs::{CompareEngine, FsError, Mode, PathSpec, compare_files, copy, grep, move_to, remove};

const N_MTIME_2020_01_01: i64 = 1_577_836_800;
const N_MTIME_2020_01_02: i64 = 1_577_923_200;

fn write_text(path: &Path, txt: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, txt).expect("write text");
}

fn read_text(path: &Path) -> String {
    fs::read_to_string(path).expect("read text")
}

fn mtime_of(path: &Path) -> i64 {
    FileTime::from_last_modification_time(&fs::metadata(path).expect("metadata")).unix_seconds()
}

fn list_files(path_root: &Path) -> BTreeSet<PathBuf> {
    walkdir::WalkDir::new(path_root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().strip_prefix(path_root).expect("prefix").to_path_buf())
        .collect()
}

fn make_pair(path_root: &Path, txt_src: &str, txt_dst: &str) -> (PathBuf, PathBuf) {
    let path_src = path_root.join("src.txt");
    let path_dst = path_root.join("dst.txt");
    write_text(&path_src, txt_src);
    write_text(&path_dst, txt_dst);
    (path_src, path_dst)
}

#[test]
fn copy_without_conflict_is_byte_identical() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_src = tmp.path().join("blob.bin");
    let l_bytes: Vec<u8> = (0..20_000u32).map(|n| (n * 31 % 251) as u8).collect();
    fs::write(&path_src, &l_bytes).expect("write");
    let path_dst = tmp.path().join("out/blob.bin");

    let report = copy(path_src.clone(), &path_dst, Mode::REPLACE).expect("copy");
    assert_eq!(report.cnt_copied, 1);
    assert_eq!(fs::read(&path_dst).expect("read"), l_bytes);
    assert!(compare_files(&path_src, &path_dst, Mode::BINARY).expect("cmp"));
}

#[test]
fn replace_overwrites_destination() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (path_src, path_dst) = make_pair(tmp.path(), "A", "B");

    copy(path_src, &path_dst, Mode::REPLACE).expect("copy");
    assert_eq!(read_text(&path_dst), "A");
}

#[test]
fn update_copies_only_newer_sources() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (path_src, path_dst) = make_pair(tmp.path(), "A", "B");
    set_file_mtime(&path_src, FileTime::from_unix_time(N_MTIME_2020_01_02, 0)).expect("mtime");
    set_file_mtime(&path_dst, FileTime::from_unix_time(N_MTIME_2020_01_01, 0)).expect("mtime");

    copy(path_src, &path_dst, Mode::UPDATE).expect("copy");
    assert_eq!(read_text(&path_dst), "A");
    assert_eq!(mtime_of(&path_dst), N_MTIME_2020_01_02);
}

#[test]
fn update_keeps_newer_destination() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (path_src, path_dst) = make_pair(tmp.path(), "A", "B");
    set_file_mtime(&path_src, FileTime::from_unix_time(N_MTIME_2020_01_01, 0)).expect("mtime");
    set_file_mtime(&path_dst, FileTime::from_unix_time(N_MTIME_2020_01_02, 0)).expect("mtime");

    let report = copy(path_src, &path_dst, Mode::UPDATE).expect("copy");
    assert_eq!(report.cnt_skipped, 1);
    assert_eq!(read_text(&path_dst), "B");
    assert_eq!(mtime_of(&path_dst), N_MTIME_2020_01_02);
}

#[test]
fn ignore_leaves_destination_untouched() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (path_src, path_dst) = make_pair(tmp.path(), "A", "B");

    let report = copy(path_src, &path_dst, Mode::IGNORE).expect("copy");
    assert_eq!(report.cnt_copied, 0);
    assert_eq!(read_text(&path_dst), "B");
}

#[test]
fn replace_tree_over_partial_destination() {
    for mode in [Mode::REPLACE, Mode::REPLACE | Mode::RECURSIVE] {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("source");
        let path_dst = tmp.path().join("dest");
        write_text(&path_src.join("1.txt"), "one");
        write_text(&path_src.join("sub/2.txt"), "two");
        write_text(&path_src.join("sub/inner/3.txt"), "three");
        write_text(&path_dst.join("1.txt"), "stale");

        copy(path_src.clone(), &path_dst, mode).expect("copy");

        let set_expected: BTreeSet<PathBuf> = ["1.txt", "sub/2.txt", "sub/inner/3.txt"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(list_files(&path_dst), set_expected, "mode {mode}");
        assert_eq!(read_text(&path_dst.join("1.txt")), "one");
        assert_eq!(read_text(&path_dst.join("sub/2.txt")), "two");
        assert_eq!(read_text(&path_dst.join("sub/inner/3.txt")), "three");
    }
}

#[test]
fn filesystem_roots_are_never_removed() {
    let l_modes = [
        Mode::NOSET,
        Mode::RM_DIR,
        Mode::RM_FILE | Mode::RM_DIR,
        Mode::RM_EMPTY,
        Mode::RECURSIVE,
    ];
    for mode in l_modes {
        for c_root in ["/", "C:\\"] {
            let err = remove(PathSpec::Literal(PathBuf::from(c_root)), mode).expect_err("root");
            assert!(matches!(err, FsError::FileRemoveError(_)), "{c_root} {mode}: {err}");
        }
    }
}

#[test]
fn compare_identity_and_illegal_combination() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_file = tmp.path().join("f.txt");
    let path_missing = tmp.path().join("never-created.txt");
    write_text(&path_file, "content");

    for mode in [Mode::NOSET, Mode::SHALLOW, Mode::BINARY, Mode::TEXT | Mode::IGNORE_CASE] {
        assert!(compare_files(&path_file, &path_file, mode).expect("identity"));
        assert!(compare_files(&path_missing, &path_missing, mode).expect("identity"));
    }

    let err = compare_files(&path_file, &path_missing, Mode::SHALLOW | Mode::TEXT)
        .expect_err("illegal");
    assert!(matches!(err, FsError::UnsupportedMode { .. }));
}

#[test]
fn engine_cache_is_bounded() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let engine = CompareEngine::new();
    let path_base = tmp.path().join("base.txt");
    write_text(&path_base, "x");
    for n in 0..engine.options().n_cache_entries_max + 5 {
        let path_other = tmp.path().join(format!("other{n}.txt"));
        write_text(&path_other, "x");
        assert!(engine.compare_files(&path_base, &path_other, Mode::BINARY).expect("cmp"));
        assert!(engine.len() <= engine.options().n_cache_entries_max);
    }
    assert_eq!(engine.len(), 5);
}

#[test]
fn grep_examples() {
    assert_eq!(grep("Hello World", r"o\w", 0).expect("grep"), vec!["or".to_string()]);

    let l_found = grep("To be or not to be.", "[TtOo]{2}", -1).expect("grep");
    let mut dict_counts: HashMap<&str, usize> = HashMap::new();
    for c_found in &l_found {
        *dict_counts.entry(c_found.as_str()).or_default() += 1;
    }
    assert_eq!(dict_counts, HashMap::from([("To", 1), ("to", 1), ("ot", 1)]));
}

#[test]
fn move_creates_missing_parents() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_src = tmp.path().join("a.txt");
    let path_dst = tmp.path().join("missing/deeper/renamed.txt");
    write_text(&path_src, "payload");

    let report = move_to(path_src.clone(), &path_dst, Mode::FORCE).expect("move");
    assert_eq!(report.cnt_moved, 1);
    assert!(!path_src.exists());
    assert_eq!(read_text(&path_dst), "payload");
}

#[test]
fn glob_sources_copy_into_directory() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_src = tmp.path().join("in");
    write_text(&path_src.join("a.log"), "a");
    write_text(&path_src.join("b.log"), "b");
    write_text(&path_src.join("c.txt"), "c");
    let c_glob = format!("{}/*.log", path_src.display());
    let c_dst = format!("{}/out/", tmp.path().display());

    let report = copy(c_glob.as_str(), &c_dst, Mode::REPLACE).expect("copy");
    assert_eq!(report.cnt_resolved, 2);
    let set_expected: BTreeSet<PathBuf> =
        ["a.log", "b.log"].into_iter().map(PathBuf::from).collect();
    assert_eq!(list_files(&tmp.path().join("out")), set_expected);
}

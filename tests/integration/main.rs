//! Integration tests for pkgdb

use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn add_package(root: &Path, name: &str, version: &str, deps: &[(&str, &str)]) {
    let dir = root.join(format!("{name}-{version}"));
    fs::create_dir(&dir).unwrap();

    let mut manifest = format!(
        "name = \"{name}\"\nversion = \"{version}\"\ncomment = \"{name} package\"\n\
         origin = \"misc/{name}\"\ndesc = \"About {name}.\"\n"
    );
    for (dep, dep_version) in deps {
        manifest.push_str(&format!("\n[[deps]]\nname = \"{dep}\"\nversion = \"{dep_version}\"\n"));
    }
    fs::write(dir.join("+MANIFEST"), manifest).unwrap();
}

mod pipeline_tests {
    use super::*;
    use pkgdb::cache::keys::{decode_int, decode_text};
    use pkgdb::cache::{CdbReader, RebuildOutcome};
    use pkgdb::config::schema::CacheConfig;
    use pkgdb::{CacheUpdate, PackageDb};
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    fn db(root: &Path) -> PackageDb {
        PackageDb::new(root, CacheConfig::default()).privileged(false)
    }

    fn int(reader: &CdbReader, key: &str) -> usize {
        decode_int(reader.get(key.as_bytes()).unwrap().unwrap()).unwrap()
    }

    fn text(reader: &CdbReader, key: &str) -> String {
        decode_text(reader.get(key.as_bytes()).unwrap().unwrap())
            .unwrap()
            .to_string()
    }

    #[test]
    fn two_packages_sorted_by_name() {
        let root = TempDir::new().unwrap();
        add_package(root.path(), "foo", "1.0", &[("bar", "2.3")]);
        add_package(root.path(), "bar", "2.3", &[("baz", "0.9")]);

        let db = db(root.path());
        db.update_cache().unwrap();
        let reader = db.open_cache().unwrap();

        assert_eq!(int(&reader, "bar-2.3"), 0);
        assert_eq!(int(&reader, "foo-1.0"), 1);
        assert_eq!(int(&reader, "bar"), 0);
        assert_eq!(int(&reader, "foo"), 1);
        assert_eq!(text(&reader, "0nv"), "bar-2.3");
        assert_eq!(text(&reader, "1nv"), "foo-1.0");
        assert_eq!(text(&reader, "1c"), "foo package");
        assert_eq!(text(&reader, "1o"), "misc/foo");
        assert_eq!(text(&reader, "1d"), "About foo.");
        assert_eq!(text(&reader, "0D0"), "baz-0.9");
        assert_eq!(text(&reader, "1D0"), "bar-2.3");
        assert_eq!(reader.get(b"0D1").unwrap(), None);
        assert_eq!(int(&reader, "count"), 2);
    }

    #[test]
    fn unparseable_manifest_yields_empty_cache() {
        let root = TempDir::new().unwrap();
        let pkg = root.path().join("broken-1.0");
        fs::create_dir(&pkg).unwrap();
        fs::write(pkg.join("+MANIFEST"), "name = ").unwrap();

        let outcome = db(root.path()).update_cache().unwrap();
        assert!(matches!(
            outcome,
            CacheUpdate::Rebuilt(RebuildOutcome::Published(s)) if s.records == 0
        ));

        let reader = db(root.path()).open_cache().unwrap();
        assert_eq!(int(&reader, "count"), 0);
        assert_eq!(reader.records().unwrap().len(), 1);
    }

    #[test]
    fn empty_root_creates_no_cache() {
        let root = TempDir::new().unwrap();
        let db = db(root.path());

        assert_eq!(
            db.update_cache().unwrap(),
            CacheUpdate::Rebuilt(RebuildOutcome::NoPackages)
        );
        assert!(!db.cache_path().exists());
    }

    #[test]
    fn empty_root_keeps_existing_cache() {
        let root = TempDir::new().unwrap();
        let db = db(root.path());
        fs::write(db.cache_path(), b"old cache bytes").unwrap();

        assert_eq!(db.force_rebuild().unwrap(), RebuildOutcome::NoPackages);
        assert_eq!(fs::read(db.cache_path()).unwrap(), b"old cache bytes");
    }

    #[test]
    fn legacy_metadata_is_converted() {
        let root = TempDir::new().unwrap();
        let pkg = root.path().join("gettext-0.17_1");
        fs::create_dir(&pkg).unwrap();
        fs::write(
            pkg.join("+CONTENTS"),
            "@name gettext-0.17_1\n@comment ORIGIN:devel/gettext\n@pkgdep libiconv-1.13.1_1\n",
        )
        .unwrap();
        fs::write(pkg.join("+COMMENT"), "GNU gettext\n").unwrap();

        let db = db(root.path());
        db.update_cache().unwrap();
        let reader = db.open_cache().unwrap();

        assert_eq!(int(&reader, "gettext-0.17_1"), 0);
        assert_eq!(text(&reader, "0c"), "GNU gettext");
        assert_eq!(text(&reader, "0o"), "devel/gettext");
        assert_eq!(text(&reader, "0D0"), "libiconv-1.13.1_1");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let root = TempDir::new().unwrap();
        for (name, version) in [("zsh", "5.9"), ("bash", "5.2"), ("curl", "8.4"), ("bash", "4.4")] {
            add_package(root.path(), name, version, &[("libc", "1")]);
        }

        let db = db(root.path());
        db.force_rebuild().unwrap();
        let first = fs::read(db.cache_path()).unwrap();
        db.force_rebuild().unwrap();
        let second = fs::read(db.cache_path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn records_sorted_and_counted() {
        let root = TempDir::new().unwrap();
        let packages = [
            ("python", "3.11"),
            ("perl", "5.36"),
            ("python", "3.9"),
            ("autoconf", "2.71"),
            ("ruby", "3.2"),
        ];
        for (name, version) in packages {
            add_package(root.path(), name, version, &[]);
        }
        // a candidate directory that fails to load
        fs::create_dir(root.path().join("junk")).unwrap();

        let db = db(root.path());
        db.update_cache().unwrap();
        let records = db.cached_records().unwrap();

        assert_eq!(records.len(), packages.len());
        assert_eq!(int(&db.open_cache().unwrap(), "count"), packages.len());
        for pair in records.windows(2) {
            let a = (&pair[0].name, &pair[0].version);
            let b = (&pair[1].name, &pair[1].version);
            assert!(a <= b, "{a:?} sorted after {b:?}");
        }

        let reader = db.open_cache().unwrap();
        let python: Vec<usize> = reader
            .get_all(b"python")
            .unwrap()
            .into_iter()
            .filter_map(decode_int)
            .collect();
        assert_eq!(python, [2, 3]);
    }

    #[test]
    fn fresh_cache_is_left_alone() {
        let root = TempDir::new().unwrap();
        add_package(root.path(), "foo", "1.0", &[]);
        let db = db(root.path());
        db.update_cache().unwrap();

        let future = SystemTime::now() + Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(db.cache_path())
            .unwrap()
            .set_modified(future)
            .unwrap();
        let before = fs::read(db.cache_path()).unwrap();

        assert_eq!(db.update_cache().unwrap(), CacheUpdate::Fresh);
        assert_eq!(fs::read(db.cache_path()).unwrap(), before);
        let mtime = fs::metadata(db.cache_path()).unwrap().modified().unwrap();
        assert_eq!(mtime, future);
    }

    #[test]
    fn orphaned_temp_file_is_ignored() {
        let root = TempDir::new().unwrap();
        add_package(root.path(), "foo", "1.0", &[]);
        let orphan = root.path().join("pkgdb.cache-abc123");
        fs::write(&orphan, b"interrupted rebuild").unwrap();

        let db = db(root.path());
        assert!(matches!(
            db.update_cache().unwrap(),
            CacheUpdate::Rebuilt(RebuildOutcome::Published(s)) if s.records == 1
        ));

        let reader = db.open_cache().unwrap();
        assert_eq!(int(&reader, "count"), 1);
        assert_eq!(int(&reader, "foo-1.0"), 0);
        assert_eq!(fs::read(&orphan).unwrap(), b"interrupted rebuild");
    }

    #[test]
    fn outdated_cache_is_rebuilt() {
        let root = TempDir::new().unwrap();
        add_package(root.path(), "foo", "1.0", &[]);
        let db = db(root.path());
        db.update_cache().unwrap();

        add_package(root.path(), "bar", "2.0", &[]);
        File::options()
            .write(true)
            .open(db.cache_path())
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(60))
            .unwrap();

        assert!(matches!(
            db.update_cache().unwrap(),
            CacheUpdate::Rebuilt(RebuildOutcome::Published(s)) if s.records == 2
        ));
        assert_eq!(db.update_cache().unwrap(), CacheUpdate::Fresh);
    }
}

mod cli_tests {
    use super::*;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    /// pkgdb with an isolated config and package root
    fn pkgdb(home: &TempDir, root: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("pkgdb");
        cmd.env_remove("PKG_DBDIR")
            .arg("--config")
            .arg(home.path().join("config.toml"))
            .arg("--db-dir")
            .arg(root);
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("pkgdb")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Installed-package database"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("pkgdb")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pkgdb"));
    }

    #[test]
    fn update_then_show() {
        let home = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        add_package(root.path(), "foo", "1.0", &[("bar", "2.3")]);

        pkgdb(&home, root.path())
            .args(["cache", "update"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache rebuilt: 1 packages"));

        pkgdb(&home, root.path())
            .args(["cache", "update"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache is up to date"));

        pkgdb(&home, root.path())
            .args(["cache", "show", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"name\": \"foo\""))
            .stdout(predicate::str::contains("\"version\": \"2.3\""));
    }

    #[test]
    fn empty_root_reports_no_packages() {
        let home = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();

        pkgdb(&home, root.path())
            .args(["cache", "rebuild"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No packages"));
        assert!(!root.path().join("pkgdb.cache").exists());
    }

    #[test]
    fn show_without_cache_fails() {
        let home = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();

        pkgdb(&home, root.path())
            .args(["cache", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn config_path_and_show() {
        let home = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();

        pkgdb(&home, root.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));

        pkgdb(&home, root.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn config_init_writes_file() {
        let home = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();

        pkgdb(&home, root.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(home.path().join("config.toml").exists());
    }
}

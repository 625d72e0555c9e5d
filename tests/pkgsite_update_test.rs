use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tempfile::tempdir;

const README: &str = "# Package history\n\n\
| Build | Release Date | FreeBSD Version | Package Count | Update Date |\n\
|-------|--------------|-----------------|---------------|-------------|\n\
\n\
Generated by CI.\n";

const INDEX_STREAM: &str = "{\"name\":\"zsh\",\"origin\":\"shells/zsh\",\"version\":\"5.9\"}\n\
{\"name\":\"TF1000-Build\",\"origin\":\"tc/build\",\"version\":\"3.1.4024\"}\n\
{\"name\":\"curl\",\"origin\":\"ftp/curl\",\"version\":\"8.7.1\"}\n";

fn metadata_page(date: &str, build: &str) -> String {
    format!(
        r#"<html><body><table id="topbartable">
<tr><td>FreeBSD version:</td><td>14.1</td></tr>
<tr><td>Date:</td><td>{date}</td></tr>
<tr><td>Build:</td><td>{build}</td></tr>
<tr><td>Packages:</td><td>3</td></tr>
</table></body></html>"#
    )
}

fn write_packagesite_tzst(path: &Path, index: &str) {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(index.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "packagesite.yaml", index.as_bytes())
        .expect("append index");
    let tar_bytes = builder.into_inner().expect("finish tar");
    let compressed = zstd::encode_all(tar_bytes.as_slice(), 3).expect("compress");
    fs::write(path, compressed).expect("write tzst");
}

fn spawn_fixture_server(root: PathBuf) -> SocketAddr {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind fixture server");
            tx.send(listener.local_addr().expect("local addr"))
                .expect("send addr");
            let app =
                axum::Router::new().fallback_service(tower_http::services::ServeDir::new(root));
            axum::serve(listener, app).await.expect("fixture server");
        });
    });
    rx.recv().expect("fixture server address")
}

struct Fixture {
    _tmp: tempfile::TempDir,
    home: PathBuf,
    env_file: PathBuf,
    base_url: String,
}

fn fixture(page: &str, with_archive: bool) -> Fixture {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let served = tmp.path().join("served");
    let packages = served.join("packages");
    fs::create_dir_all(&home).expect("mkdir home");
    fs::create_dir_all(&packages).expect("mkdir packages");

    fs::write(packages.join("packagesite.html"), page).expect("write page");
    if with_archive {
        write_packagesite_tzst(&packages.join("packagesite.tzst"), INDEX_STREAM);
    }
    fs::write(home.join("README.md"), README).expect("write readme");
    fs::write(home.join("packagehistory.json"), "{\"builds\": {}, \"packages\": {}}\n")
        .expect("write history");

    let addr = spawn_fixture_server(served);
    Fixture {
        env_file: tmp.path().join("github_env"),
        home,
        base_url: format!("http://{addr}/packages"),
        _tmp: tmp,
    }
}

fn update_cmd(fx: &Fixture) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pkgsite-history");
    cmd.current_dir(&fx.home)
        .env_remove("PKGSITE_CONFIG_PATH")
        .env("PKGSITE_HOME", &fx.home)
        .env("PKGSITE_BASE_URL", &fx.base_url)
        .env("GITHUB_ENV", &fx.env_file)
        .arg("update");
    cmd
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read json")).expect("parse json")
}

#[test]
fn update_merges_index_and_appends_changelog_row() {
    let fx = fixture(&metadata_page("2024-05-17", "20240517"), true);

    update_cmd(&fx).assert().success();

    let history = read_json(&fx.home.join("packagehistory.json"));
    assert_eq!(history["builds"]["20240517"]["release_date"], "2024-05-17");
    assert_eq!(history["builds"]["20240517"]["freebsd_version"], "14.1");
    assert_eq!(history["builds"]["20240517"]["packages_count"], "3");
    assert_eq!(
        history["packages"]["TF1000-Build"]["versions"]["20240517"],
        "3.1.4024"
    );
    let names: Vec<&str> = history["packages"]
        .as_object()
        .expect("packages object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(names, vec!["curl", "TF1000-Build", "zsh"]);

    let index = read_json(&fx.home.join("packagesite.json"));
    assert_eq!(index["zsh"]["origin"], "shells/zsh");
    assert!(!fx.home.join("temp").exists());

    let readme = fs::read_to_string(fx.home.join("README.md")).expect("read readme");
    assert!(readme.contains("| 20240517 | 2024-05-17 | 14.1 | 3 | "));
    assert!(readme.ends_with("|\n\nGenerated by CI.\n"));

    let env = fs::read_to_string(&fx.env_file).expect("read env file");
    assert_eq!(env, "REPOSITORY_DATE=2024-05-17\nREPOSITORY_BUILD=20240517\n");
}

#[test]
fn second_update_for_same_build_leaves_history_unchanged() {
    let fx = fixture(&metadata_page("2024-05-17", "20240517"), true);

    update_cmd(&fx).assert().success();
    let first = fs::read_to_string(fx.home.join("packagehistory.json")).expect("read");

    update_cmd(&fx)
        .assert()
        .success()
        .stdout(predicate::str::contains("build_added=false"));
    let second = fs::read_to_string(fx.home.join("packagehistory.json")).expect("read");
    assert_eq!(first, second);
}

#[test]
fn missing_topbar_table_aborts_before_download() {
    let fx = fixture("<html><body>maintenance</body></html>", true);

    update_cmd(&fx)
        .assert()
        .failure()
        .stderr(predicate::str::contains("topbar table not found"));

    assert!(!fx.home.join("temp").exists());
    assert!(!fx.env_file.exists());
}

#[test]
fn missing_archive_is_fatal_and_keeps_history() {
    let fx = fixture(&metadata_page("2024-05-17", "20240517"), false);

    update_cmd(&fx)
        .assert()
        .failure()
        .stderr(predicate::str::contains("download of"));

    let history = read_json(&fx.home.join("packagehistory.json"));
    assert_eq!(history["builds"], serde_json::json!({}));
}

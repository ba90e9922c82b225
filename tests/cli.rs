use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// An `arena` command with its config directory isolated in `home`.
fn arena(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("arena").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("ARENA_API_URL")
        .env_remove("ARENA_ACCESS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn listing_channels_is_the_default_command() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["--debug", "channels", "-x5", "-p2", "-s", "slug"])
        .assert()
        .success()
        .stdout("GET channels?page=2&per=5\n");
}

#[test]
fn single_get_joins_words_into_one_identifier() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["-D", "get", "channel", "great", "clothes"])
        .assert()
        .success()
        .stdout("GET channels/great%20clothes\n");
}

#[test]
fn block_create_posts_into_first_argument() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["--dry", "create", "block", "reading-list", "My", "Title"])
        .assert()
        .success()
        .stdout("POST channels/reading-list/blocks {\"content\":\"My Title\"}\n");
}

#[test]
fn new_channel_with_status() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["-D", "new", "channel", "Math", "Problems", "-S", "private"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("POST channels {"))
        .stdout(predicate::str::contains("\"title\":\"Math Problems\""))
        .stdout(predicate::str::contains("\"status\":\"private\""));
}

#[test]
fn plural_delete_issues_one_call_each_and_skips_output() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["-D", "delete", "channels", "a", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DELETE channels/a"))
        .stdout(predicate::str::contains("DELETE channels/b"))
        .stdout(predicate::str::contains("OK.").not());
}

#[test]
fn file_lines_are_appended_with_multiple() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("ids.txt");
    std::fs::write(&file, "2\n3\n").unwrap();

    arena(&home)
        .args(["-D", "-m", "get", "block", "1", "-f"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("GET blocks/1"))
        .stdout(predicate::str::contains("GET blocks/2"))
        .stdout(predicate::str::contains("GET blocks/3"));
}

#[test]
fn stdin_is_read_for_dash() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["-D", "get", "channel", "-f", "-"])
        .write_stdin("foo bar\n")
        .assert()
        .success()
        .stdout("GET channels/foo%20bar\n");
}

#[test]
fn missing_file_fails() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["-D", "get", "channel", "-f"])
        .arg(home.path().join("nope.txt"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read arguments"));
}

#[test]
fn search_users() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["-D", "search", "users", "ada", "-x", "3"])
        .assert()
        .success()
        .stdout("GET search/users?q=ada&per=3\n");
}

#[test]
fn inspect_edit_only_fetches() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .env("EDITOR", "false")
        .args(["-D", "edit", "channel", "notes-1"])
        .assert()
        .success()
        .stdout("GET channels/notes-1\n");
}

#[test]
fn empty_single_get_makes_no_calls() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["-D", "get", "block"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn get_rejects_users() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["get", "users"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn api_url_comes_from_config() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["config", "set", "api.url", "http://localhost:9/v2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api.url = http://localhost:9/v2"));

    arena(&home)
        .args(["config", "get", "api.url"])
        .assert()
        .success()
        .stdout("http://localhost:9/v2\n");

    arena(&home)
        .args(["config", "get", "nothing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn unreachable_api_reports_error() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .env("ARENA_ACCESS_TOKEN", "test-token")
        .args(["--api-url", "http://127.0.0.1:9/v2", "get", "channel", "x"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to send request"));
}

#[test]
fn missing_token_still_reaches_the_api() {
    let home = tempfile::tempdir().unwrap();
    arena(&home)
        .args(["--api-url", "http://127.0.0.1:9/v2", "get", "channel", "x"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to send request"))
        .stderr(predicate::str::contains("access token").not());
}

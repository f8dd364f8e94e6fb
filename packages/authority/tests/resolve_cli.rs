//! Integration tests for the `podium-resolve` binary using process-based testing.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use podium_authority::infrastructure::dto::ResolutionDto;

/// Path to the binary built by Cargo for this test run
fn resolve_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_podium-resolve"))
}

/// Run the binary with `args`, feeding `stdin` if given
fn run(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(resolve_bin())
        .args(args)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start podium-resolve");

    {
        let mut child_stdin = child.stdin.take().expect("stdin should be piped");
        if let Some(input) = stdin {
            child_stdin
                .write_all(input.as_bytes())
                .expect("Failed to write snapshot to stdin");
        }
    }

    child.wait_with_output().expect("Failed to wait for podium-resolve")
}

fn parse(output: &Output) -> ResolutionDto {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("stdout should be a resolution JSON")
}

#[test]
fn test_presenter_beats_stale_broadcaster_from_file() {
    // テスト項目: ファイルから読んだスナップショットで、古いブロードキャストが除外される
    // given (前提条件):
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"{{
            "activePresenterUserKey": "uid:p",
            "rightsGrantedAtByUserKey": {{"uid:p": 5000}},
            "recentBroadcastTsByUserKey": {{"uid:q": 100}},
            "nowTs": 20000
        }}"#
    )
    .expect("write snapshot");
    let path = file.path().to_str().expect("utf-8 path").to_string();

    // when (操作):
    let output = run(&["--snapshot", &path], None);

    // then (期待する結果):
    assert!(output.status.success());
    let resolution = parse(&output);
    assert_eq!(resolution.stale_broadcast_user_keys, vec!["uid:q"]);
    assert_eq!(resolution.active_user_keys, vec!["uid:p"]);
    assert_eq!(resolution.canonical_candidate, None);
    assert_eq!(resolution.unresolved_reason, "");
}

#[test]
fn test_self_bootstrap_from_stdin() {
    // テスト項目: 標準入力から読んだスナップショットで自分だけが候補になる
    // given (前提条件):
    let snapshot = r#"{"selfCanWrite": true, "selfUserKey": "uid:teacher1", "nowTs": 1000}"#;

    // when (操作):
    let output = run(&[], Some(snapshot));

    // then (期待する結果):
    assert!(output.status.success());
    let resolution = parse(&output);
    assert_eq!(resolution.active_candidates.len(), 1);
    let only = &resolution.active_candidates[0];
    assert_eq!(only.user_key, "uid:teacher1");
    assert_eq!(only.grant_ts, 1000);
    assert_eq!(only.reasons, vec!["self-write-rights"]);
    assert_eq!(resolution.canonical_candidate, None);
}

#[test]
fn test_now_flag_overrides_snapshot() {
    // テスト項目: --now の指定でブロードキャストが stale と判定される
    // given (前提条件):
    let snapshot = r#"{"recentBroadcastTsByUserKey": {"uid:abc": 1000}, "nowTs": 1500}"#;

    // when (操作):
    let output = run(&["--now", "20000", "--snapshot", "-"], Some(snapshot));

    // then (期待する結果):
    assert!(output.status.success());
    assert_eq!(parse(&output).stale_broadcast_user_keys, vec!["uid:abc"]);
}

#[test]
fn test_malformed_snapshot_exits_with_failure() {
    // テスト項目: 不正な JSON を渡すと終了コード 1 で終了する
    // given (前提条件):
    let snapshot = "{\"connectedClients\": [";

    // when (操作):
    let output = run(&[], Some(snapshot));

    // then (期待する結果):
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

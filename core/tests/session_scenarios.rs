mod common;

use boundary_core::config::RunnerConfig;
use boundary_core::error::RunnerError;
use boundary_core::runner::{run_session, RunSessionArgs, RunnerResult, Signal};
use common::{fake_session, FakeSession};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

struct Parent {
    stdin: DuplexStream,
    stdout: DuplexStream,
}

fn start(session: FakeSession) -> (Parent, JoinHandle<Result<RunnerResult, RunnerError>>) {
    let (parent_in_wr, parent_in_rd) = tokio::io::duplex(4096);
    let (parent_out_wr, parent_out_rd) = tokio::io::duplex(4096);

    let task = tokio::spawn(async move {
        let runner = RunnerConfig {
            abort_grace_ms: 50,
            ..RunnerConfig::default()
        };
        run_session(RunSessionArgs {
            session: Box::new(session),
            runner: &runner,
            parent_stdin: Box::new(parent_in_rd),
            parent_stdout: Box::new(parent_out_wr),
        })
        .await
    });

    (
        Parent {
            stdin: parent_in_wr,
            stdout: parent_out_rd,
        },
        task,
    )
}

#[tokio::test]
async fn noise_then_json_forwards_only_json() {
    let (session, mut child) = fake_session();
    let (mut parent, task) = start(session);

    child.stdout.write_all(b"starting up...\n").await.unwrap();
    child.stdout.write_all(b"{\"ok\":true}").await.unwrap();
    drop(child.stdout);
    child.exit_tx.send(0).unwrap();

    let mut got = Vec::new();
    parent.stdout.read_to_end(&mut got).await.unwrap();
    let res = task.await.unwrap().unwrap();

    assert_eq!(got, b"{\"ok\":true}".to_vec());
    assert_eq!(res.exit_code, 0);
    assert_eq!(res.forwarded_bytes, 11);
    assert_eq!(res.discarded_bytes, 15);
    assert_eq!(res.boundary_offset, Some(15));
}

#[tokio::test]
async fn json_as_first_bytes_is_forwarded_whole() {
    let (session, mut child) = fake_session();
    let (mut parent, task) = start(session);

    child.stdout.write_all(b"{\"ok\":true}").await.unwrap();
    drop(child.stdout);
    child.exit_tx.send(0).unwrap();

    let mut got = Vec::new();
    parent.stdout.read_to_end(&mut got).await.unwrap();
    let res = task.await.unwrap().unwrap();

    assert_eq!(got, b"{\"ok\":true}".to_vec());
    assert_eq!(res.boundary_offset, Some(0));
    assert_eq!(res.discarded_bytes, 0);
}

#[tokio::test]
async fn exit_before_marker_yields_empty_output_and_child_code() {
    let (session, mut child) = fake_session();
    let (mut parent, task) = start(session);

    child.stdout.write_all(b"fatal: no config found\n").await.unwrap();
    drop(child.stdout);
    child.exit_tx.send(2).unwrap();

    let mut got = Vec::new();
    parent.stdout.read_to_end(&mut got).await.unwrap();
    let res = task.await.unwrap().unwrap();

    assert!(got.is_empty());
    assert_eq!(res.exit_code, 2);
    assert_eq!(res.boundary_offset, None);
}

#[tokio::test]
async fn parent_eof_reaches_child_then_child_status_propagates() {
    let (session, mut child) = fake_session();
    let (mut parent, task) = start(session);

    parent
        .stdin
        .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"ping\"}\n")
        .await
        .unwrap();
    drop(parent.stdin);

    // The child only finishes reading once the parent's EOF has been propagated.
    let mut received = Vec::new();
    child.stdin.read_to_end(&mut received).await.unwrap();
    assert_eq!(
        received,
        b"{\"jsonrpc\":\"2.0\",\"method\":\"ping\"}\n".to_vec()
    );

    child.stdout.write_all(b"shutting down\n").await.unwrap();
    drop(child.stdout);
    child.exit_tx.send(3).unwrap();

    let mut got = Vec::new();
    parent.stdout.read_to_end(&mut got).await.unwrap();
    let res = task.await.unwrap().unwrap();

    assert!(got.is_empty());
    assert_eq!(res.exit_code, 3);
}

#[tokio::test]
async fn exit_does_not_wait_for_open_parent_stdin() {
    let (session, mut child) = fake_session();
    let (mut parent, task) = start(session);

    child.stdout.write_all(b"{\"done\":1}\n").await.unwrap();
    drop(child.stdout);
    child.exit_tx.send(0).unwrap();

    let mut got = Vec::new();
    parent.stdout.read_to_end(&mut got).await.unwrap();
    let res = task.await.unwrap().unwrap();

    assert_eq!(got, b"{\"done\":1}\n".to_vec());
    assert_eq!(res.exit_code, 0);
    // Still open on our side; the run finished anyway.
    parent.stdin.write_all(b"late").await.ok();
}

#[tokio::test]
async fn child_closing_stdin_is_not_a_failure() {
    let (session, child) = fake_session();
    let (mut parent, task) = start(session);

    drop(child.stdin);
    parent.stdin.write_all(b"{\"id\":7}\n").await.unwrap();

    let mut stdout = child.stdout;
    stdout.write_all(b"{\"id\":7,\"result\":null}\n").await.unwrap();
    drop(stdout);
    child.exit_tx.send(0).unwrap();

    let mut got = Vec::new();
    parent.stdout.read_to_end(&mut got).await.unwrap();
    let res = task.await.unwrap().unwrap();

    assert_eq!(got, b"{\"id\":7,\"result\":null}\n".to_vec());
    assert_eq!(res.exit_code, 0);
}

#[tokio::test]
async fn parent_stdout_failure_tears_down_child() {
    let (session, mut child) = fake_session();
    let signals = session.signals.clone();
    let (parent, task) = start(session);

    drop(parent.stdout);
    child.stdout.write_all(b"{\"ok\":true}").await.unwrap();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        RunnerError::StreamIo {
            stream: "parent_stdout",
            ..
        }
    ));
    assert_eq!(signals.lock().unwrap().first(), Some(&Signal::Term));
    drop(parent.stdin);
}

#[tokio::test]
async fn child_exit_ends_run_while_stdout_is_still_held_open() {
    let (session, mut child) = fake_session();
    let (mut parent, task) = start(session);

    child.stdout.write_all(b"npx: installing\n{\"ok\":1}").await.unwrap();
    child.exit_tx.send(4).unwrap();

    // child.stdout is not dropped: a leftover descendant still owns the pipe.
    let res = tokio::time::timeout(std::time::Duration::from_secs(2), task)
        .await
        .expect("run should end shortly after the child exits")
        .unwrap()
        .unwrap();

    let mut got = Vec::new();
    parent.stdout.read_to_end(&mut got).await.unwrap();
    assert_eq!(got, b"{\"ok\":1}".to_vec());
    assert_eq!(res.exit_code, 4);
    assert_eq!(res.forwarded_bytes, 8);
    assert!(res.duration_ms < 2000, "{}ms", res.duration_ms);
    drop(child.stdout);
}

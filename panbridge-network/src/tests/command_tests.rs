use crate::command::CommandRunner;
use panbridge_core::{PanBridgeError, Result};
use std::time::Duration;

#[tokio::test]
async fn test_hung_command_times_out() {
    let runner = CommandRunner::new(Duration::from_millis(100));
    let result = runner.run("sleep", "sleep", &["5"]).await;
    assert!(matches!(
        result,
        Err(PanBridgeError::Timeout { ref operation, .. }) if operation == "sleep"
    ));
}

#[tokio::test]
async fn test_run_returns_stdout() -> Result<()> {
    let runner = CommandRunner::default();
    assert_eq!(runner.run("echo", "echo", &["br0"]).await?, "br0\n");
    Ok(())
}

#[tokio::test]
async fn test_run_fails_with_stderr() {
    let runner = CommandRunner::default();
    let result = runner
        .run("delete bridge", "sh", &["-c", "echo 'Operation not permitted' >&2; exit 2"])
        .await;
    assert!(matches!(
        result,
        Err(PanBridgeError::NetworkError { ref cause, .. }) if cause == "Operation not permitted"
    ));
}

#[tokio::test]
async fn test_run_tolerant_swallows_tolerated_stderr() -> Result<()> {
    let runner = CommandRunner::default();
    let script = "echo \"Cannot find device\" >&2; exit 1";

    let tolerated = runner
        .run_tolerant("delete bridge", "sh", &["-c", script], &["Cannot find device"])
        .await?;
    assert_eq!(tolerated, None);

    let result = runner
        .run_tolerant("delete bridge", "sh", &["-c", script], &["File exists"])
        .await;
    assert!(matches!(result, Err(PanBridgeError::NetworkError { .. })));
    Ok(())
}

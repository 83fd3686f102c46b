use sharefile_upload_core::config::{apply_defaults, UploadConfig, UploadInputs};
use sharefile_upload_core::contract::{
    ExecuteError, ExecutionOutput, MockCommandExecutor, MockSecretMasker, NoopMasker,
};
use sharefile_upload_core::invocation::Invocation;
use sharefile_upload_core::upload::{plan, upload, UploadError};
use std::fs::{create_dir_all, write};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn config_for(path: String, exclude: String) -> UploadConfig {
    apply_defaults(
        UploadInputs {
            path,
            exclude,
            client_id: "client-id-value".into(),
            client_secret: "client-secret-value".into(),
            username: "someone@example.com".into(),
            password: "pa'ss".into(),
            subdomain: "acme".into(),
            destination: "/Shared/Releases".into(),
            ..Default::default()
        },
        "Upload-Sharefile.ps1",
    )
    .expect("defaults apply")
}

#[tokio::test]
async fn successful_run_reports_trimmed_share_url() {
    let tmp = tempdir().unwrap();
    write(tmp.path().join("a.txt"), "a").unwrap();
    let config = config_for(tmp.path().display().to_string(), String::new());

    let mut executor = MockCommandExecutor::new();
    executor
        .expect_execute()
        .times(1)
        .returning(|_inv: &Invocation| {
            Ok(ExecutionOutput::success("  https://example.com/share/xyz \n"))
        });

    let report = upload(&config, &executor, &NoopMasker)
        .await
        .expect("upload should succeed");
    assert_eq!(report.share_url, "https://example.com/share/xyz");
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.excluded, 0);
}

#[tokio::test]
async fn non_zero_exit_is_an_execution_failure() {
    let config = config_for(String::new(), String::new());

    let mut executor = MockCommandExecutor::new();
    executor
        .expect_execute()
        .times(1)
        .returning(|_inv: &Invocation| Ok(ExecutionOutput::failed(1)));

    let err = upload(&config, &executor, &NoopMasker).await.unwrap_err();
    assert!(matches!(err, UploadError::Execution { code: 1 }), "{err:?}");
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn output_of_failed_run_is_not_reported() {
    let config = config_for(String::new(), String::new());

    let mut executor = MockCommandExecutor::new();
    executor.expect_execute().returning(|_inv: &Invocation| {
        Ok(ExecutionOutput {
            exit_code: Some(3),
            stdout: "https://example.com/share/partial".into(),
        })
    });

    let err = upload(&config, &executor, &NoopMasker).await.unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn killed_process_is_terminated_failure() {
    let config = config_for(String::new(), String::new());

    let mut executor = MockCommandExecutor::new();
    executor.expect_execute().returning(|_inv: &Invocation| {
        Ok(ExecutionOutput {
            exit_code: None,
            stdout: String::new(),
        })
    });

    let err = upload(&config, &executor, &NoopMasker).await.unwrap_err();
    assert!(matches!(err, UploadError::Terminated));
}

#[tokio::test]
async fn launch_failure_carries_cause() {
    let config = config_for(String::new(), String::new());

    let mut executor = MockCommandExecutor::new();
    executor.expect_execute().returning(|_inv: &Invocation| {
        Err(ExecuteError::Launch {
            program: "powershell".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
    });

    let err = upload(&config, &executor, &NoopMasker).await.unwrap_err();
    assert!(matches!(err, UploadError::Launch(_)));
    assert!(err.to_string().contains("powershell"));
}

#[tokio::test]
async fn empty_resolution_still_runs_with_empty_list() {
    let config = config_for(String::new(), String::new());
    let seen = Arc::new(Mutex::new(String::new()));
    let seen_in_mock = seen.clone();

    let mut executor = MockCommandExecutor::new();
    executor.expect_execute().returning(move |inv: &Invocation| {
        *seen_in_mock.lock().unwrap() = inv.script().to_string();
        Ok(ExecutionOutput::success("https://example.com/share/empty"))
    });

    let report = upload(&config, &executor, &NoopMasker).await.unwrap();
    assert!(report.files.is_empty());
    let script = seen.lock().unwrap().clone();
    assert!(script.contains("-Files @() -Exclude @()"), "{script}");
}

#[tokio::test]
async fn secrets_are_masked_before_execution() {
    let config = config_for(String::new(), String::new());
    let order = Arc::new(Mutex::new(Vec::<String>::new()));

    let mut masker = MockSecretMasker::new();
    let masked = order.clone();
    masker
        .expect_mask()
        .times(4)
        .returning(move |value: &str| masked.lock().unwrap().push(format!("mask:{value}")));

    let mut executor = MockCommandExecutor::new();
    let executed = order.clone();
    executor.expect_execute().returning(move |_inv: &Invocation| {
        executed.lock().unwrap().push("execute".into());
        Ok(ExecutionOutput::success("https://example.com/s"))
    });

    upload(&config, &executor, &masker).await.unwrap();
    assert_eq!(
        *order.lock().unwrap(),
        vec![
            "mask:client-id-value",
            "mask:client-secret-value",
            "mask:someone@example.com",
            "mask:pa'ss",
            "execute",
        ]
    );
}

#[tokio::test]
async fn empty_secrets_are_not_masked() {
    let config = apply_defaults(UploadInputs::default(), "x.ps1").unwrap();

    let mut masker = MockSecretMasker::new();
    masker.expect_mask().never();

    let mut executor = MockCommandExecutor::new();
    executor
        .expect_execute()
        .returning(|_inv: &Invocation| Ok(ExecutionOutput::success("u")));

    upload(&config, &executor, &masker).await.unwrap();
}

#[test]
fn plan_lists_files_and_excludes_in_invocation() {
    let tmp = tempdir().unwrap();
    create_dir_all(tmp.path().join("out")).unwrap();
    write(tmp.path().join("out/app.zip"), "zip").unwrap();
    write(tmp.path().join("out/app.pdb"), "pdb").unwrap();
    let root = tmp.path().display().to_string();
    let config = config_for(format!("{root}/out"), format!("{root}/out/*.pdb"));

    let plan = plan(&config);
    assert_eq!(plan.files.len(), 1);
    assert_eq!(plan.excludes.len(), 1);

    let script = plan.invocation.script();
    let files_at = script.find("-Files @('").expect("files list present");
    let exclude_at = script.find("-Exclude @('").expect("exclude list present");
    assert!(files_at < exclude_at);
    assert!(script[files_at..exclude_at].contains("app.zip"));
    assert!(!script[files_at..exclude_at].contains("app.pdb"));
    assert!(script[exclude_at..].contains("app.pdb"));
    assert!(script.contains("-Password 'pa''ss'"));
    assert!(plan.invocation.redacted().contains("-Password '***'"));
}

//! Library-level pipeline runs against a real project directory

use pipbox::fs::RealFileSystem;
use pipbox::installer::{InstallerKind, MockCommandRunner};
use pipbox::output::dockerfile;
use pipbox::{BuildContext, PipboxConfig, PipelineOrchestrator};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_project(dir: &Path) {
    fs::write(
        dir.join("pyproject.toml"),
        r#"
[project]
name = "worker"
dependencies = ["celery>=5", "redis"]

[project.optional-dependencies]
dev = ["pytest"]
docs = ["mkdocs"]
"#,
    )
    .unwrap();
    fs::create_dir_all(dir.join("scripts")).unwrap();
    fs::write(dir.join("scripts/start.sh"), "#!/bin/sh\nexec celery worker\n").unwrap();
}

#[tokio::test]
async fn test_pipeline_with_uv_installer() {
    let temp = TempDir::new().unwrap();
    write_project(temp.path());

    let config = PipboxConfig {
        installer: InstallerKind::Uv,
        dev: "TRUE".to_string(),
        env_dir: "/opt/worker-env".into(),
        ..Default::default()
    };
    let runner = Arc::new(MockCommandRunner::new());
    let mut context = BuildContext::new(
        temp.path(),
        config,
        Arc::new(RealFileSystem::new()),
        runner.clone(),
    );

    let build = PipelineOrchestrator::new(None)
        .execute(&mut context)
        .await
        .unwrap();

    let manifest = fs::read_to_string(temp.path().join(".pipbox/requirements.txt")).unwrap();
    assert_eq!(manifest, "celery>=5\nredis\npytest\n");

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].program, "uv");
    assert_eq!(calls[0].args[0], "venv");
    assert_eq!(calls[1].args[0..2], ["pip".to_string(), "install".to_string()]);

    assert!(build.metadata.dev);
    assert_eq!(build.metadata.dependencies, 3);
    assert_eq!(build.runtime.env["VIRTUAL_ENV"], "/opt/worker-env");

    let rendered = dockerfile::render(&build);
    assert!(rendered.contains("ARG DEV=true"));
    assert!(rendered.contains("COPY --from=installer /opt/worker-env /opt/worker-env"));
    assert!(!rendered.contains("mkdocs"));
}

#[tokio::test]
async fn test_pipeline_stops_on_resolve_failure() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("pyproject.toml"), "[project]\ndependencies = \"flask\"\n").unwrap();

    let runner = Arc::new(MockCommandRunner::new());
    let mut context = BuildContext::new(
        temp.path(),
        PipboxConfig::default(),
        Arc::new(RealFileSystem::new()),
        runner.clone(),
    );

    let err = PipelineOrchestrator::new(None)
        .execute(&mut context)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Phase ResolvePhase failed");
    assert!(format!("{:#}", err).contains("dependencies"));
    assert!(runner.calls().is_empty());
    assert!(!temp.path().join(".pipbox").exists());
}

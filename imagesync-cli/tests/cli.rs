use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn imagesync_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("imagesync"));
    cmd.env("NO_COLOR", "1").env("RUST_LOG", "warn");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write");
    path
}

fn build_images_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "build-images",
        "--images-config",
        "images_config.yaml",
        "--build-config",
        "build_config.yaml",
        "--jobs-config",
        "jobs_config.yaml",
        "--jobs-templates",
        "templates",
        "--jobs-output",
        "jobs.yaml",
    ];
    args.extend_from_slice(extra);
    args
}

#[test]
fn create_pr_rejects_anything_but_true_or_false() {
    for bad in ["yes", "True", "1"] {
        imagesync_cmd()
            .args(build_images_args(&["--create-pr", bad]))
            .assert()
            .failure()
            .stderr(contains("--create-pr invalid: only accepts true or false"));
    }
}

#[test]
fn create_pr_true_requires_target_repository() {
    imagesync_cmd()
        .args(build_images_args(&["--create-pr", "true"]))
        .assert()
        .failure()
        .stderr(contains("--source-owner and --source-repo are required"));
}

#[test]
fn plan_requires_images_config() {
    imagesync_cmd()
        .arg("plan")
        .assert()
        .failure()
        .stderr(contains("--images-config"));
}

// ---------------------------------------------------------------------------
// Runs against a stub `aws` on PATH
// ---------------------------------------------------------------------------

#[cfg(unix)]
mod with_stub_registry {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const LISTING: &str = r#"{
  "imageDetails": [
    { "imageTags": ["unit-test-0.0.9"], "imagePushedAt": "2024-01-15T10:00:00+00:00" },
    { "imageTags": ["deploy-0.0.5", "latest"], "imagePushedAt": "2024-01-16T10:00:00+00:00" },
    { "imageTags": ["deploy-0.0.x"], "imagePushedAt": "2024-01-17T10:00:00+00:00" }
  ]
}"#;

    struct Fixture {
        dir: TempDir,
        path_env: String,
    }

    fn fixture(images: &str) -> Fixture {
        let dir = TempDir::new().expect("tempdir");
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).expect("mkdir");
        let aws = write(&bin, "aws", &format!("#!/bin/sh\ncat <<'JSON'\n{LISTING}\nJSON\n"));
        std::fs::set_permissions(&aws, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        write(dir.path(), "images_config.yaml", images);
        write(dir.path(), "build_config.yaml", "go_version: \"1.21\"\n");
        write(dir.path(), "jobs_config.yaml", "jobs: [unit]\n");
        std::fs::create_dir_all(dir.path().join("templates")).expect("mkdir");
        write(
            &dir.path().join("templates"),
            "jobs.yaml.tera",
            "{% for image in images %}{{ image.name }}: {{ image.image }}\n{% endfor %}",
        );

        let path_env = format!(
            "{}:{}",
            bin.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        Fixture { dir, path_env }
    }

    impl Fixture {
        fn cmd(&self) -> Command {
            let mut cmd = imagesync_cmd();
            cmd.current_dir(self.dir.path()).env("PATH", &self.path_env);
            cmd
        }
    }

    const STALE: &str =
        "image_repo: public.ecr.aws/x/prow\nimages:\n  unit-test: \"0.0.10\"\n  deploy: \"0.0.5\"\n";
    const CURRENT: &str =
        "image_repo: public.ecr.aws/x/prow\nimages:\n  unit-test: \"0.0.9\"\n  deploy: \"0.0.5\"\n";

    #[test]
    fn plan_json_reports_decisions() {
        let fx = fixture(STALE);
        let output = fx
            .cmd()
            .args(["plan", "--images-config", "images_config.yaml", "--json"])
            .output()
            .expect("run");
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
        assert_eq!(json["registry_tags"], 3);
        assert_eq!(json["images"][0]["name"], "unit-test");
        assert_eq!(json["images"][0]["decision"], "newer");
        assert_eq!(json["images"][0]["observed"], "0.0.9");
        assert_eq!(json["images"][1]["decision"], "up-to-date");
        assert_eq!(json["build"], serde_json::json!(["unit-test"]));
        assert_eq!(json["rejected_tags"][0]["tag"], "0.0.x");
    }

    #[test]
    fn plan_table_shows_job_diff_without_writing() {
        let fx = fixture(STALE);
        fx.cmd()
            .args([
                "plan",
                "--images-config",
                "images_config.yaml",
                "--jobs-config",
                "jobs_config.yaml",
                "--jobs-templates",
                "templates",
                "--jobs-output",
                "out/jobs.yaml",
            ])
            .assert()
            .success()
            .stdout(contains("newer"))
            .stdout(contains("+++ b/jobs.yaml"))
            .stdout(contains("+unit-test: public.ecr.aws/x/prow:unit-test-0.0.10"));
        assert!(!fx.dir.path().join("out/jobs.yaml").exists());
    }

    #[test]
    fn build_images_up_to_date_does_nothing() {
        let fx = fixture(CURRENT);
        fx.cmd()
            .args(build_images_args(&["--create-pr", "false"]))
            .assert()
            .success()
            .stdout(contains("All image versions are up to date."));
        assert!(predicate::path::missing().eval(&fx.dir.path().join("jobs.yaml")));
    }
}

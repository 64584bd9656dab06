use std::fs;
use std::path::Path;

use imagesync_core::{config, desired_images};
use imagesync_renderer::{JobContext, JobRenderer};
use tempfile::TempDir;

const IMAGES: &str = r#"
image_repo: public.ecr.aws/example/prow
images:
  unit-test: "0.0.9"
  integration-test: "0.0.15"
"#;

const JOBS: &str = r#"
presubmits:
  - name: unit
    image: unit-test
  - name: e2e
    image: integration-test
"#;

const PRESUBMITS: &str = r#"presubmits:
{%- for job in jobs.presubmits %}
  - name: {{ job.name }}
    image: {{ images_by_name[job.image].image }}
{%- endfor %}
"#;

fn write(dir: &Path, rel: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
    fs::write(&path, contents).expect("write");
    path
}

fn render_fixture(templates: &Path, config_dir: &Path) -> String {
    let images = config::load_images_config_at(&write(config_dir, "images_config.yaml", IMAGES))
        .expect("images config");
    let jobs = config::load_jobs_config_at(&write(config_dir, "jobs_config.yaml", JOBS))
        .expect("jobs config");
    let desired = desired_images(&images, &images.version_scheme).expect("desired");
    let ctx = JobContext::new(&images.image_repo, &desired, &jobs).expect("context");
    JobRenderer::from_dir(templates)
        .expect("renderer")
        .render(&ctx)
        .expect("render")
}

#[test]
fn jobs_reference_declared_image_tags() {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("templates");
    write(&templates, "presubmits.yaml.tera", PRESUBMITS);

    let out = render_fixture(&templates, tmp.path());
    assert!(out.contains("image: public.ecr.aws/example/prow:unit-test-0.0.9"));
    assert!(out.contains("image: public.ecr.aws/example/prow:integration-test-0.0.15"));
}

#[test]
fn rendered_jobs_are_valid_yaml_documents() {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("templates");
    write(&templates, "10-presubmits.yaml.tera", PRESUBMITS);
    write(
        &templates,
        "20-periodics.yaml.tera",
        "periodics:\n  - name: soak\n    image: {{ images[1].image }}\n",
    );

    let out = render_fixture(&templates, tmp.path());
    let docs: Vec<serde_yaml::Value> = out
        .split("\n---\n")
        .map(|doc| serde_yaml::from_str(doc).expect("valid yaml"))
        .collect();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["presubmits"][1]["name"], "e2e");
    assert_eq!(
        docs[1]["periodics"][0]["image"],
        "public.ecr.aws/example/prow:integration-test-0.0.15"
    );
}

#[test]
fn rendering_is_stable_across_runs() {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("templates");
    write(&templates, "presubmits.yaml.tera", PRESUBMITS);

    let first = render_fixture(&templates, tmp.path());
    let second = render_fixture(&templates, tmp.path());
    assert_eq!(first, second);
}

#[test]
fn macros_partial_can_be_imported() {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("templates");
    write(
        &templates,
        "_macros.tera",
        "{% macro container(image) %}container: {{ image }}{% endmacro container %}",
    );
    write(
        &templates,
        "jobs.yaml.tera",
        "{% import \"_macros.tera\" as m %}{{ m::container(image=images[0].image) }}\n",
    );

    let out = render_fixture(&templates, tmp.path());
    assert!(out.contains("container: public.ecr.aws/example/prow:unit-test-0.0.9"));
}

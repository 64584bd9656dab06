//! Image build and publish through the docker CLI.

use std::path::PathBuf;

use imagesync_core::types::{local_image_ref, remote_tag};
use imagesync_core::{BuildConfig, BuildSet, ImageSpec};

use crate::collab::{ImageBuilder, ImagePusher};
use crate::error::PipelineError;
use crate::process::CommandSpec;

/// Builds `<name>:<version>` from `<dockerfiles_dir>/Dockerfile.<name>`.
///
/// Every build-config pin is passed as `--build-arg KEY=value`.
#[derive(Debug, Clone)]
pub struct DockerBuilder {
    program: String,
    dockerfiles_dir: PathBuf,
    context_dir: PathBuf,
}

impl DockerBuilder {
    pub fn new(dockerfiles_dir: impl Into<PathBuf>, context_dir: impl Into<PathBuf>) -> Self {
        DockerBuilder {
            program: "docker".to_string(),
            dockerfiles_dir: dockerfiles_dir.into(),
            context_dir: context_dir.into(),
        }
    }

    pub fn command(&self, spec: &ImageSpec, build_config: &BuildConfig) -> CommandSpec {
        let dockerfile = self.dockerfiles_dir.join(format!("Dockerfile.{}", spec.name));
        let mut cmd = CommandSpec::new(&self.program)
            .arg("build")
            .arg("-f")
            .arg(dockerfile.to_string_lossy())
            .arg("-t")
            .arg(local_image_ref(&spec.name, &spec.declared_version));
        for (key, value) in build_config.build_args() {
            cmd = cmd.arg("--build-arg").arg(format!("{key}={value}"));
        }
        cmd.arg(self.context_dir.to_string_lossy())
    }
}

impl ImageBuilder for DockerBuilder {
    fn build(&mut self, build_set: &BuildSet, build_config: &BuildConfig) -> Result<(), PipelineError> {
        for spec in build_set {
            tracing::info!("building {}", local_image_ref(&spec.name, &spec.declared_version));
            self.command(spec, build_config)
                .run_streaming()
                .map_err(|source| PipelineError::Build {
                    image: spec.name.to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Tags each local image as `<image_repo>:<name>-<version>` and pushes it.
#[derive(Debug, Clone)]
pub struct DockerPusher {
    program: String,
}

impl Default for DockerPusher {
    fn default() -> Self {
        DockerPusher {
            program: "docker".to_string(),
        }
    }
}

impl DockerPusher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self, image_repo: &str, spec: &ImageSpec) -> [CommandSpec; 2] {
        let remote = format!(
            "{image_repo}:{}",
            remote_tag(&spec.name, &spec.declared_version)
        );
        [
            CommandSpec::new(&self.program).args([
                "tag".to_string(),
                local_image_ref(&spec.name, &spec.declared_version),
                remote.clone(),
            ]),
            CommandSpec::new(&self.program).args(["push".to_string(), remote]),
        ]
    }
}

impl ImagePusher for DockerPusher {
    fn push(&mut self, image_repo: &str, build_set: &BuildSet) -> Result<(), PipelineError> {
        for spec in build_set {
            for command in self.commands(image_repo, spec) {
                tracing::info!("{command}");
                command.run_streaming().map_err(|source| PipelineError::Push {
                    image: spec.name.to_string(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagesync_core::{ImageName, ParseVersion, VersionScheme};
    use std::collections::BTreeMap;

    fn spec(name: &str, version: &str) -> ImageSpec {
        ImageSpec {
            name: ImageName::from(name),
            declared_version: VersionScheme::Dotted.parse(version).unwrap(),
        }
    }

    #[test]
    fn build_command_passes_pins_as_build_args() {
        let pins = BTreeMap::from([
            ("go_version".to_string(), "1.21".to_string()),
            ("eks_distro_version".to_string(), "v1-28-eks-5".to_string()),
        ]);
        let builder = DockerBuilder::new("builder-base/dockerfiles", ".");
        let cmd = builder.command(&spec("unit-test", "0.0.10"), &BuildConfig { pins });
        assert_eq!(
            cmd.to_string(),
            "docker build -f builder-base/dockerfiles/Dockerfile.unit-test -t unit-test:0.0.10 \
             --build-arg EKS_DISTRO_VERSION=v1-28-eks-5 --build-arg GO_VERSION=1.21 ."
        );
    }

    #[test]
    fn push_commands_tag_then_push_remote_ref() {
        let [tag, push] = DockerPusher::new().commands("public.ecr.aws/x/prow", &spec("soak", "0.1.0"));
        assert_eq!(tag.args, ["tag", "soak:0.1.0", "public.ecr.aws/x/prow:soak-0.1.0"]);
        assert_eq!(push.args, ["push", "public.ecr.aws/x/prow:soak-0.1.0"]);
    }
}

//! imagesync core library: version model, snapshot reducer, reconciliation
//! engine, config files, errors.
//!
//! Everything here is pure except the `config::load_*_at` readers.
//!
//! - [`version`]: [`Version`], [`ParseVersion`], [`VersionScheme`]
//! - [`snapshot`]: [`reduce`] registry records to a [`HighestVersionMap`]
//! - [`reconcile`]: desired vs. observed → [`BuildSet`]
//! - [`config`]: `images_config.yaml`, `build_config.yaml`, `jobs_config.yaml`

pub mod config;
pub mod error;
pub mod reconcile;
pub mod snapshot;
pub mod types;
pub mod version;

pub use config::{desired_images, BuildConfig, DeclaredImage, ImagesConfig};
pub use error::ConfigError;
pub use reconcile::{reconcile, reconcile_report, LineDecision, LineOutcome, Reconciliation};
pub use snapshot::{reduce, reduce_snapshot, HighestVersionMap, RejectedTag, Snapshot};
pub use types::{BuildSet, ImageName, ImageSpec, RegistryImageRecord};
pub use version::{compare, ParseError, ParseVersion, Version, VersionScheme};

//! Loader for Terraform plan files.
//!
//! A plan file is the six bytes `tfplan`, a format version byte, then a gob
//! stream holding a single plan value. Each version has its own schema:
//! [`v1::Plan`] and [`v2::Plan`].
//!
//! ```no_run
//! use std::fs::File;
//!
//! let plan = tfplan::load(File::open("terraform.tfplan")?)?;
//! match &plan {
//!     tfplan::VersionedPlan::V1(plan) => println!("{} targets", plan.targets.len()),
//!     tfplan::VersionedPlan::V2(plan) => println!("destroy: {}", plan.destroy),
//!     _ => {}
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod common;
mod config_tree;
mod error;
mod header;
mod raw_config;
pub mod v1;
pub mod v2;

use std::io::Read;

use tfplan_gob::GobStreamDecoder;
use tracing::debug;

pub use config_tree::ConfigTree;
pub use error::LoadError;
pub use header::{read_header, PlanEnvelope, PLAN_MAGIC};
pub use raw_config::RawConfig;
pub use tfplan_gob::DecodeLimits;

/// Schema generation selected by the version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    V1,
    V2,
}

impl Generation {
    pub fn from_version(byte: u8) -> Result<Self, LoadError> {
        match byte {
            1 => Ok(Generation::V1),
            2 => Ok(Generation::V2),
            byte => Err(LoadError::UnsupportedVersion { byte }),
        }
    }

    pub fn version(self) -> u8 {
        match self {
            Generation::V1 => 1,
            Generation::V2 => 2,
        }
    }
}

/// A decoded plan, tagged with its format version.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum VersionedPlan {
    V1(v1::Plan),
    V2(v2::Plan),
}

impl VersionedPlan {
    pub fn generation(&self) -> Generation {
        match self {
            VersionedPlan::V1(_) => Generation::V1,
            VersionedPlan::V2(_) => Generation::V2,
        }
    }

    /// The version byte the plan was read with.
    pub fn format_version(&self) -> u8 {
        self.generation().version()
    }

    /// Version of Terraform that wrote the plan, when recorded.
    pub fn terraform_version(&self) -> Option<&str> {
        let version = match self {
            VersionedPlan::V1(plan) => plan.state.as_ref().map(|state| state.tf_version.as_str()),
            VersionedPlan::V2(plan) => Some(plan.terraform_version.as_str()),
        };
        version.filter(|v| !v.is_empty())
    }
}

/// Reads a plan file with the default [`DecodeLimits`].
pub fn load<R: Read>(source: R) -> Result<VersionedPlan, LoadError> {
    load_with_limits(source, DecodeLimits::default())
}

/// Reads a plan file. Bytes after the plan value are not read.
pub fn load_with_limits<R: Read>(
    mut source: R,
    limits: DecodeLimits,
) -> Result<VersionedPlan, LoadError> {
    let envelope = read_header(&mut source)?;
    let generation = Generation::from_version(envelope.version)?;
    debug!(version = envelope.version, ?generation, "plan header accepted");

    let mut stream = GobStreamDecoder::with_limits(source, limits);
    let plan = match generation {
        Generation::V1 => VersionedPlan::V1(stream.decode()?),
        Generation::V2 => VersionedPlan::V2(stream.decode()?),
    };
    Ok(plan)
}

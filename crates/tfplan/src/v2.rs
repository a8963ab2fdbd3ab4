//! Plans written with format version 2.
//!
//! Adds producer metadata to the plan, locals to configuration and state,
//! provider version constraints and ephemeral instance data.

use std::collections::BTreeMap;

use tfplan_gob::{record, Bytes, Dynamic};

pub use crate::common::*;
use crate::{ConfigTree, RawConfig};

/// The module tree of a version 2 plan.
pub type ModuleTree = ConfigTree<Config>;

record! {
    pub struct Plan as "Plan" {
        pub diff: Option<Diff> => "Diff",
        pub module: Option<ModuleTree> => "Module",
        pub state: Option<State> => "State",
        pub vars: BTreeMap<String, Dynamic> => "Vars",
        pub targets: Vec<String> => "Targets",
        pub terraform_version: String => "TerraformVersion",
        /// Provider plugin checksums keyed by provider name.
        pub provider_sha256s: BTreeMap<String, Bytes> => "ProviderSHA256s",
        pub backend: Option<BackendState> => "Backend",
        pub destroy: bool => "Destroy",
    }
}

record! {
    pub struct Config as "Config" {
        pub dir: String => "Dir",
        pub terraform: Option<Terraform> => "Terraform",
        pub atlas: Option<AtlasConfig> => "Atlas",
        pub modules: Vec<Module> => "Modules",
        pub provider_configs: Vec<ProviderConfig> => "ProviderConfigs",
        pub resources: Vec<Resource> => "Resources",
        pub variables: Vec<Variable> => "Variables",
        pub locals: Vec<Local> => "Locals",
        pub outputs: Vec<Output> => "Outputs",
    }
}

record! {
    /// A named local value.
    pub struct Local as "Local" {
        pub name: String => "Name",
        pub raw_config: Option<RawConfig> => "RawConfig",
    }
}

record! {
    pub struct ProviderConfig as "ProviderConfig" {
        pub name: String => "Name",
        pub alias: String => "Alias",
        pub version: String => "Version",
        pub raw_config: Option<RawConfig> => "RawConfig",
    }
}

record! {
    pub struct State as "State" {
        pub version: i64 => "Version",
        pub tf_version: String => "TFVersion",
        pub serial: i64 => "Serial",
        pub lineage: String => "Lineage",
        pub remote: Option<RemoteState> => "Remote",
        pub backend: Option<BackendState> => "Backend",
        pub modules: Vec<ModuleState> => "Modules",
    }
}

record! {
    pub struct ModuleState as "ModuleState" {
        pub path: Vec<String> => "Path",
        pub locals: BTreeMap<String, Dynamic> => "Locals",
        pub outputs: BTreeMap<String, OutputState> => "Outputs",
        pub resources: BTreeMap<String, ResourceState> => "Resources",
        pub dependencies: Vec<String> => "Dependencies",
    }
}

record! {
    pub struct ResourceState as "ResourceState" {
        pub resource_type: String => "Type",
        pub dependencies: Vec<String> => "Dependencies",
        pub primary: Option<InstanceState> => "Primary",
        pub deposed: Vec<InstanceState> => "Deposed",
        pub provider: String => "Provider",
    }
}

record! {
    pub struct InstanceState as "InstanceState" {
        pub id: String => "ID",
        pub attributes: BTreeMap<String, String> => "Attributes",
        pub ephemeral: EphemeralState => "Ephemeral",
        pub meta: BTreeMap<String, Dynamic> => "Meta",
        pub tainted: bool => "Tainted",
    }
}

record! {
    /// Instance data that is never persisted to state.
    pub struct EphemeralState as "EphemeralState" {
        pub conn_info: BTreeMap<String, String> => "ConnInfo",
        pub ephemeral_type: String => "Type",
    }
}

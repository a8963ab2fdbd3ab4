//! Plans written with format version 1.

use std::collections::BTreeMap;

use tfplan_gob::{record, Dynamic};

pub use crate::common::*;
use crate::{ConfigTree, RawConfig};

/// The module tree of a version 1 plan.
pub type ModuleTree = ConfigTree<Config>;

record! {
    /// Everything needed to apply a set of changes.
    pub struct Plan as "Plan" {
        pub diff: Option<Diff> => "Diff",
        pub module: Option<ModuleTree> => "Module",
        pub state: Option<State> => "State",
        pub vars: BTreeMap<String, Dynamic> => "Vars",
        pub targets: Vec<String> => "Targets",
        pub backend: Option<BackendState> => "Backend",
    }
}

record! {
    /// Configuration of a single module.
    pub struct Config as "Config" {
        pub dir: String => "Dir",
        pub terraform: Option<Terraform> => "Terraform",
        pub atlas: Option<AtlasConfig> => "Atlas",
        pub modules: Vec<Module> => "Modules",
        pub provider_configs: Vec<ProviderConfig> => "ProviderConfigs",
        pub resources: Vec<Resource> => "Resources",
        pub variables: Vec<Variable> => "Variables",
        pub outputs: Vec<Output> => "Outputs",
    }
}

record! {
    pub struct ProviderConfig as "ProviderConfig" {
        pub name: String => "Name",
        pub alias: String => "Alias",
        pub raw_config: Option<RawConfig> => "RawConfig",
    }
}

record! {
    /// Recorded infrastructure the diff was computed against.
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
        pub meta: BTreeMap<String, Dynamic> => "Meta",
        pub tainted: bool => "Tainted",
    }
}

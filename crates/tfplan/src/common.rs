//! Entities shared unchanged by both plan generations.

use std::collections::BTreeMap;

use tfplan_gob::{
    record, Decode, Descriptor, Dynamic, Encode, GobError, Session, TypeId, TypeRegistry,
    ValueDecoder, ValueEncoder,
};

use crate::RawConfig;

/// Integer-coded enumeration. Unknown codes are kept as they are.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($repr:ty) {
            $($(#[$variant_meta:meta])* $variant:ident = $code:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(pub $repr);

        impl $name {
            $(
                $(#[$variant_meta])*
                pub const $variant: $name = $name($code);
            )*
        }

        impl Decode for $name {
            fn check_wire(session: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
                <$repr>::check_wire(session, wire)
            }

            fn decode(values: &mut ValueDecoder<'_>, wire: &Descriptor) -> Result<Self, GobError> {
                <$repr>::decode(values, wire).map($name)
            }
        }

        impl Encode for $name {
            fn wire_type(registry: &mut TypeRegistry) -> Result<TypeId, GobError> {
                <$repr>::wire_type(registry)
            }

            fn is_zero(&self) -> bool {
                self.0 == 0
            }

            fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
                self.0.encode(values)
            }
        }
    };
}

code_enum! {
    /// How an attribute participates in a diff.
    pub struct DiffAttrType(u8) {
        UNKNOWN = 0,
        INPUT = 1,
        OUTPUT = 2,
    }
}

code_enum! {
    pub struct ResourceMode(i64) {
        MANAGED = 0,
        DATA = 1,
    }
}

code_enum! {
    /// When a provisioner runs.
    pub struct ProvisionerWhen(i64) {
        INVALID = 0,
        CREATE = 1,
        DESTROY = 2,
    }
}

code_enum! {
    pub struct ProvisionerOnFailure(i64) {
        INVALID = 0,
        CONTINUE = 1,
        FAIL = 2,
    }
}

record! {
    pub struct AtlasConfig as "AtlasConfig" {
        pub name: String => "Name",
        pub include: Vec<String> => "Include",
        pub exclude: Vec<String> => "Exclude",
    }
}

record! {
    /// A `backend` block of the configuration.
    pub struct Backend as "Backend" {
        pub backend_type: String => "Type",
        pub raw_config: Option<RawConfig> => "RawConfig",
        pub hash: u64 => "Hash",
    }
}

record! {
    /// The backend the plan was created against.
    pub struct BackendState as "BackendState" {
        pub backend_type: String => "Type",
        pub config: BTreeMap<String, Dynamic> => "Config",
        pub hash: u64 => "Hash",
    }
}

record! {
    pub struct Diff as "Diff" {
        pub modules: Vec<ModuleDiff> => "Modules",
    }
}

record! {
    pub struct ModuleDiff as "ModuleDiff" {
        pub path: Vec<String> => "Path",
        pub resources: BTreeMap<String, InstanceDiff> => "Resources",
        pub destroy: bool => "Destroy",
    }
}

record! {
    pub struct InstanceDiff as "InstanceDiff" {
        pub attributes: BTreeMap<String, ResourceAttrDiff> => "Attributes",
        pub destroy: bool => "Destroy",
        pub destroy_deposed: bool => "DestroyDeposed",
        pub destroy_tainted: bool => "DestroyTainted",
        pub meta: BTreeMap<String, Dynamic> => "Meta",
    }
}

record! {
    /// Old and new value of one attribute.
    pub struct ResourceAttrDiff as "ResourceAttrDiff" {
        pub old: String => "Old",
        pub new: String => "New",
        pub new_computed: bool => "NewComputed",
        pub new_removed: bool => "NewRemoved",
        pub new_extra: Dynamic => "NewExtra",
        pub requires_new: bool => "RequiresNew",
        pub sensitive: bool => "Sensitive",
        pub attr_type: DiffAttrType => "Type",
    }
}

record! {
    /// A `module` block calling a child module.
    pub struct Module as "Module" {
        pub name: String => "Name",
        pub source: String => "Source",
        pub raw_config: Option<RawConfig> => "RawConfig",
    }
}

record! {
    pub struct Output as "Output" {
        pub name: String => "Name",
        pub depends_on: Vec<String> => "DependsOn",
        pub description: String => "Description",
        pub sensitive: bool => "Sensitive",
        pub raw_config: Option<RawConfig> => "RawConfig",
    }
}

record! {
    pub struct OutputState as "OutputState" {
        pub sensitive: bool => "Sensitive",
        pub output_type: String => "Type",
        pub value: Dynamic => "Value",
    }
}

record! {
    pub struct Provisioner as "Provisioner" {
        pub provisioner_type: String => "Type",
        pub raw_config: Option<RawConfig> => "RawConfig",
        pub conn_info: Option<RawConfig> => "ConnInfo",
        pub when: ProvisionerWhen => "When",
        pub on_failure: ProvisionerOnFailure => "OnFailure",
    }
}

record! {
    /// Legacy remote state settings.
    pub struct RemoteState as "RemoteState" {
        pub remote_type: String => "Type",
        pub config: BTreeMap<String, String> => "Config",
    }
}

record! {
    pub struct Resource as "Resource" {
        pub mode: ResourceMode => "Mode",
        pub name: String => "Name",
        pub resource_type: String => "Type",
        pub raw_count: Option<RawConfig> => "RawCount",
        pub raw_config: Option<RawConfig> => "RawConfig",
        pub provisioners: Vec<Provisioner> => "Provisioners",
        pub provider: String => "Provider",
        pub depends_on: Vec<String> => "DependsOn",
        pub lifecycle: ResourceLifecycle => "Lifecycle",
    }
}

record! {
    pub struct ResourceLifecycle as "ResourceLifecycle" {
        pub create_before_destroy: bool => "CreateBeforeDestroy",
        pub prevent_destroy: bool => "PreventDestroy",
        pub ignore_changes: Vec<String> => "IgnoreChanges",
    }
}

record! {
    /// The `terraform` settings block.
    pub struct Terraform as "Terraform" {
        pub required_version: String => "RequiredVersion",
        pub backend: Option<Backend> => "Backend",
    }
}

record! {
    pub struct Variable as "Variable" {
        pub name: String => "Name",
        pub declared_type: String => "DeclaredType",
        pub default: Dynamic => "Default",
        pub description: String => "Description",
    }
}

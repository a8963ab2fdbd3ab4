//! The configuration module tree.

use std::collections::BTreeMap;

use tfplan_gob::hook::{self, OpaqueCodec};
use tfplan_gob::{
    Decode, Descriptor, Encode, FieldDeltas, GobError, GobStreamDecoder, GobStreamEncoder, Record,
    Session, TypeId, TypeRegistry, ValueDecoder, ValueEncoder,
};

/// Node of the module tree: a named configuration scope and its children.
///
/// Nodes are only reachable through the accessors. The stored name of a
/// child and its path are taken from the stream as they are; they are not
/// checked against the key the child is filed under.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree<C> {
    fields: TreeFields<C>,
}

/// The tree as it travels inside its opaque blob.
#[derive(Debug, Clone, PartialEq)]
struct TreeFields<C> {
    config: Option<C>,
    children: BTreeMap<String, ConfigTree<C>>,
    name: String,
    path: Vec<String>,
}

impl<C> Default for TreeFields<C> {
    fn default() -> Self {
        Self {
            config: None,
            children: BTreeMap::new(),
            name: String::new(),
            path: Vec::new(),
        }
    }
}

impl<C> ConfigTree<C> {
    pub fn new(name: impl Into<String>, path: Vec<String>, config: Option<C>) -> Self {
        Self {
            fields: TreeFields {
                config,
                children: BTreeMap::new(),
                name: name.into(),
                path,
            },
        }
    }

    /// A root node named `root` with an empty path.
    pub fn root(config: Option<C>) -> Self {
        Self::new("root", Vec::new(), config)
    }

    /// Adds `child` under its own name, replacing any child of that name.
    pub fn with_child(mut self, child: ConfigTree<C>) -> Self {
        self.fields
            .children
            .insert(child.fields.name.clone(), child);
        self
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn path(&self) -> &[String] {
        &self.fields.path
    }

    pub fn config(&self) -> Option<&C> {
        self.fields.config.as_ref()
    }

    pub fn child(&self, name: &str) -> Option<&ConfigTree<C>> {
        self.fields.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &ConfigTree<C>)> {
        self.fields
            .children
            .iter()
            .map(|(name, child)| (name.as_str(), child))
    }

    /// Follows `path` one child name at a time.
    pub fn descendant<S: AsRef<str>>(&self, path: &[S]) -> Option<&ConfigTree<C>> {
        path.iter()
            .try_fold(self, |node, segment| node.child(segment.as_ref()))
    }

    pub fn is_root(&self) -> bool {
        self.fields.path.is_empty()
    }
}

impl<C: Decode + Encode> Record for TreeFields<C> {
    const NAME: &'static str = "treeGob";
    const FIELDS: &'static [&'static str] = &["Config", "Children", "Name", "Path"];

    fn check_field(
        index: usize,
        session: &mut Session,
        wire: &Descriptor,
    ) -> Result<(), GobError> {
        match index {
            0 => Option::<C>::check_wire(session, wire),
            1 => BTreeMap::<String, ConfigTree<C>>::check_wire(session, wire),
            2 => String::check_wire(session, wire),
            3 => Vec::<String>::check_wire(session, wire),
            _ => Err(tfplan_gob::record::no_such_field(Self::NAME, index)),
        }
    }

    fn decode_field(
        &mut self,
        index: usize,
        values: &mut ValueDecoder<'_>,
        wire: &Descriptor,
    ) -> Result<(), GobError> {
        match index {
            0 => self.config = Decode::decode(values, wire)?,
            1 => self.children = Decode::decode(values, wire)?,
            2 => self.name = Decode::decode(values, wire)?,
            3 => self.path = Decode::decode(values, wire)?,
            _ => return Err(tfplan_gob::record::no_such_field(Self::NAME, index)),
        }
        Ok(())
    }

    fn field_wire_types(registry: &mut TypeRegistry) -> Result<Vec<TypeId>, GobError> {
        Ok(vec![
            Option::<C>::wire_type(registry)?,
            BTreeMap::<String, ConfigTree<C>>::wire_type(registry)?,
            String::wire_type(registry)?,
            Vec::<String>::wire_type(registry)?,
        ])
    }

    fn encode_fields(
        &self,
        values: &mut ValueEncoder<'_>,
        deltas: &mut FieldDeltas,
    ) -> Result<(), GobError> {
        values.encode_field(deltas, 0, &self.config)?;
        values.encode_field(deltas, 1, &self.children)?;
        values.encode_field(deltas, 2, &self.name)?;
        values.encode_field(deltas, 3, &self.path)
    }
}

impl<C: Decode + Encode> Decode for TreeFields<C> {
    fn check_wire(session: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        session.check_record::<Self>(wire)
    }

    fn decode(values: &mut ValueDecoder<'_>, wire: &Descriptor) -> Result<Self, GobError> {
        values.decode_record(wire)
    }
}

impl<C: Decode + Encode> Encode for TreeFields<C> {
    fn wire_type(registry: &mut TypeRegistry) -> Result<TypeId, GobError> {
        registry.record::<Self>()
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        values.encode_record(self)
    }
}

impl<C: Decode + Encode> OpaqueCodec for ConfigTree<C> {
    const NAME: &'static str = "Tree";

    fn decode_blob(stream: &mut GobStreamDecoder<&[u8]>) -> Result<Self, GobError> {
        Ok(ConfigTree {
            fields: stream.decode()?,
        })
    }

    fn encode_blob(&self, stream: &mut GobStreamEncoder<Vec<u8>>) -> Result<(), GobError> {
        stream.encode(&self.fields)
    }
}

impl<C: Decode + Encode> Decode for ConfigTree<C> {
    fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        hook::check_opaque::<Self>(wire)
    }

    fn decode(values: &mut ValueDecoder<'_>, wire: &Descriptor) -> Result<Self, GobError> {
        hook::decode_opaque(values, wire)
    }
}

impl<C: Decode + Encode> Encode for ConfigTree<C> {
    fn wire_type(registry: &mut TypeRegistry) -> Result<TypeId, GobError> {
        Ok(hook::opaque_wire_type::<Self>(registry))
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        hook::encode_opaque(self, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ConfigTree<String> {
        let path = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        ConfigTree::root(Some("main".to_string()))
            .with_child(
                ConfigTree::new("network", path(&["network"]), None).with_child(ConfigTree::new(
                    "subnets",
                    path(&["network", "subnets"]),
                    Some("subnets.tf".to_string()),
                )),
            )
            .with_child(ConfigTree::new("dns", path(&["dns"]), None))
    }

    #[test]
    fn navigation() {
        let tree = tree();
        assert!(tree.is_root());
        assert_eq!(tree.name(), "root");
        assert_eq!(tree.config().map(String::as_str), Some("main"));
        let names: Vec<&str> = tree.children().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["dns", "network"]);

        let subnets = tree.descendant(&["network", "subnets"]).unwrap();
        assert!(!subnets.is_root());
        assert_eq!(subnets.path(), ["network", "subnets"]);
        assert!(tree.descendant(&["network", "missing"]).is_none());
        assert!(tree.descendant::<&str>(&[]).is_some_and(ConfigTree::is_root));
    }

    #[test]
    fn blob_round_trip() {
        let tree = tree();
        let blob = hook::encode_blob(&tree).unwrap();
        let decoded: ConfigTree<String> = hook::decode_blob(&blob).unwrap();
        assert_eq!(decoded, tree);
    }
}

use serde::Serialize;

use super::chunk::Chunk;
use crate::error::{ErrorLayer, Result, ToolError};

/// Which of the entity class chunk flavors a class was stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EntityClassKind {
    GameObject,
    Ordnance,
    Weapon,
    Explosion,
}

impl EntityClassKind {
    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"entc" => Some(EntityClassKind::GameObject),
            b"ordc" => Some(EntityClassKind::Ordnance),
            b"wpnc" => Some(EntityClassKind::Weapon),
            b"expc" => Some(EntityClassKind::Explosion),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name_hash: u32,
    pub value: String,
}

/// An entity class definition as stored in a level.  The base is only known
/// by name here; resolving it to another loaded class happens across all
/// levels in `hierarchy::ClassRegistry`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityClass {
    pub kind: EntityClassKind,
    pub type_name: String,
    /// Empty when the class has no base at all.
    pub base_name: String,
    pub properties: Vec<Property>,
}

impl EntityClass {
    pub fn parse(chunk: &Chunk) -> Result<EntityClass> {
        let kind = EntityClassKind::from_tag(&chunk.tag.0).ok_or_else(|| {
            ToolError::sticky(
                ErrorLayer::BadInput,
                format!("Chunk '{}' is not an entity class", chunk.tag),
            )
        })?;

        let mut type_name = None;
        let mut base_name = String::new();
        let mut properties = vec![];

        for child in chunk.children() {
            let child = child?;
            match &child.tag.0 {
                b"TYPE" => type_name = Some(child.read_string()),
                b"BASE" => base_name = child.read_string(),
                b"PROP" => {
                    let name_hash = child.read_u32(0)?;
                    properties.push(Property {
                        name_hash,
                        value: super::chunk::read_c_string(&child.data[4..]),
                    });
                }
                _ => {}
            }
        }

        let type_name = match type_name {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(ToolError::sticky(
                    ErrorLayer::DataLayer,
                    format!(
                        "{:?} class at offset {} has no TYPE",
                        kind, chunk.offset
                    ),
                ))
            }
        };

        Ok(EntityClass {
            kind,
            type_name,
            base_name,
            properties,
        })
    }

    pub fn has_base_name(&self) -> bool {
        !self.base_name.is_empty()
    }
}

//! Contract ABIs and the action dispatch tables built from them.
//!
//! An [`Abi`] is the JSON document a contract publishes: type aliases,
//! struct layouts and the actions that use them. [`ActionRegistry`] turns
//! it into a lookup table of [`ActionDescriptor`]s once, so calls do not
//! walk the document again. [`AbiCache`] keeps one registry per contract
//! account for the lifetime of a client.

mod cache;
mod registry;

pub use cache::AbiCache;
pub use registry::{ActionDescriptor, ActionRegistry, FieldDescriptor};

use crate::error::{EosError, EosResult};
use serde::{Deserialize, Serialize};

/// Type name marking a field as an account reference.
pub const ACCOUNT_TYPE: &str = "account_name";

/// Longest alias chain or struct inheritance chain followed.
pub(crate) const MAX_TYPE_DEPTH: usize = 32;

/// A contract ABI.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Abi {
    /// Type aliases.
    #[serde(default)]
    pub types: Vec<AbiTypeDef>,
    /// Struct layouts.
    #[serde(default)]
    pub structs: Vec<AbiStruct>,
    /// Actions and their payload structs.
    #[serde(default)]
    pub actions: Vec<AbiAction>,
    /// Table declarations, kept as published.
    #[serde(default)]
    pub tables: Vec<serde_json::Value>,
}

/// `new_type_name` is an alias of `type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiTypeDef {
    /// The alias.
    pub new_type_name: String,
    /// The aliased type.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A struct layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiStruct {
    /// Struct name.
    pub name: String,
    /// Base struct whose fields come first; empty when none.
    #[serde(default)]
    pub base: String,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<AbiField>,
}

/// One field of a struct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiField {
    /// Field name.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// An action and the struct describing its payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiAction {
    /// Action name.
    #[serde(alias = "action_name")]
    pub name: String,
    /// Payload struct.
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Abi {
    /// Follows aliases until a non-alias type is reached.
    pub fn resolve_type<'a>(&'a self, type_name: &'a str) -> EosResult<&'a str> {
        let mut current = type_name;
        for _ in 0..MAX_TYPE_DEPTH {
            match self.types.iter().find(|t| t.new_type_name == current) {
                Some(alias) => current = &alias.type_name,
                None => return Ok(current),
            }
        }
        Err(EosError::serialization(format!(
            "alias chain of '{type_name}' is too deep"
        )))
    }

    /// Whether a type is an account reference anywhere along its alias chain.
    pub fn is_account_type(&self, type_name: &str) -> bool {
        let mut current = type_name;
        for _ in 0..MAX_TYPE_DEPTH {
            if current == ACCOUNT_TYPE {
                return true;
            }
            match self.types.iter().find(|t| t.new_type_name == current) {
                Some(alias) => current = &alias.type_name,
                None => return false,
            }
        }
        false
    }

    /// Finds a struct by name.
    pub fn find_struct(&self, name: &str) -> Option<&AbiStruct> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// All fields of a struct, base fields first.
    pub fn struct_fields(&self, name: &str) -> EosResult<Vec<&AbiField>> {
        let mut chain = Vec::new();
        let mut current = name;
        while !current.is_empty() {
            if chain.len() >= MAX_TYPE_DEPTH {
                return Err(EosError::serialization(format!(
                    "inheritance chain of '{name}' is too deep"
                )));
            }
            let resolved = self.resolve_type(current)?;
            let found = self.find_struct(resolved).ok_or_else(|| {
                EosError::serialization(format!("struct '{resolved}' is not in the abi"))
            })?;
            chain.push(found);
            current = &found.base;
        }
        Ok(chain
            .into_iter()
            .rev()
            .flat_map(|s| s.fields.iter())
            .collect())
    }
}


#[cfg(test)]
mod tests {
    use super::test_abi::token_abi;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_aliases() {
        let abi = token_abi();
        assert_eq!(abi.resolve_type("producer_name").unwrap(), "name");
        assert_eq!(abi.resolve_type("uint64").unwrap(), "uint64");
        assert!(abi.is_account_type("producer_name"));
        assert!(abi.is_account_type("account_name"));
        assert!(!abi.is_account_type("name"));
        assert!(!abi.is_account_type("string"));
    }

    #[test]
    fn test_alias_cycle_is_an_error() {
        let abi: Abi = serde_json::from_value(json!({
            "types": [
                {"new_type_name": "a", "type": "b"},
                {"new_type_name": "b", "type": "a"}
            ]
        }))
        .unwrap();
        assert!(abi.resolve_type("a").is_err());
        assert!(!abi.is_account_type("a"));
    }

    #[test]
    fn test_struct_fields_include_base_first() {
        let abi: Abi = serde_json::from_value(json!({
            "structs": [
                {"name": "base", "fields": [{"name": "owner", "type": "account_name"}]},
                {"name": "child", "base": "base", "fields": [{"name": "value", "type": "uint32"}]}
            ]
        }))
        .unwrap();
        let names: Vec<&str> = abi
            .struct_fields("child")
            .unwrap()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["owner", "value"]);
        assert!(abi.struct_fields("missing").is_err());
    }

    #[test]
    fn test_action_name_alias() {
        let abi = token_abi();
        assert_eq!(abi.actions[0].name, "transfer");
        let modern: AbiAction =
            serde_json::from_value(json!({"name": "transfer", "type": "transfer"})).unwrap();
        assert_eq!(modern.name, "transfer");
    }
}

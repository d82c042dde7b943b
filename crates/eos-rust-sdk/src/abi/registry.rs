use crate::abi::Abi;
use crate::error::{EosError, EosResult};
use crate::types::Name;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A payload field as seen by callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub type_name: String,
    /// Whether the field names an account.
    pub is_account: bool,
}

/// Everything needed to turn call arguments into a message for one action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionDescriptor {
    /// Action name.
    pub name: Name,
    /// Payload struct name.
    pub struct_name: String,
    /// Payload fields in positional order.
    pub fields: Vec<FieldDescriptor>,
}

impl ActionDescriptor {
    /// Fields that name accounts, in positional order.
    pub fn account_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_account)
    }

    /// Finds a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Dispatch table of a contract: action name to [`ActionDescriptor`].
///
/// # Example
///
/// ```rust
/// use eos_rust_sdk::abi::{Abi, ActionRegistry};
///
/// let abi: Abi = serde_json::from_value(serde_json::json!({
///     "types": [{"new_type_name": "account_name", "type": "name"}],
///     "structs": [{"name": "transfer", "base": "", "fields": [
///         {"name": "from", "type": "account_name"},
///         {"name": "to", "type": "account_name"},
///         {"name": "amount", "type": "uint64"},
///         {"name": "memo", "type": "string"}
///     ]}],
///     "actions": [{"action_name": "transfer", "type": "transfer"}]
/// })).unwrap();
///
/// let registry = ActionRegistry::from_abi(abi).unwrap();
/// let transfer = registry.get("transfer").unwrap();
/// assert_eq!(transfer.account_fields().count(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct ActionRegistry {
    abi: Arc<Abi>,
    actions: BTreeMap<String, ActionDescriptor>,
}

impl ActionRegistry {
    /// Builds the table, resolving every action's payload layout.
    ///
    /// # Errors
    ///
    /// Fails if an action name is not a valid name or its payload struct
    /// cannot be resolved.
    pub fn from_abi(abi: Abi) -> EosResult<Self> {
        let mut actions = BTreeMap::new();
        for action in &abi.actions {
            let name = Name::new(action.name.as_str())?;
            let struct_name = abi.resolve_type(&action.type_name)?.to_string();
            let fields = abi
                .struct_fields(&struct_name)?
                .into_iter()
                .map(|field| FieldDescriptor {
                    name: field.name.clone(),
                    type_name: field.type_name.clone(),
                    is_account: abi.is_account_type(&field.type_name),
                })
                .collect();
            actions.insert(
                name.to_string(),
                ActionDescriptor {
                    name,
                    struct_name,
                    fields,
                },
            );
        }
        Ok(Self {
            abi: Arc::new(abi),
            actions,
        })
    }

    /// The ABI the table was built from.
    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    /// Looks up an action.
    pub fn get(&self, action: &str) -> Option<&ActionDescriptor> {
        self.actions.get(action)
    }

    /// Looks up an action, failing with a usage error when it is unknown.
    pub fn require(&self, contract: &Name, action: &str) -> EosResult<&ActionDescriptor> {
        self.get(action).ok_or_else(|| {
            EosError::invalid_usage(format!("contract '{contract}' has no action '{action}'"))
        })
    }

    /// Action names, sorted.
    pub fn action_names(&self) -> impl Iterator<Item = &Name> {
        self.actions.values().map(|descriptor| &descriptor.name)
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the contract declares no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::test_abi::token_abi;
    use serde_json::json;

    #[test]
    fn test_registry_from_token_abi() {
        let registry = ActionRegistry::from_abi(token_abi()).unwrap();
        let names: Vec<&str> = registry.action_names().map(Name::as_str).collect();
        assert_eq!(names, vec!["newaccount", "okproducer", "transfer"]);

        let okproducer = registry.get("okproducer").unwrap();
        let accounts: Vec<&str> = okproducer
            .account_fields()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(accounts, vec!["voter", "producer"]);
        assert!(okproducer.field("approve").is_some());
    }

    #[test]
    fn test_unknown_action() {
        let registry = ActionRegistry::from_abi(token_abi()).unwrap();
        let contract = Name::new("eos").unwrap();
        let err = registry.require(&contract, "burn").unwrap_err();
        assert!(matches!(err, EosError::InvalidUsage(_)));
    }

    #[test]
    fn test_missing_payload_struct_fails() {
        let abi: Abi = serde_json::from_value(json!({
            "actions": [{"action_name": "ghost", "type": "nothing"}]
        }))
        .unwrap();
        assert!(ActionRegistry::from_abi(abi).is_err());
    }
}

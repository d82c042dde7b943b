//! Turning a contract call into a message.

use crate::abi::ActionDescriptor;
use crate::error::{EosError, EosResult};
use crate::transaction::options::CallOptions;
use crate::transaction::types::{Authorization, Message};
use crate::types::Name;
use serde_json::{Map, Value};

/// Arguments of a contract call.
///
/// Positional arguments map onto the payload struct's fields in declaration
/// order. Named arguments are keyed by field name.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionArgs {
    /// One value per field, in field order.
    Positional(Vec<Value>),
    /// Values keyed by field name.
    Named(Map<String, Value>),
}

impl From<Vec<Value>> for ActionArgs {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl From<Map<String, Value>> for ActionArgs {
    fn from(fields: Map<String, Value>) -> Self {
        Self::Named(fields)
    }
}

/// Objects become named arguments, arrays positional ones, and any other
/// value a single positional argument.
impl From<Value> for ActionArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self::Named(fields),
            Value::Array(values) => Self::Positional(values),
            other => Self::Positional(vec![other]),
        }
    }
}

/// A message ready to be finalized or appended to a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMessage {
    /// The message, authorization canonicalized.
    pub message: Message,
    /// Accounts the message writes to.
    pub scope: Vec<Name>,
}

/// Builds messages for one action of one contract.
///
/// When the options carry no authorization, the first account-typed field
/// signs with `active`. When they carry no scope, every account-typed field
/// value is in scope.
///
/// # Example
///
/// ```rust
/// use eos_rust_sdk::abi::{Abi, ActionRegistry};
/// use eos_rust_sdk::transaction::MessageBuilder;
/// use eos_rust_sdk::{CallOptions, Name};
/// use serde_json::json;
///
/// let abi: Abi = serde_json::from_value(json!({
///     "types": [{"new_type_name": "account_name", "type": "name"}],
///     "structs": [{"name": "transfer", "fields": [
///         {"name": "from", "type": "account_name"},
///         {"name": "to", "type": "account_name"},
///         {"name": "amount", "type": "uint64"},
///         {"name": "memo", "type": "string"}
///     ]}],
///     "actions": [{"action_name": "transfer", "type": "transfer"}]
/// })).unwrap();
/// let registry = ActionRegistry::from_abi(abi).unwrap();
/// let contract = Name::new("eos").unwrap();
///
/// let prepared = MessageBuilder::new(&contract, registry.get("transfer").unwrap())
///     .build(json!(["inita", "initb", 1, ""]), &CallOptions::new())
///     .unwrap();
/// assert_eq!(prepared.message.authorization[0].to_string(), "inita@active");
/// assert_eq!(prepared.scope.len(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MessageBuilder<'a> {
    contract: &'a Name,
    descriptor: &'a ActionDescriptor,
}

impl<'a> MessageBuilder<'a> {
    /// A builder for `descriptor` on `contract`.
    pub fn new(contract: &'a Name, descriptor: &'a ActionDescriptor) -> Self {
        Self {
            contract,
            descriptor,
        }
    }

    /// Builds the message.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::InvalidUsage`] when the arguments do not match the
    /// payload fields, an account field is not a valid name, or no signer
    /// can be inferred; name errors for malformed options.
    pub fn build(&self, args: impl Into<ActionArgs>, options: &CallOptions) -> EosResult<PreparedMessage> {
        let fields = self.fields(args.into())?;
        let accounts = self.account_values(&fields)?;

        let mut authorization = options.parsed_authorization()?;
        if authorization.is_empty() {
            let signer = accounts.first().ok_or_else(|| {
                EosError::invalid_usage(format!(
                    "{} has no account field; pass an authorization",
                    self.label()
                ))
            })?;
            authorization.push(Authorization::active(signer.clone()));
        }

        let mut scope = options.parsed_scope()?;
        if scope.is_empty() {
            scope = accounts;
        }
        scope.sort();
        scope.dedup();

        Ok(PreparedMessage {
            message: Message::new(
                self.contract.clone(),
                self.descriptor.name.clone(),
                authorization,
                fields,
            ),
            scope,
        })
    }

    fn label(&self) -> String {
        format!("{}::{}", self.contract, self.descriptor.name)
    }

    fn fields(&self, args: ActionArgs) -> EosResult<Map<String, Value>> {
        let declared = &self.descriptor.fields;
        match args {
            ActionArgs::Positional(values) => {
                if values.len() != declared.len() {
                    return Err(EosError::invalid_usage(format!(
                        "{} takes {} arguments ({}), got {}",
                        self.label(),
                        declared.len(),
                        declared
                            .iter()
                            .map(|f| f.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                        values.len()
                    )));
                }
                Ok(declared
                    .iter()
                    .map(|f| f.name.clone())
                    .zip(values)
                    .collect())
            }
            ActionArgs::Named(fields) => {
                if let Some(unknown) = fields.keys().find(|key| self.descriptor.field(key).is_none()) {
                    return Err(EosError::invalid_usage(format!(
                        "{} has no field '{unknown}'",
                        self.label()
                    )));
                }
                if let Some(missing) = declared
                    .iter()
                    .find(|f| !f.type_name.ends_with('?') && !fields.contains_key(&f.name))
                {
                    return Err(EosError::invalid_usage(format!(
                        "{} is missing field '{}'",
                        self.label(),
                        missing.name
                    )));
                }
                Ok(fields)
            }
        }
    }

    /// Values of the account-typed fields, in field order.
    fn account_values(&self, fields: &Map<String, Value>) -> EosResult<Vec<Name>> {
        self.descriptor
            .account_fields()
            .filter_map(|field| fields.get(&field.name).map(|value| (field, value)))
            .map(|(field, value)| {
                value
                    .as_str()
                    .ok_or_else(|| {
                        EosError::invalid_usage(format!(
                            "{} field '{}' must be an account name, got {value}",
                            self.label(),
                            field.name
                        ))
                    })
                    .and_then(Name::new)
            })
            .collect()
    }
}

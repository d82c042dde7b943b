//! Binary encoding of action payloads and transactions.
//!
//! Payloads are encoded against the contract's [`Abi`]: aliases are
//! followed, structs are written field by field (base struct first) and
//! built-in types use their fixed little-endian layouts. Lengths are
//! `varuint32` (LEB128).
//!
//! The transaction layout signed by keys is:
//!
//! | Field | Encoding |
//! |-------|----------|
//! | `ref_block_num` | `u16` |
//! | `ref_block_prefix` | `u32` |
//! | `expiration` | `u32` seconds |
//! | `scope`, `read_scope` | `vector<name>` |
//! | `messages` | `vector<{code, type, vector<{account, permission}>, bytes}>` |
//!
//! Signatures are not part of the signed bytes.

use crate::abi::{Abi, MAX_TYPE_DEPTH};
use crate::crypto::{PublicKey, Signature};
use crate::error::{EosError, EosResult};
use crate::transaction::{Message, Transaction};
use crate::types::{Asset, Name, TimePointSec};
use serde_json::Value;
use std::fmt;

/// Encodes action payloads and serializes transactions for signing.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Encodes `data` as a value of `type_name` declared in `abi`.
    fn encode(&self, abi: &Abi, type_name: &str, data: &Value) -> EosResult<Vec<u8>>;

    /// Serializes a transaction whose payloads are all encoded.
    fn serialize_transaction(&self, transaction: &Transaction) -> EosResult<Vec<u8>>;
}

/// The default [`Codec`].
///
/// # Example
///
/// ```rust
/// use eos_rust_sdk::abi::Abi;
/// use eos_rust_sdk::codec::{AbiCodec, Codec};
/// use serde_json::json;
///
/// let bytes = AbiCodec
///     .encode(&Abi::default(), "uint16", &json!(513))
///     .unwrap();
/// assert_eq!(bytes, vec![0x01, 0x02]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiCodec;

impl Codec for AbiCodec {
    fn encode(&self, abi: &Abi, type_name: &str, data: &Value) -> EosResult<Vec<u8>> {
        let mut writer = Writer::default();
        writer.write_value(abi, type_name, data, 0)?;
        Ok(writer.into_bytes())
    }

    fn serialize_transaction(&self, transaction: &Transaction) -> EosResult<Vec<u8>> {
        let expiration = transaction
            .expiration
            .ok_or_else(|| EosError::serialization("transaction has no expiration"))?;

        let mut writer = Writer::default();
        writer.put(&transaction.ref_block_num.to_le_bytes());
        writer.put(&transaction.ref_block_prefix.to_le_bytes());
        writer.put(&expiration.as_secs().to_le_bytes());
        writer.write_names(&transaction.scope)?;
        writer.write_names(&transaction.read_scope)?;
        writer.write_len(transaction.messages.len())?;
        for message in &transaction.messages {
            writer.write_message(message)?;
        }
        Ok(writer.into_bytes())
    }
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn write_varuint32(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return;
            }
            self.buf.push(byte | 0x80);
        }
    }

    fn write_len(&mut self, len: usize) -> EosResult<()> {
        let len = u32::try_from(len)
            .map_err(|_| EosError::serialization(format!("length {len} exceeds varuint32")))?;
        self.write_varuint32(len);
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> EosResult<()> {
        self.write_len(bytes.len())?;
        self.put(bytes);
        Ok(())
    }

    /// Writes names sorted and deduplicated, whatever order they are held in.
    fn write_names(&mut self, names: &[Name]) -> EosResult<()> {
        let mut sorted: Vec<&Name> = names.iter().collect();
        sorted.sort();
        sorted.dedup();
        self.write_len(sorted.len())?;
        for name in sorted {
            self.put(&name.to_u64().to_le_bytes());
        }
        Ok(())
    }

    fn write_message(&mut self, message: &Message) -> EosResult<()> {
        self.put(&message.code.to_u64().to_le_bytes());
        self.put(&message.action.to_u64().to_le_bytes());

        let mut authorization: Vec<_> = message.authorization.iter().collect();
        authorization.sort();
        authorization.dedup();
        self.write_len(authorization.len())?;
        for auth in authorization {
            self.put(&auth.account.to_u64().to_le_bytes());
            self.put(&auth.permission.to_u64().to_le_bytes());
        }

        let data = message.data.encoded_bytes().map_err(|_| {
            EosError::serialization(format!(
                "payload of {}::{} is not encoded",
                message.code, message.action
            ))
        })?;
        self.write_bytes(&data)
    }

    fn write_value(&mut self, abi: &Abi, type_name: &str, value: &Value, depth: usize) -> EosResult<()> {
        if depth > MAX_TYPE_DEPTH {
            return Err(EosError::serialization(format!(
                "type '{type_name}' is nested too deeply"
            )));
        }

        if let Some(item_type) = type_name.strip_suffix("[]") {
            let items = value.as_array().ok_or_else(|| mismatch(type_name, value))?;
            self.write_len(items.len())?;
            for item in items {
                self.write_value(abi, item_type, item, depth + 1)?;
            }
            return Ok(());
        }

        if let Some(inner_type) = type_name.strip_suffix('?') {
            if value.is_null() {
                self.buf.push(0);
                return Ok(());
            }
            self.buf.push(1);
            return self.write_value(abi, inner_type, value, depth + 1);
        }

        let resolved = abi.resolve_type(type_name)?;
        if resolved != type_name {
            return self.write_value(abi, resolved, value, depth + 1);
        }

        if self.write_builtin(type_name, value)? {
            return Ok(());
        }

        match abi.find_struct(type_name) {
            Some(_) => self.write_struct(abi, type_name, value, depth),
            None => Err(EosError::serialization(format!(
                "unknown type '{type_name}'"
            ))),
        }
    }

    fn write_struct(&mut self, abi: &Abi, struct_name: &str, value: &Value, depth: usize) -> EosResult<()> {
        let object = value
            .as_object()
            .ok_or_else(|| mismatch(struct_name, value))?;
        let fields = abi.struct_fields(struct_name)?;

        if let Some(unknown) = object
            .keys()
            .find(|key| !fields.iter().any(|f| &f.name == *key))
        {
            return Err(EosError::serialization(format!(
                "struct '{struct_name}' has no field '{unknown}'"
            )));
        }

        for field in fields {
            match object.get(&field.name) {
                Some(field_value) => {
                    self.write_value(abi, &field.type_name, field_value, depth + 1)?;
                }
                None if field.type_name.ends_with('?') => self.buf.push(0),
                None => {
                    return Err(EosError::serialization(format!(
                        "missing field '{}' of '{struct_name}'",
                        field.name
                    )))
                }
            }
        }
        Ok(())
    }

    /// Writes a built-in type; `Ok(false)` when `type_name` is not one.
    fn write_builtin(&mut self, type_name: &str, value: &Value) -> EosResult<bool> {
        match type_name {
            "bool" => {
                let flag = match value {
                    Value::Bool(flag) => *flag,
                    _ => match integer(type_name, value)? {
                        0 => false,
                        1 => true,
                        _ => return Err(mismatch(type_name, value)),
                    },
                };
                self.buf.push(u8::from(flag));
            }
            "int8" => self.put(&narrow::<i8>(type_name, value)?.to_le_bytes()),
            "uint8" => self.put(&narrow::<u8>(type_name, value)?.to_le_bytes()),
            "int16" => self.put(&narrow::<i16>(type_name, value)?.to_le_bytes()),
            "uint16" => self.put(&narrow::<u16>(type_name, value)?.to_le_bytes()),
            "int32" => self.put(&narrow::<i32>(type_name, value)?.to_le_bytes()),
            "uint32" => self.put(&narrow::<u32>(type_name, value)?.to_le_bytes()),
            "int64" => self.put(&narrow::<i64>(type_name, value)?.to_le_bytes()),
            "uint64" => self.put(&narrow::<u64>(type_name, value)?.to_le_bytes()),
            "int128" => self.put(&integer(type_name, value)?.to_le_bytes()),
            "uint128" => self.put(&unsigned128(type_name, value)?.to_le_bytes()),
            "varuint32" => {
                let v = narrow::<u32>(type_name, value)?;
                self.write_varuint32(v);
            }
            "varint32" => {
                let v = narrow::<i32>(type_name, value)?;
                // zigzag
                self.write_varuint32(((v << 1) ^ (v >> 31)) as u32);
            }
            "float32" => {
                #[allow(clippy::cast_possible_truncation)]
                let v = float(type_name, value)? as f32;
                self.put(&v.to_le_bytes());
            }
            "float64" => self.put(&float(type_name, value)?.to_le_bytes()),
            "name" | "account_name" | "permission_name" | "action_name" | "func_name"
            | "table_name" | "scope_name" | "type_name" => {
                let name = Name::new(text(type_name, value)?)?;
                self.put(&name.to_u64().to_le_bytes());
            }
            "string" => {
                let s = text(type_name, value)?;
                self.write_bytes(s.as_bytes())?;
            }
            "bytes" => {
                let bytes = hex::decode(text(type_name, value)?)?;
                self.write_bytes(&bytes)?;
            }
            "public_key" => {
                let key: PublicKey = text(type_name, value)?.parse()?;
                self.put(&key.to_bytes());
            }
            "signature" => {
                let signature: Signature = text(type_name, value)?.parse()?;
                self.put(&signature.to_bytes());
            }
            "asset" => {
                let asset: Asset = text(type_name, value)?.parse()?;
                self.put(&asset.amount().to_le_bytes());
                self.put(&asset.symbol_code().to_le_bytes());
            }
            "time" | "time_point_sec" => {
                let time = match value {
                    Value::String(s) => s.parse::<TimePointSec>()?,
                    _ => TimePointSec::from_secs(narrow::<u32>(type_name, value)?),
                };
                self.put(&time.as_secs().to_le_bytes());
            }
            "checksum160" => self.write_checksum(type_name, value, 20)?,
            "checksum256" => self.write_checksum(type_name, value, 32)?,
            "checksum512" => self.write_checksum(type_name, value, 64)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_checksum(&mut self, type_name: &str, value: &Value, len: usize) -> EosResult<()> {
        let bytes = hex::decode(text(type_name, value)?)?;
        if bytes.len() != len {
            return Err(EosError::serialization(format!(
                "{type_name} needs {len} bytes, got {}",
                bytes.len()
            )));
        }
        self.put(&bytes);
        Ok(())
    }
}

fn mismatch(type_name: &str, value: &Value) -> EosError {
    EosError::serialization(format!("expected {type_name}, got {value}"))
}

fn text<'a>(type_name: &str, value: &'a Value) -> EosResult<&'a str> {
    value.as_str().ok_or_else(|| mismatch(type_name, value))
}

/// Integers arrive as JSON numbers or as decimal strings.
fn integer(type_name: &str, value: &Value) -> EosResult<i128> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| mismatch(type_name, value))
}

fn unsigned128(type_name: &str, value: &Value) -> EosResult<u128> {
    match value {
        Value::String(s) => s.trim().parse::<u128>().map_err(|_| mismatch(type_name, value)),
        _ => u128::try_from(integer(type_name, value)?).map_err(|_| mismatch(type_name, value)),
    }
}

fn narrow<T: TryFrom<i128>>(type_name: &str, value: &Value) -> EosResult<T> {
    let wide = integer(type_name, value)?;
    T::try_from(wide)
        .map_err(|_| EosError::serialization(format!("{wide} is out of range for {type_name}")))
}

fn float(type_name: &str, value: &Value) -> EosResult<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| mismatch(type_name, value))
}

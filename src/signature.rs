//! Callable Signatures
//!
//! Structural type descriptors for a callable's declared parameters and
//! returns. Descriptors drive the coercion and conversion passes; record
//! descriptors additionally carry the structural-decode hook that populates
//! a new record instance from a loose mapping.

use std::any::TypeId;
use std::fmt;

use serde_json::{json, Value};

use crate::value::{RecordType, RecordValue};

/// Structural kind of a declared parameter or return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    /// Accepts any value unchanged.
    Any,
    Bool,
    /// Signed integer kind. Concrete widths narrow at the trampoline.
    Int,
    /// Unsigned integer kind.
    Uint,
    Float,
    Str,
    /// Variable-size sequence of the element type.
    List(Box<TypeDesc>),
    /// Fixed-size sequence of the element type.
    Array(Box<TypeDesc>, usize),
    /// Loose string-keyed mapping, passed through undecoded.
    Map,
    /// Structured record decoded field-by-field from a mapping.
    Record(RecordDesc),
    /// A failure-capable return slot. Never valid as a parameter type.
    Failure,
}

/// Descriptor for a record type: its identity plus the decode hook used by
/// the coercer to build a new instance from a loose mapping.
#[derive(Clone, Copy)]
pub struct RecordDesc {
    name: &'static str,
    id: TypeId,
    decode: fn(Value) -> Result<RecordValue, serde_json::Error>,
}

impl RecordDesc {
    pub fn of<T: RecordType>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
            decode: decode_record::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Decode a loose mapping into a new instance of the record type.
    /// Missing-field leniency follows the decoder; fundamentally
    /// undecodable data errors.
    pub fn decode(&self, loose: Value) -> Result<RecordValue, serde_json::Error> {
        (self.decode)(loose)
    }
}

fn decode_record<T: RecordType>(loose: Value) -> Result<RecordValue, serde_json::Error> {
    serde_json::from_value::<T>(loose).map(RecordValue::new)
}

impl PartialEq for RecordDesc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RecordDesc {}

impl fmt::Debug for RecordDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDesc").field("name", &self.name).finish()
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Any => write!(f, "any"),
            TypeDesc::Bool => write!(f, "bool"),
            TypeDesc::Int => write!(f, "int"),
            TypeDesc::Uint => write!(f, "uint"),
            TypeDesc::Float => write!(f, "float"),
            TypeDesc::Str => write!(f, "string"),
            TypeDesc::List(elem) => write!(f, "list<{}>", elem),
            TypeDesc::Array(elem, len) => write!(f, "array<{}; {}>", elem, len),
            TypeDesc::Map => write!(f, "map"),
            TypeDesc::Record(desc) => {
                let short = desc.name.rsplit("::").next().unwrap_or(desc.name);
                write!(f, "record {}", short)
            }
            TypeDesc::Failure => write!(f, "error"),
        }
    }
}

/// Ordered parameter and return type descriptors of a callable. Immutable;
/// built by the trampoline from the static function type.
#[derive(Debug, Clone)]
pub struct Signature {
    params: Vec<TypeDesc>,
    returns: Vec<TypeDesc>,
}

impl Signature {
    pub fn new(params: Vec<TypeDesc>, returns: Vec<TypeDesc>) -> Self {
        Self { params, returns }
    }

    pub fn params(&self) -> &[TypeDesc] {
        &self.params
    }

    pub fn returns(&self) -> &[TypeDesc] {
        &self.returns
    }

    /// Loose descriptor of the signature: parameter and return type names in
    /// declaration order. Intended for callers that surface callables to an
    /// untyped world (prompts, RPC catalogs, debugging).
    pub fn describe(&self) -> Value {
        json!({
            "params": self.params.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            "returns": self.returns.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Serialize, Deserialize)]
    struct Profile {
        name: String,
    }

    crate::record!(Profile);

    #[test]
    fn test_record_desc_equality_is_type_identity() {
        assert_eq!(RecordDesc::of::<Profile>(), RecordDesc::of::<Profile>());
    }

    #[test]
    fn test_describe_lists_type_names_in_order() {
        let sig = Signature::new(
            vec![
                TypeDesc::Record(RecordDesc::of::<Profile>()),
                TypeDesc::List(Box::new(TypeDesc::Int)),
            ],
            vec![TypeDesc::Str, TypeDesc::Failure],
        );
        assert_eq!(
            sig.describe(),
            json!({
                "params": ["record Profile", "list<int>"],
                "returns": ["string", "error"],
            })
        );
    }

    #[test]
    fn test_decode_reports_undecodable_data() {
        let desc = RecordDesc::of::<Profile>();
        assert!(desc.decode(json!({"name": "x"})).is_ok());
        assert!(desc.decode(json!(42)).is_err());
    }
}

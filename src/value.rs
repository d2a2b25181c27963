//! Typed Value Model
//!
//! Runtime values crossing the call boundary. Loose `serde_json::Value`s are
//! lifted into [`TypedValue`]s during coercion and lowered back when results
//! are normalized. Record instances travel type-erased inside
//! [`RecordValue`], which pairs the boxed struct with its downcast and
//! loose-projection hooks.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::signature::TypeDesc;

/// Marker for struct types that can be decoded structurally from a loose
/// mapping and projected back into one. Registered with the
/// [`record!`](crate::record) macro.
pub trait RecordType: Serialize + DeserializeOwned + Send + 'static {}

/// A value coerced to match a declared parameter or return type.
#[derive(Debug)]
pub enum TypedValue {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Seq(SeqValue),
    Map(Map<String, Value>),
    Record(RecordValue),
}

/// A sequence value together with its element type descriptor. `fixed` is
/// `Some(len)` for fixed-size (array) values and `None` for variable-size
/// (list) values.
#[derive(Debug)]
pub struct SeqValue {
    pub elem: TypeDesc,
    pub fixed: Option<usize>,
    pub items: Vec<TypedValue>,
}

/// A type-erased record instance.
pub struct RecordValue {
    name: &'static str,
    id: TypeId,
    inner: Box<dyn Any + Send>,
    to_loose: fn(&(dyn Any + Send)) -> Value,
}

impl TypedValue {
    /// Lift a loose value into the typed representation, following its own
    /// concrete shape. Loose sequences keep `any`-typed elements until the
    /// conversion pass reconciles them with a declared element type.
    pub fn from_loose(loose: &Value) -> TypedValue {
        match loose {
            Value::Null => TypedValue::Nil,
            Value::Bool(b) => TypedValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    TypedValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    TypedValue::Uint(u)
                } else {
                    TypedValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => TypedValue::Str(s.clone()),
            Value::Array(items) => TypedValue::Seq(SeqValue {
                elem: TypeDesc::Any,
                fixed: None,
                items: items.iter().map(TypedValue::from_loose).collect(),
            }),
            Value::Object(map) => TypedValue::Map(map.clone()),
        }
    }

    /// Lower the value back into the loose representation (generic boxing).
    pub fn to_loose(&self) -> Value {
        match self {
            TypedValue::Nil => Value::Null,
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Int(i) => Value::Number(Number::from(*i)),
            TypedValue::Uint(u) => Value::Number(Number::from(*u)),
            TypedValue::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            TypedValue::Str(s) => Value::String(s.clone()),
            TypedValue::Seq(seq) => Value::Array(seq.items.iter().map(|v| v.to_loose()).collect()),
            TypedValue::Map(map) => Value::Object(map.clone()),
            TypedValue::Record(rec) => rec.to_loose(),
        }
    }

    /// Short structural kind name, used in contract-violation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::Nil => "nil",
            TypedValue::Bool(_) => "bool",
            TypedValue::Int(_) => "int",
            TypedValue::Uint(_) => "uint",
            TypedValue::Float(_) => "float",
            TypedValue::Str(_) => "string",
            TypedValue::Seq(seq) => {
                if seq.fixed.is_some() {
                    "array"
                } else {
                    "list"
                }
            }
            TypedValue::Map(_) => "map",
            TypedValue::Record(_) => "record",
        }
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypedValue::Nil, TypedValue::Nil) => true,
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a == b,
            (TypedValue::Int(a), TypedValue::Int(b)) => a == b,
            (TypedValue::Uint(a), TypedValue::Uint(b)) => a == b,
            (TypedValue::Float(a), TypedValue::Float(b)) => a == b,
            (TypedValue::Str(a), TypedValue::Str(b)) => a == b,
            (TypedValue::Seq(a), TypedValue::Seq(b)) => a.items == b.items,
            (TypedValue::Map(a), TypedValue::Map(b)) => a == b,
            (TypedValue::Record(a), TypedValue::Record(b)) => {
                a.id == b.id && a.to_loose() == b.to_loose()
            }
            _ => false,
        }
    }
}

impl RecordValue {
    /// Box a record instance, capturing its loose-projection hook.
    pub fn new<T: RecordType>(record: T) -> Self {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
            inner: Box::new(record),
            to_loose: loose_projection::<T>,
        }
    }

    /// Recover the concrete record. Returns the value unchanged when the
    /// requested type does not match.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let Self {
            name,
            id,
            inner,
            to_loose,
        } = self;
        match inner.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(inner) => Err(Self {
                name,
                id,
                inner,
                to_loose,
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn to_loose(&self) -> Value {
        (self.to_loose)(self.inner.as_ref())
    }
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordValue")
            .field("type", &self.name)
            .finish()
    }
}

fn loose_projection<T: RecordType>(any: &(dyn Any + Send)) -> Value {
    any.downcast_ref::<T>()
        .and_then(|record| serde_json::to_value(record).ok())
        .unwrap_or(Value::Null)
}

/// Recover a concrete record from a coerced argument. Panics on a kind or
/// type-identity mismatch, which indicates a signature contract violation.
#[doc(hidden)]
pub fn record_from_typed<T: RecordType>(v: TypedValue) -> T {
    match v {
        TypedValue::Record(rec) => rec.downcast::<T>().unwrap_or_else(|rec| {
            panic!(
                "callable received record `{}` where `{}` was expected",
                rec.type_name(),
                type_name::<T>()
            )
        }),
        other => panic!(
            "callable received {} where record `{}` was expected",
            other.kind(),
            type_name::<T>()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Marker {
        id: i64,
    }

    crate::record!(Marker);

    #[test]
    fn test_loose_lift_preserves_shape() {
        let lifted = TypedValue::from_loose(&json!([1, "a", null]));
        let TypedValue::Seq(seq) = lifted else {
            panic!("expected a sequence");
        };
        assert_eq!(seq.elem, TypeDesc::Any);
        assert_eq!(seq.items[0], TypedValue::Int(1));
        assert_eq!(seq.items[1], TypedValue::Str("a".to_string()));
        assert_eq!(seq.items[2], TypedValue::Nil);
    }

    #[test]
    fn test_float_lowering_round_trips() {
        let v = TypedValue::from_loose(&json!(2.5));
        assert_eq!(v, TypedValue::Float(2.5));
        assert_eq!(v.to_loose(), json!(2.5));
    }

    #[test]
    fn test_record_downcast_recovers_instance() {
        let rec = RecordValue::new(Marker { id: 7 });
        assert_eq!(rec.to_loose(), json!({"id": 7}));
        assert_eq!(rec.downcast::<Marker>().unwrap(), Marker { id: 7 });
    }

    #[test]
    fn test_record_downcast_mismatch_returns_value() {
        let rec = RecordValue::new(Marker { id: 7 });
        let rec = rec.downcast::<String>().unwrap_err();
        assert_eq!(rec.downcast::<Marker>().unwrap(), Marker { id: 7 });
    }
}

//! Type Conversion Helper
//!
//! Reconciles a value's concrete type with a declared target type: nil to
//! zero value, element-wise sequence conversion, and direct numeric
//! conversion. A pairing with no valid conversion is a contract violation
//! between caller and callable, not a runtime condition, and panics.

use crate::signature::TypeDesc;
use crate::value::{SeqValue, TypedValue};

/// Convert `v` into a value whose concrete type matches `target`.
///
/// Elements are never lost or reordered; only each element's concrete
/// representation changes. Panics when no valid conversion exists.
pub fn convert(v: TypedValue, target: &TypeDesc) -> TypedValue {
    if matches!(v, TypedValue::Nil) {
        return zero_value(target);
    }
    if matches!(target, TypeDesc::Any) {
        return v;
    }
    match (v, target) {
        (TypedValue::Seq(seq), TypeDesc::Array(elem, len)) => {
            if seq.items.len() != *len {
                panic!(
                    "cannot convert {}-element sequence to {}",
                    seq.items.len(),
                    target
                );
            }
            let items = if seq.elem == **elem {
                seq.items
            } else {
                seq.items
                    .into_iter()
                    .map(|item| convert(item, elem))
                    .collect()
            };
            TypedValue::Seq(SeqValue {
                elem: (**elem).clone(),
                fixed: Some(*len),
                items,
            })
        }
        (TypedValue::Seq(seq), TypeDesc::List(elem)) => {
            if seq.elem == **elem {
                TypedValue::Seq(seq)
            } else {
                let items = seq
                    .items
                    .into_iter()
                    .map(|item| convert(item, elem))
                    .collect();
                TypedValue::Seq(SeqValue {
                    elem: (**elem).clone(),
                    fixed: None,
                    items,
                })
            }
        }
        (TypedValue::Seq(_), target) => {
            panic!("cannot convert sequence to {}", target)
        }
        (v, target) => direct(v, target),
    }
}

/// Direct representation conversion between non-sequence kinds, mirroring
/// structural conversion rules: numeric kinds interconvert (widening and
/// truncating), records must match by type identity, everything else must
/// already match.
fn direct(v: TypedValue, target: &TypeDesc) -> TypedValue {
    match (v, target) {
        (TypedValue::Bool(b), TypeDesc::Bool) => TypedValue::Bool(b),
        (TypedValue::Int(n), TypeDesc::Int) => TypedValue::Int(n),
        (TypedValue::Int(n), TypeDesc::Uint) => TypedValue::Uint(n as u64),
        (TypedValue::Int(n), TypeDesc::Float) => TypedValue::Float(n as f64),
        (TypedValue::Uint(n), TypeDesc::Int) => TypedValue::Int(n as i64),
        (TypedValue::Uint(n), TypeDesc::Uint) => TypedValue::Uint(n),
        (TypedValue::Uint(n), TypeDesc::Float) => TypedValue::Float(n as f64),
        (TypedValue::Float(n), TypeDesc::Int) => TypedValue::Int(n as i64),
        (TypedValue::Float(n), TypeDesc::Uint) => TypedValue::Uint(n as u64),
        (TypedValue::Float(n), TypeDesc::Float) => TypedValue::Float(n),
        (TypedValue::Str(s), TypeDesc::Str) => TypedValue::Str(s),
        (TypedValue::Map(m), TypeDesc::Map) => TypedValue::Map(m),
        (TypedValue::Record(rec), TypeDesc::Record(desc)) if rec.type_id() == desc.type_id() => {
            TypedValue::Record(rec)
        }
        (v, target) => panic!("cannot convert {} to {}", v.kind(), target),
    }
}

/// Zero value of the target type, used when the input is nil.
fn zero_value(target: &TypeDesc) -> TypedValue {
    match target {
        TypeDesc::Any => TypedValue::Nil,
        TypeDesc::Bool => TypedValue::Bool(false),
        TypeDesc::Int => TypedValue::Int(0),
        TypeDesc::Uint => TypedValue::Uint(0),
        TypeDesc::Float => TypedValue::Float(0.0),
        TypeDesc::Str => TypedValue::Str(String::new()),
        TypeDesc::List(elem) => TypedValue::Seq(SeqValue {
            elem: (**elem).clone(),
            fixed: None,
            items: Vec::new(),
        }),
        TypeDesc::Array(elem, len) => TypedValue::Seq(SeqValue {
            elem: (**elem).clone(),
            fixed: Some(*len),
            items: (0..*len).map(|_| zero_value(elem)).collect(),
        }),
        TypeDesc::Map => TypedValue::Map(serde_json::Map::new()),
        TypeDesc::Record(desc) => desc
            .decode(serde_json::Value::Object(serde_json::Map::new()))
            .map(TypedValue::Record)
            .unwrap_or_else(|_| panic!("record `{}` has no zero value", desc.name())),
        TypeDesc::Failure => panic!("a failure slot has no zero value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loose_seq(items: Vec<TypedValue>) -> TypedValue {
        TypedValue::Seq(SeqValue {
            elem: TypeDesc::Any,
            fixed: None,
            items,
        })
    }

    #[test]
    fn test_typed_passthrough_is_noop() {
        assert_eq!(convert(TypedValue::Int(7), &TypeDesc::Int), TypedValue::Int(7));
        assert_eq!(
            convert(TypedValue::Str("x".into()), &TypeDesc::Str),
            TypedValue::Str("x".into())
        );
    }

    #[test]
    fn test_nil_becomes_zero_value() {
        assert_eq!(convert(TypedValue::Nil, &TypeDesc::Int), TypedValue::Int(0));
        assert_eq!(
            convert(TypedValue::Nil, &TypeDesc::Str),
            TypedValue::Str(String::new())
        );
        let zero = convert(TypedValue::Nil, &TypeDesc::Array(Box::new(TypeDesc::Int), 2));
        assert_eq!(
            zero,
            TypedValue::Seq(SeqValue {
                elem: TypeDesc::Int,
                fixed: Some(2),
                items: vec![TypedValue::Int(0), TypedValue::Int(0)],
            })
        );
    }

    #[test]
    fn test_numeric_cross_conversion() {
        assert_eq!(
            convert(TypedValue::Int(3), &TypeDesc::Float),
            TypedValue::Float(3.0)
        );
        assert_eq!(
            convert(TypedValue::Float(3.9), &TypeDesc::Int),
            TypedValue::Int(3)
        );
        assert_eq!(
            convert(TypedValue::Uint(9), &TypeDesc::Int),
            TypedValue::Int(9)
        );
    }

    #[test]
    fn test_sequence_elements_convert_into_array() {
        let v = loose_seq(vec![
            TypedValue::Int(1),
            TypedValue::Int(2),
            TypedValue::Int(3),
        ]);
        let out = convert(v, &TypeDesc::Array(Box::new(TypeDesc::Float), 3));
        let TypedValue::Seq(seq) = out else {
            panic!("expected a sequence");
        };
        assert_eq!(seq.fixed, Some(3));
        assert_eq!(seq.items[2], TypedValue::Float(3.0));
    }

    #[test]
    fn test_sequence_elements_convert_into_list() {
        let v = loose_seq(vec![TypedValue::Int(1), TypedValue::Int(2)]);
        let out = convert(v, &TypeDesc::List(Box::new(TypeDesc::Uint)));
        let TypedValue::Seq(seq) = out else {
            panic!("expected a sequence");
        };
        assert_eq!(seq.fixed, None);
        assert_eq!(seq.items, vec![TypedValue::Uint(1), TypedValue::Uint(2)]);
    }

    #[test]
    #[should_panic(expected = "cannot convert 3-element sequence")]
    fn test_array_length_mismatch_is_fatal() {
        let v = loose_seq(vec![
            TypedValue::Int(1),
            TypedValue::Int(2),
            TypedValue::Int(3),
        ]);
        convert(v, &TypeDesc::Array(Box::new(TypeDesc::Int), 4));
    }

    #[test]
    #[should_panic(expected = "cannot convert sequence")]
    fn test_sequence_to_scalar_is_fatal() {
        let v = loose_seq(vec![TypedValue::Int(1)]);
        convert(v, &TypeDesc::Int);
    }

    #[test]
    #[should_panic(expected = "cannot convert string")]
    fn test_incompatible_scalars_are_fatal() {
        convert(TypedValue::Str("x".into()), &TypeDesc::Bool);
    }
}

//! Argument Coercer
//!
//! Converts an ordered list of loose values into typed arguments matching a
//! callable's declared parameter types. Coercion is driven by each declared
//! type's structural kind; records and sequences of records go through the
//! structural decoder, everything else is lifted directly and reconciled by
//! the conversion pass.

use serde_json::Value;
use tracing::debug;

use crate::convert::convert;
use crate::error::{CallError, CallResult};
use crate::signature::{Signature, TypeDesc};
use crate::value::{SeqValue, TypedValue};

/// Coerce `args` to match `signature`'s parameter types, in order.
///
/// The argument count must equal the declared parameter count exactly; no
/// defaults, no optional arguments. Coercion aborts at the first failing
/// argument and never mutates its inputs.
pub fn coerce_args(signature: &Signature, args: &[Value]) -> CallResult<Vec<TypedValue>> {
    let params = signature.params();
    if args.len() != params.len() {
        return Err(CallError::ArityMismatch {
            expected: params.len(),
            actual: args.len(),
        });
    }

    let mut coerced = Vec::with_capacity(args.len());
    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        let typed = match param {
            TypeDesc::Record(desc) => {
                debug!("decoding argument {} into record `{}`", index, desc.name());
                let record = desc.decode(arg.clone()).map_err(|e| CallError::Decode {
                    index,
                    message: e.to_string(),
                })?;
                convert(TypedValue::Record(record), param)
            }
            TypeDesc::List(elem) | TypeDesc::Array(elem, _)
                if matches!(**elem, TypeDesc::Record(_)) =>
            {
                let TypeDesc::Record(desc) = &**elem else {
                    unreachable!()
                };
                let Some(items) = arg.as_array() else {
                    return Err(CallError::Decode {
                        index,
                        message: "expected a sequence of mappings".to_string(),
                    });
                };
                let mut decoded = Vec::with_capacity(items.len());
                for item in items {
                    let record = desc.decode(item.clone()).map_err(|e| CallError::Decode {
                        index,
                        message: e.to_string(),
                    })?;
                    decoded.push(TypedValue::Record(record));
                }
                convert(
                    TypedValue::Seq(SeqValue {
                        elem: (**elem).clone(),
                        fixed: None,
                        items: decoded,
                    }),
                    param,
                )
            }
            TypeDesc::List(_) | TypeDesc::Array(..) => convert(TypedValue::from_loose(arg), param),
            _ => {
                let mut value = TypedValue::from_loose(arg);
                // Generic numeric decoding yields 64-bit floats; truncate when
                // a signed integer is declared. Exactly this pair, nothing more.
                if matches!(param, TypeDesc::Int) {
                    if let TypedValue::Float(f) = value {
                        value = TypedValue::Int(f as i64);
                    }
                }
                convert(value, param)
            }
        };
        coerced.push(typed);
    }
    Ok(coerced)
}

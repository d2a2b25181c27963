//! Result Normalizer
//!
//! Splits a callable's raw return values into a loose payload sequence and
//! an optional failure, per the trailing-error convention: at most one
//! failure-capable slot, always last. A non-empty trailing failure discards
//! every other return value; an empty one is dropped from the output.

use serde_json::Value;

use crate::error::{CallError, CallResult};
use crate::value::TypedValue;

/// Marker for error types that can signal failure through a trailing return
/// slot. Concrete failure types opt in explicitly; the trampoline's
/// `Result<_, E: Failable>` bound is the capability query.
pub trait Failable: std::error::Error + Send + Sync + 'static {}

/// A failure raised by a callable, type-erased for transport.
pub type BoxedFailure = Box<dyn std::error::Error + Send + Sync>;

/// A single raw return slot, in the callable's own representation.
#[derive(Debug)]
pub enum RawReturn {
    /// An ordinary payload value.
    Value(TypedValue),
    /// A failure-capable slot; `None` when the call succeeded.
    Failure(Option<BoxedFailure>),
}

/// Normalize raw return values into a loose payload sequence.
///
/// An empty input yields an empty payload. If the last slot is
/// failure-capable and non-empty, normalization stops immediately and the
/// failure is returned alone; if it is empty, the slot is dropped. Remaining
/// values are lowered to the loose representation in original order.
///
/// Only the last slot is inspected for failure capability; a failure slot
/// anywhere else is treated as ordinary payload data.
pub fn parse_returns(mut raw: Vec<RawReturn>) -> CallResult<Vec<Value>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if matches!(raw.last(), Some(RawReturn::Failure(_))) {
        let Some(RawReturn::Failure(slot)) = raw.pop() else {
            unreachable!()
        };
        if let Some(failure) = slot {
            return Err(CallError::Failed(failure));
        }
    }
    Ok(raw
        .into_iter()
        .map(|slot| match slot {
            RawReturn::Value(v) => v.to_loose(),
            RawReturn::Failure(Some(failure)) => Value::String(failure.to_string()),
            RawReturn::Failure(None) => Value::Null,
        })
        .collect())
}

//! Top-Level Call Pipeline
//!
//! The dynamic entry point bridging a loose argument list to a
//! statically-typed callable.

use serde_json::Value;
use tracing::debug;

use crate::coerce::coerce_args;
use crate::error::CallResult;
use crate::handler::{Callable, HandlerFn};
use crate::returns::parse_returns;

/// Invoke `callable` with a loose argument list.
///
/// Arguments are coerced against the callable's signature, the call is
/// performed with the typed arguments, and the raw return values are
/// normalized into a loose payload sequence or the callable's own failure.
/// Accepts any [`Callable`], sized or not, so both concrete handlers and
/// `&dyn Callable` references resolve uniformly.
pub fn call<C>(callable: &C, args: &[Value]) -> CallResult<Vec<Value>>
where
    C: Callable + ?Sized,
{
    debug!("invoking callable with {} arguments", args.len());
    let typed = coerce_args(callable.signature(), args)?;
    let raw = callable.invoke(typed);
    parse_returns(raw)
}

/// Wrap a plain function or closure and invoke it in one step.
pub fn call_fn<F, Args>(f: F, args: &[Value]) -> CallResult<Vec<Value>>
where
    F: HandlerFn<Args>,
{
    call(&f.into_handler(), args)
}

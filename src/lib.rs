//! Dynamic Function Invocation
//!
//! Bridges an untyped call site to statically-typed Rust callables:
//! - Structural coercion of loose (`serde_json::Value`) argument lists
//! - Macro-generated trampolines deriving signatures from function types
//! - Trailing-error return normalization into a uniform payload/failure pair
//!
//! The pipeline is purely synchronous and stateless; each invocation is
//! independent and safe to run concurrently provided the wrapped callable is.

pub mod call;
pub mod coerce;
pub mod convert;
pub mod error;
pub mod handler;
pub mod returns;
pub mod signature;
pub mod value;

// Re-exports for convenience
pub use call::{call, call_fn};
pub use coerce::coerce_args;
pub use convert::convert;
pub use error::{CallError, CallResult};
pub use handler::{ArgValue, Callable, Handler, HandlerFn, IntoReturns, RetValue};
pub use returns::{parse_returns, BoxedFailure, Failable, RawReturn};
pub use signature::{RecordDesc, Signature, TypeDesc};
pub use value::{RecordType, RecordValue, SeqValue, TypedValue};

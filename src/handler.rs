//! Callable Trampoline
//!
//! Lifts statically-typed Rust functions into dynamically invocable
//! [`Callable`]s. The trampoline derives the [`Signature`] from the function
//! type and maps coerced arguments in and raw return slots out; no runtime
//! type inspection is involved beyond the downcast at the record boundary.

use serde_json::{Map, Value};

use crate::returns::{Failable, RawReturn};
use crate::signature::{Signature, TypeDesc};
use crate::value::{SeqValue, TypedValue};

/// A dynamically invocable callable: its declared signature plus the invoke
/// operation. Implementations call the wrapped function with exactly the
/// typed arguments, in order, with no additional marshalling; panics raised
/// by the callable propagate unmodified.
pub trait Callable: Send + Sync {
    fn signature(&self) -> &Signature;
    fn invoke(&self, args: Vec<TypedValue>) -> Vec<RawReturn>;
}

/// The uniform handle wrapping a statically-typed function for dynamic
/// invocation. Built from any eligible `Fn` via [`Handler::new`].
pub struct Handler {
    signature: Signature,
    invoke: Box<dyn Fn(Vec<TypedValue>) -> Vec<RawReturn> + Send + Sync>,
}

impl Handler {
    pub fn new<F, Args>(f: F) -> Handler
    where
        F: HandlerFn<Args>,
    {
        f.into_handler()
    }
}

impl Callable for Handler {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn invoke(&self, args: Vec<TypedValue>) -> Vec<RawReturn> {
        (self.invoke)(args)
    }
}

/// Conversion from a plain function or closure into a [`Handler`]. `Args` is
/// a marker tuple distinguishing the `Fn` arities.
pub trait HandlerFn<Args>: Send + Sync + 'static {
    fn into_handler(self) -> Handler;
}

/// Parameter capability: a type that can describe itself and be recovered
/// from a coerced argument. Recovery panics on mismatch, which indicates a
/// contract violation between signature and arguments.
pub trait ArgValue: Sized + Send + 'static {
    fn type_desc() -> TypeDesc;
    fn from_typed(v: TypedValue) -> Self;
}

/// Single-slot return capability: a payload value that can describe itself
/// and lower into the typed representation.
pub trait RetValue: Send + 'static {
    fn ret_desc() -> TypeDesc;
    fn into_typed(self) -> TypedValue;
}

/// Whole-return-shape mapping: how a function's return type spreads into
/// ordered raw return slots. `Result<P, E: Failable>` appends a
/// failure-capable slot after `P`'s slots.
pub trait IntoReturns: 'static {
    fn return_descs() -> Vec<TypeDesc>;
    fn into_returns(self) -> Vec<RawReturn>;
}

fn arg_mismatch(expected: &str, got: &TypedValue) -> ! {
    panic!(
        "callable received {} where {} was expected",
        got.kind(),
        expected
    )
}

macro_rules! signed_arg {
    ($($ty:ty),*) => {$(
        impl ArgValue for $ty {
            fn type_desc() -> TypeDesc {
                TypeDesc::Int
            }
            fn from_typed(v: TypedValue) -> Self {
                match v {
                    TypedValue::Int(n) => n as $ty,
                    other => arg_mismatch("int", &other),
                }
            }
        }
        impl RetValue for $ty {
            fn ret_desc() -> TypeDesc {
                TypeDesc::Int
            }
            fn into_typed(self) -> TypedValue {
                TypedValue::Int(self as i64)
            }
        }
    )*};
}

macro_rules! unsigned_arg {
    ($($ty:ty),*) => {$(
        impl ArgValue for $ty {
            fn type_desc() -> TypeDesc {
                TypeDesc::Uint
            }
            fn from_typed(v: TypedValue) -> Self {
                match v {
                    TypedValue::Uint(n) => n as $ty,
                    other => arg_mismatch("uint", &other),
                }
            }
        }
        impl RetValue for $ty {
            fn ret_desc() -> TypeDesc {
                TypeDesc::Uint
            }
            fn into_typed(self) -> TypedValue {
                TypedValue::Uint(self as u64)
            }
        }
    )*};
}

macro_rules! float_arg {
    ($($ty:ty),*) => {$(
        impl ArgValue for $ty {
            fn type_desc() -> TypeDesc {
                TypeDesc::Float
            }
            fn from_typed(v: TypedValue) -> Self {
                match v {
                    TypedValue::Float(n) => n as $ty,
                    other => arg_mismatch("float", &other),
                }
            }
        }
        impl RetValue for $ty {
            fn ret_desc() -> TypeDesc {
                TypeDesc::Float
            }
            fn into_typed(self) -> TypedValue {
                TypedValue::Float(self as f64)
            }
        }
    )*};
}

signed_arg!(i8, i16, i32, i64, isize);
unsigned_arg!(u8, u16, u32, u64, usize);
float_arg!(f32, f64);

impl ArgValue for bool {
    fn type_desc() -> TypeDesc {
        TypeDesc::Bool
    }
    fn from_typed(v: TypedValue) -> Self {
        match v {
            TypedValue::Bool(b) => b,
            other => arg_mismatch("bool", &other),
        }
    }
}

impl RetValue for bool {
    fn ret_desc() -> TypeDesc {
        TypeDesc::Bool
    }
    fn into_typed(self) -> TypedValue {
        TypedValue::Bool(self)
    }
}

impl ArgValue for String {
    fn type_desc() -> TypeDesc {
        TypeDesc::Str
    }
    fn from_typed(v: TypedValue) -> Self {
        match v {
            TypedValue::Str(s) => s,
            other => arg_mismatch("string", &other),
        }
    }
}

impl RetValue for String {
    fn ret_desc() -> TypeDesc {
        TypeDesc::Str
    }
    fn into_typed(self) -> TypedValue {
        TypedValue::Str(self)
    }
}

impl ArgValue for Value {
    fn type_desc() -> TypeDesc {
        TypeDesc::Any
    }
    fn from_typed(v: TypedValue) -> Self {
        v.to_loose()
    }
}

impl RetValue for Value {
    fn ret_desc() -> TypeDesc {
        TypeDesc::Any
    }
    fn into_typed(self) -> TypedValue {
        TypedValue::from_loose(&self)
    }
}

impl ArgValue for Map<String, Value> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Map
    }
    fn from_typed(v: TypedValue) -> Self {
        match v {
            TypedValue::Map(m) => m,
            other => arg_mismatch("map", &other),
        }
    }
}

impl RetValue for Map<String, Value> {
    fn ret_desc() -> TypeDesc {
        TypeDesc::Map
    }
    fn into_typed(self) -> TypedValue {
        TypedValue::Map(self)
    }
}

impl<T: ArgValue> ArgValue for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::List(Box::new(T::type_desc()))
    }
    fn from_typed(v: TypedValue) -> Self {
        match v {
            TypedValue::Seq(seq) => seq.items.into_iter().map(T::from_typed).collect(),
            other => arg_mismatch("list", &other),
        }
    }
}

impl<T: RetValue> RetValue for Vec<T> {
    fn ret_desc() -> TypeDesc {
        TypeDesc::List(Box::new(T::ret_desc()))
    }
    fn into_typed(self) -> TypedValue {
        TypedValue::Seq(SeqValue {
            elem: T::ret_desc(),
            fixed: None,
            items: self.into_iter().map(RetValue::into_typed).collect(),
        })
    }
}

impl<T: ArgValue, const N: usize> ArgValue for [T; N] {
    fn type_desc() -> TypeDesc {
        TypeDesc::Array(Box::new(T::type_desc()), N)
    }
    fn from_typed(v: TypedValue) -> Self {
        match v {
            TypedValue::Seq(seq) => {
                let items: Vec<T> = seq.items.into_iter().map(T::from_typed).collect();
                match items.try_into() {
                    Ok(array) => array,
                    Err(items) => panic!(
                        "callable received {}-element sequence where {} elements were expected",
                        items.len(),
                        N
                    ),
                }
            }
            other => arg_mismatch("array", &other),
        }
    }
}

impl<T: RetValue, const N: usize> RetValue for [T; N] {
    fn ret_desc() -> TypeDesc {
        TypeDesc::Array(Box::new(T::ret_desc()), N)
    }
    fn into_typed(self) -> TypedValue {
        TypedValue::Seq(SeqValue {
            elem: T::ret_desc(),
            fixed: Some(N),
            items: self.into_iter().map(RetValue::into_typed).collect(),
        })
    }
}

impl IntoReturns for () {
    fn return_descs() -> Vec<TypeDesc> {
        Vec::new()
    }
    fn into_returns(self) -> Vec<RawReturn> {
        Vec::new()
    }
}

macro_rules! single_return {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoReturns for $ty {
            fn return_descs() -> Vec<TypeDesc> {
                vec![<$ty as RetValue>::ret_desc()]
            }
            fn into_returns(self) -> Vec<RawReturn> {
                vec![RawReturn::Value(self.into_typed())]
            }
        }
    )*};
}

single_return!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, Value,
    Map<String, Value>,
);

impl<T: RetValue> IntoReturns for Vec<T> {
    fn return_descs() -> Vec<TypeDesc> {
        vec![<Vec<T> as RetValue>::ret_desc()]
    }
    fn into_returns(self) -> Vec<RawReturn> {
        vec![RawReturn::Value(self.into_typed())]
    }
}

impl<T: RetValue, const N: usize> IntoReturns for [T; N] {
    fn return_descs() -> Vec<TypeDesc> {
        vec![<[T; N] as RetValue>::ret_desc()]
    }
    fn into_returns(self) -> Vec<RawReturn> {
        vec![RawReturn::Value(self.into_typed())]
    }
}

impl<A: RetValue, B: RetValue> IntoReturns for (A, B) {
    fn return_descs() -> Vec<TypeDesc> {
        vec![A::ret_desc(), B::ret_desc()]
    }
    fn into_returns(self) -> Vec<RawReturn> {
        vec![
            RawReturn::Value(self.0.into_typed()),
            RawReturn::Value(self.1.into_typed()),
        ]
    }
}

impl<A: RetValue, B: RetValue, C: RetValue> IntoReturns for (A, B, C) {
    fn return_descs() -> Vec<TypeDesc> {
        vec![A::ret_desc(), B::ret_desc(), C::ret_desc()]
    }
    fn into_returns(self) -> Vec<RawReturn> {
        vec![
            RawReturn::Value(self.0.into_typed()),
            RawReturn::Value(self.1.into_typed()),
            RawReturn::Value(self.2.into_typed()),
        ]
    }
}

impl<P, E> IntoReturns for Result<P, E>
where
    P: IntoReturns,
    E: Failable,
{
    fn return_descs() -> Vec<TypeDesc> {
        let mut descs = P::return_descs();
        descs.push(TypeDesc::Failure);
        descs
    }
    fn into_returns(self) -> Vec<RawReturn> {
        match self {
            Ok(payload) => {
                let mut slots = payload.into_returns();
                slots.push(RawReturn::Failure(None));
                slots
            }
            // A signaled failure invalidates the other outputs; they are
            // never materialized.
            Err(e) => vec![RawReturn::Failure(Some(Box::new(e)))],
        }
    }
}

impl<Func, Ret> HandlerFn<()> for Func
where
    Func: Fn() -> Ret + Send + Sync + 'static,
    Ret: IntoReturns,
{
    fn into_handler(self) -> Handler {
        Handler {
            signature: Signature::new(Vec::new(), Ret::return_descs()),
            invoke: Box::new(move |_args| (self)().into_returns()),
        }
    }
}

macro_rules! impl_handler_fn {
    ($($ty:ident),+) => {
        impl<Func, Ret, $($ty,)+> HandlerFn<($($ty,)+)> for Func
        where
            Func: Fn($($ty),+) -> Ret + Send + Sync + 'static,
            Ret: IntoReturns,
            $($ty: ArgValue,)+
        {
            fn into_handler(self) -> Handler {
                Handler {
                    signature: Signature::new(
                        vec![$($ty::type_desc()),+],
                        Ret::return_descs(),
                    ),
                    invoke: Box::new(move |args| {
                        let mut args = args.into_iter();
                        (self)($($ty::from_typed(
                            args.next().expect("argument count verified during coercion"),
                        )),+)
                        .into_returns()
                    }),
                }
            }
        }
    };
}

impl_handler_fn!(A1);
impl_handler_fn!(A1, A2);
impl_handler_fn!(A1, A2, A3);
impl_handler_fn!(A1, A2, A3, A4);
impl_handler_fn!(A1, A2, A3, A4, A5);
impl_handler_fn!(A1, A2, A3, A4, A5, A6);

/// Register serde-derive struct types as record types, making them usable as
/// parameters and return values. Symmetric with implementing [`Failable`] on
/// an error type.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// anyfn::record!(Point);
/// ```
#[macro_export]
macro_rules! record {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::RecordType for $ty {}

        impl $crate::ArgValue for $ty {
            fn type_desc() -> $crate::TypeDesc {
                $crate::TypeDesc::Record($crate::RecordDesc::of::<$ty>())
            }
            fn from_typed(v: $crate::TypedValue) -> Self {
                $crate::value::record_from_typed::<$ty>(v)
            }
        }

        impl $crate::RetValue for $ty {
            fn ret_desc() -> $crate::TypeDesc {
                $crate::TypeDesc::Record($crate::RecordDesc::of::<$ty>())
            }
            fn into_typed(self) -> $crate::TypedValue {
                $crate::TypedValue::Record($crate::RecordValue::new(self))
            }
        }

        impl $crate::IntoReturns for $ty {
            fn return_descs() -> ::std::vec::Vec<$crate::TypeDesc> {
                vec![<$ty as $crate::RetValue>::ret_desc()]
            }
            fn into_returns(self) -> ::std::vec::Vec<$crate::RawReturn> {
                vec![$crate::RawReturn::Value($crate::RetValue::into_typed(self))]
            }
        }
    )+};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Job {
        name: String,
        retries: i64,
    }

    crate::record!(Job);

    #[derive(Debug, Error)]
    #[error("job failed")]
    struct JobError;

    impl Failable for JobError {}

    #[test]
    fn test_signature_derived_from_function_type() {
        fn run(_job: Job, _attempts: i64) -> Result<String, JobError> {
            Ok(String::new())
        }
        let handler = Handler::new(run);
        let sig = handler.signature();
        assert!(matches!(sig.params()[0], TypeDesc::Record(_)));
        assert_eq!(sig.params()[1], TypeDesc::Int);
        assert_eq!(sig.returns(), &[TypeDesc::Str, TypeDesc::Failure]);
    }

    #[test]
    fn test_zero_arity_callable() {
        let handler = Handler::new(|| 42_i64);
        assert!(handler.signature().params().is_empty());
        let raw = handler.invoke(Vec::new());
        assert_eq!(raw.len(), 1);
        assert!(matches!(raw[0], RawReturn::Value(TypedValue::Int(42))));
    }

    #[test]
    fn test_trampoline_recovers_typed_arguments() {
        let handler = Handler::new(|job: Job, attempts: i64| {
            assert_eq!(attempts, 3);
            job.name
        });
        let args = vec![
            Job {
                name: "reindex".to_string(),
                retries: 0,
            }
            .into_typed(),
            TypedValue::Int(3),
        ];
        let raw = handler.invoke(args);
        assert!(matches!(
            &raw[0],
            RawReturn::Value(TypedValue::Str(s)) if s == "reindex"
        ));
    }

    #[test]
    fn test_tuple_returns_spread_into_slots() {
        let handler = Handler::new(|| ("ok".to_string(), 2_u64));
        let raw = handler.invoke(Vec::new());
        assert_eq!(raw.len(), 2);
        assert!(matches!(&raw[1], RawReturn::Value(TypedValue::Uint(2))));
    }

    #[test]
    fn test_failable_error_occupies_trailing_slot() {
        let handler = Handler::new(|| -> Result<i64, JobError> { Err(JobError) });
        let raw = handler.invoke(Vec::new());
        assert_eq!(raw.len(), 1);
        assert!(matches!(&raw[0], RawReturn::Failure(Some(_))));
    }

    #[test]
    fn test_unit_result_declares_only_failure_slot() {
        let handler = Handler::new(|| -> Result<(), JobError> { Ok(()) });
        assert_eq!(handler.signature().returns(), &[TypeDesc::Failure]);
        let raw = handler.invoke(Vec::new());
        assert_eq!(raw.len(), 1);
        assert!(matches!(&raw[0], RawReturn::Failure(None)));
    }
}

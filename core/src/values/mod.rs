//! Runtime values of the expression language and their conversions.

mod function;
pub mod json;
pub mod number;
mod value;

pub use function::{Closure, Function, NativeFn, NativeFunction};
pub use json::{from_json, to_json, to_template_json};
pub use number::format_number;
pub use value::{
    ArrayRef, Elements, MAX_NESTING_DEPTH, MAX_STRING_LENGTH, ObjectRef, Properties, StringBuilder,
    Value, iso_string,
};

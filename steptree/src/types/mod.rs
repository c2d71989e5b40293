mod value;
mod variant;

pub use value::{Value, ValueDomain};
pub use variant::Variant;

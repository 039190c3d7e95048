mod builtins;
mod interp;
mod scope;
mod value;

pub use interp::*;
pub use scope::*;
pub use value::*;

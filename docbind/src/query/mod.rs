mod binder;
mod parameter;
mod parser;
mod query;

pub use binder::*;
pub use parameter::*;
pub use parser::*;
pub use query::*;

#![forbid(unsafe_code)]

mod glob;
pub mod numeric;
mod store;
mod value;
mod zset;

pub use glob::GlobPattern;
pub use store::Store;
pub use value::{Scalar, Value};
pub use zset::{ScoreBound, ScoreSet};

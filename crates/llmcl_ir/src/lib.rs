#![doc = include_str!("../README.md")]

pub mod ids;
pub mod ir;
pub mod lower;
pub mod normalize;
pub mod printer;
pub mod resolve;

pub use ids::{IdGenerator, IdStrategy};
pub use ir::IrNode;
pub use lower::lower;
pub use normalize::{normalize, Normalizer};
pub use printer::{generate, Printer};
pub use resolve::{ContextBuffer, ResolveError, Resolved};

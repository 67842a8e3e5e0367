pub mod mutate;

pub use mutate::{ActionEditor, MutateError, Mutator, Placement, TransformSet};

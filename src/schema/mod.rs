pub mod catalog;

pub use catalog::{FieldSpec, FieldsCatalog};

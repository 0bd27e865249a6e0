pub mod catalog;
pub mod product;

pub use catalog::*;
pub use product::*;

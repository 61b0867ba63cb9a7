pub mod cell;
pub mod resolve;
pub mod store;

pub use cell::{Cell, DisplayMode};
pub use resolve::Resolver;
pub use store::{Dataset, Row, Table};

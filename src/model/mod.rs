pub mod cart;
pub mod catalog;
pub mod common;
pub mod history;
pub mod identity;
pub mod order;
pub mod selection;

pub use cart::*;
pub use catalog::*;
pub use common::*;
pub use history::*;
pub use identity::*;
pub use order::*;
pub use selection::*;

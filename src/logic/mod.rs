pub mod cart;
pub mod checkout;
pub mod pricing;
pub mod specials;

pub use cart::CartOperations;
pub use checkout::OrderOperations;
pub use specials::{SpecialOperations, SpecialPricing};

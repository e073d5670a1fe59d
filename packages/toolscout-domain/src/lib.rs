pub mod completion;
pub mod filter;
pub mod reduction;

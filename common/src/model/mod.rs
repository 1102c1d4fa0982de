pub mod failure;
pub mod receipt;

pub mod envelope;
pub mod model;
pub mod requests;

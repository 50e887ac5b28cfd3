pub mod errors;
pub mod random;
pub mod shutdown;
pub mod time;

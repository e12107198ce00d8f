pub mod driver;
pub mod input;
pub mod outcome;
pub mod session;

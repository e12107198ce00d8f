pub mod net;
pub mod protocol;

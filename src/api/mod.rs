pub mod modbus;
pub mod utils;

pub use modbus::*;

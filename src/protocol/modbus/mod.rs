mod frame;
mod pull_get_holdings;
mod pull_set_holdings;

pub use frame::read_modbus_frame;
pub use pull_get_holdings::{generate_pull_get_holdings_request, parse_pull_get_holdings};
pub use pull_set_holdings::{generate_pull_set_holding_request, parse_pull_set_holding};

pub mod cfbd;

pub use cfbd::{CfbdClient, CfbdConfig};

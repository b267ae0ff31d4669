pub mod mock_transport;

pub use mock_transport::*;
pub use rtc_helpers::*;

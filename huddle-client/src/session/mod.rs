mod session;

pub use session::RtcSession;

pub mod info;
pub mod session;

pub use info::{ConnectionInfo, DEFAULT_HOST, DEFAULT_PORT};
pub use session::{Session, SessionStats};

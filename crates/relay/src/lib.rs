pub mod registry;
pub mod session;

pub use registry::{ConnectionId, ConnectionRegistry};
pub use session::TaskSession;

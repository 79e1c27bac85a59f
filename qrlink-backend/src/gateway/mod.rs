pub mod actix_ws;
pub mod events;
pub mod protocol;

pub use events::{ConnectionRegistry, DeliveryError};
pub use protocol::{EventStatus, SessionEvent};

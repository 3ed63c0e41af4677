mod store;

pub use store::{SessionHandle, SessionStore};

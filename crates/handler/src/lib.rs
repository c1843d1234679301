pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod invocation;
pub mod openapi;
pub mod server;

pub use config::{Config, FALLBACK_EXTERNAL_USER_ID};
pub use dispatch::{Dispatcher, InvocationHandler};
pub use error::HandlerError;
pub use invocation::{Invocation, InvocationResponse};

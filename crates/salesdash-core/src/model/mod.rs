pub mod launch;
pub mod port;
pub mod retry;
pub mod service;

pub use launch::*;
pub use port::*;
pub use retry::*;
pub use service::*;

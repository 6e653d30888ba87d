pub mod converter;
pub mod error;
pub mod port;
pub mod process;
pub mod runtime;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod waiter;

pub use converter::*;
pub use error::*;
pub use port::*;
pub use process::*;
pub use runtime::*;
pub use waiter::*;

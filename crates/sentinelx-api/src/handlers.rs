//! Request handlers.

pub mod alerts;
pub mod health;
pub mod snapshot;
pub mod status;
pub mod stream;

pub use alerts::*;
pub use health::*;
pub use snapshot::*;
pub use status::*;
pub use stream::*;

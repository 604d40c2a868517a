pub mod request;
pub mod result;

pub use request::{Request, RequestMode};
pub use result::{HotDogResult, ResultPayload, StandardResult, UNKNOWN_NAME};

//! Core SMTP types.

mod extension;
mod reply;
mod response;

pub use extension::{Capabilities, Extension};
pub use reply::ReplyCode;
pub use response::{ResponseBlock, ResponseLine};

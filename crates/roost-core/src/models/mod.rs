//! Data models shared across crates, organized by domain.

mod account;
mod company;
mod file;
mod group;
mod identity;
mod post;
mod property;

pub use account::*;
pub use company::*;
pub use file::*;
pub use group::*;
pub use identity::*;
pub use post::*;
pub use property::*;

pub mod candidate;
pub mod client;
pub mod interview;
pub mod job;
pub mod message;
pub mod user;

pub use candidate::*;
pub use client::*;
pub use interview::*;
pub use job::*;
pub use message::*;
pub use user::*;

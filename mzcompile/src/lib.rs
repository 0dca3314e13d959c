#![doc = include_str!("../README.md")]

mod artifact;
mod bridge;
mod compiler;
mod error;
mod extract;
mod metadata;
pub mod pipe;
mod pipeline;
mod report;

pub use artifact::*;
pub use bridge::*;
pub use compiler::*;
pub use error::*;
pub use extract::*;
pub use metadata::*;
pub use pipeline::*;
pub use report::*;

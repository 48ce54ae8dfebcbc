#![doc = include_str!("../README.md")]

pub mod auth;
pub mod cli;
pub mod error;
pub mod model;
pub mod process;
pub mod store;
pub mod transform;

#[doc(inline)]
pub use cli::Cli;
#[doc(inline)]
pub use error::{ProcessError, StoreError};
#[doc(inline)]
pub use process::TreeService;

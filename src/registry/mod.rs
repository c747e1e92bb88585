//! Registry: module catalog and lifecycle orchestration.
//!
//! The only public API from this module is [`ModuleRegistry`] plus its
//! reporting types. Internal structure:
//! - [`core`]: catalog, dependency resolution, load/retry/activation;
//! - [`report`]: aggregate status view.

mod core;
mod report;

pub use core::ModuleRegistry;
pub use report::{FailingModule, StatusReport};

#[cfg(test)]
mod tests;

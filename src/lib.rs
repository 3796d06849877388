#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde;

#[macro_use]
pub mod log;
pub mod common;
pub mod error;
pub mod strings;
pub mod device;
pub mod design;
pub mod router;
pub mod import;
pub mod exporter;

#[cfg(test)]
pub(crate) mod testing;

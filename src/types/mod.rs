mod domain_types;
mod namespace;
mod params;

pub use domain_types::*;
pub use namespace::*;
pub use params::*;

pub mod stops;

pub use stops::*;

//! Pipeline module - load, prepare, fit, evaluate and cross-validate

pub mod collinearity;
pub mod cross_validation;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod impute;
pub mod loader;
pub mod model;
pub mod prepare;

pub use collinearity::*;
pub use cross_validation::*;
pub use error::{ChurnError, ModelError, Result};
pub use evaluate::*;
pub use features::*;
pub use impute::*;
pub use loader::*;
pub use model::*;
pub use prepare::*;

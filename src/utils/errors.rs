use thiserror::Error;

use crate::config::function::FunctionError;
use crate::config::table::TableError;
use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Function error: {0}")]
    Function(#[from] FunctionError),

    #[error("Physics error: {0}")]
    Physics(String),

    #[error("State error: {0}")]
    State(String),
}

pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliArgs, LogFormat};

pub use adapters::{ElementSnapshot, MemoryDocument};
pub use config::{AppConfig, BinderConfig, ModelRules};
pub use crate::core::{Binder, InvalidClassHook, Session};
pub use domain::model::{AccessorKind, BindingRecord, Cascade, Change, ElementId, Field};
pub use domain::ports::{ElementAccess, Model, ValidityHook};
pub use utils::error::{BindError, Result};

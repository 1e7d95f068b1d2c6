pub mod accessor;
pub mod applier;
pub mod parser;
pub mod session;
pub mod validation;
pub mod value;

pub use crate::domain::model::{AccessorKind, BindingRecord, ElementId};
pub use crate::domain::ports::{ElementAccess, Model, ValidityHook};
pub use crate::utils::error::Result;
pub use accessor::PropertyClassification;
pub use session::{Binder, Session};
pub use validation::{InvalidClassHook, InvalidSet};

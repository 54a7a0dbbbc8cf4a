//! The standard actions.

mod field_set;
mod nil;
mod state_to_metastate;

pub use field_set::FieldSetAction;
pub use nil::NilAction;
pub use state_to_metastate::StateToMetaStateAction;

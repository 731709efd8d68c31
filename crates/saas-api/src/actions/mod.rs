//! Form actions: typed schemas and the wrappers that validate them

pub mod forms;
pub mod validator;

pub use validator::{
    validated_action, validated_action_with_user, ActionError, ActionOutcome, ActionResult,
    ActionSchema, ActionState,
};

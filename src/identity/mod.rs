//! Session user and organization settings as seen by the admin console.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
pub mod org_settings;

pub use principal::{CurrentUser, Organization, UserInfo};
pub use org_settings::{AclDefaults, UpdateMode};

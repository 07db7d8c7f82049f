//! Users resource.

pub mod model;
pub mod store;

pub use model::{NewUser, User, UserUpdate};
pub use store::{StoreError, UserStore};

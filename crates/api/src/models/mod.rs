//! Domain models for the API.
//!
//! These are validated domain values, separate from database row types.

pub mod cart;
pub mod item;
pub mod session;
pub mod user;

pub use cart::CartLine;
pub use item::{Item, ItemUpdate, NewItem};
pub use session::SessionContext;
pub use user::{NewUser, ResetCredential, User};

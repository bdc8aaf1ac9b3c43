//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Signup, signin, session tokens, account administration
//! - `guard` - Authorization checks over a session context
//! - `password_reset` - Reset credential issuance and redemption
//! - `cart` - Cart line add/remove
//! - `items` - Item CRUD with ownership checks
//! - `email` - Outbound mail (SMTP or outbox)
//!
//! Services borrow the store and codec from `AppState` for the length of one
//! request; none of them hold state of their own.

pub mod auth;
pub mod cart;
pub mod email;
pub mod guard;
pub mod items;
pub mod password_reset;

pub use auth::{AuthError, AuthService, IssuedSession, TokenCodec};
pub use cart::CartReconciler;
pub use email::{EmailError, EmailService, OutgoingEmail};
pub use items::{ItemDraft, ItemService};
pub use password_reset::PasswordResetManager;

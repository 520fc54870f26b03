//! Auth-domain identifiers, accounts, phone numbers, and token models.

pub mod account;
pub mod id;
pub mod owner;
pub mod phone;
pub mod scope;
pub mod secret;
pub mod token;

pub use account::*;
pub use id::*;
pub use owner::*;
pub use phone::*;
pub use scope::*;
pub use secret::*;
pub use token::*;

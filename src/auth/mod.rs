pub mod credentials;
pub mod token;

pub use token::{ActorType, AuthUser, TokenIssuer};

pub mod claims;
pub mod dto;
pub mod guard;
pub mod role;
pub mod services;

pub use claims::{decode_claims, TokenClaims};
pub use guard::{AdminGuard, GuardDecision, HOME_ROUTE};
pub use role::Role;
pub use services::AuthService;

//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 access tokens issued by the main application
//! - `mock` - Test implementation that doesn't require signed tokens

mod jwt;
mod mock;

pub use jwt::{JwtConfig, JwtSessionValidator, SessionClaims, DEFAULT_ISSUER, DEFAULT_LEEWAY_SECS};
pub use mock::MockSessionValidator;

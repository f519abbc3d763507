/// Authentication module
///
/// Password hashing, access token signing/validation, refresh token lifecycle,
/// credential extraction and ownership checks.

mod claims;
mod credentials;
mod extractors;
mod guard;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::{Claims, ACCESS_TOKEN_ISSUER};
pub use credentials::{
    api_key, bearer_token, extract, CredentialMissing, API_KEY_SCHEME, BEARER_SCHEME,
};
pub use extractors::ServiceCaller;
pub use guard::{keys_match, AuthContext, AuthorizationGuard};
pub use jwt::{AccessTokenCodec, TokenError};
pub use password::{PasswordError, PasswordHasher};
pub use refresh_token::{generate_refresh_token, RefreshTokenError, RefreshTokenStore};
pub use session::{Session, SessionService};

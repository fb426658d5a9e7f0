// Core session-trust types for hushd
// Decision: The server never stores sessions; everything needed to trust a
// request is inside the cookie, so this crate owns the whole trust decision

pub mod identity;
pub mod session;

pub use identity::Identity;
pub use session::{DecodedSession, SessionCodec, SigningKeys};

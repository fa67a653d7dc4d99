//! Upstream adapters for the deadline proxy.
//!
//! Each supported platform (Gradescope, the EGate/Blackboard portal, and
//! Hydro-based online judges) gets one adapter implementing the same
//! capability set: perform the platform's native login flow, fetch the
//! assignment/homework listing, and normalize it into the records defined
//! in `dlp-protocol`.
//!
//! Sessions are plain cookie jars. They are created here, serialized to a
//! name→value mapping for the client, and restored from that mapping on
//! later requests; the proxy itself never stores them.

pub mod error;
pub mod session;
pub mod upstream;

pub use error::{FetchError, Result};
pub use session::Session;
pub use upstream::egate::EgateClient;
pub use upstream::gradescope::GradescopeClient;
pub use upstream::hydro::HydroClient;

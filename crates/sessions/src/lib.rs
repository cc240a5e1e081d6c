//! Session lifecycle for the Lovent client.
//!
//! Persists the logged-in user's session in an encrypted namespace (with a
//! plaintext fallback), enforces the absolute and inactivity expiry rules
//! on every login check, and exposes the read/write operations the app's
//! screens rely on.

pub mod clock;
pub mod global;
pub mod lifecycle;
pub mod record;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use global::{shared_or_init, shared_store, try_shared};
pub use lifecycle::{ExpiryPolicy, ExpiryReason, SessionState};
pub use record::{AuthPayload, NewSession, SessionInfo, SessionRecord, UserInfo};
pub use storage::{open_store, OpenedStore, StorageTier};
pub use store::SessionStore;

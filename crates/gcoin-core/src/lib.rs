// crates/gcoin-core/src/lib.rs
//
// gcoin-core: Core identifiers, error taxonomy, notifications, execution
// environment, and collaborator interfaces for the GCoin ledger.
//
// This is the leaf crate the other crates in the workspace depend on. It owns
// no ledger state; the accounting itself lives in gcoin-ledger.

pub mod crypto;
pub mod env;
pub mod error;
pub mod events;
pub mod gate;
pub mod identity;
pub mod registry;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use gcoin_core::Account;`

// Identity types
pub use identity::{Account, CardId, InvoiceId};

// Environment
pub use env::{Clock, Env, ManualClock, SystemClock};

// Error types
pub use error::{FatalError, GateError, LedgerError, RegistryError};

// Notifications
pub use events::LedgerEvent;

// Collaborators
pub use gate::{OpenGate, SignatureSlotGate};
pub use registry::StaticRegistry;
pub use traits::{AuthorizationGate, IcapResolution, Registry};

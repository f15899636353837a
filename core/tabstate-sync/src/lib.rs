//! Cross-context state synchronization for tabstate.
//!
//! Keeps a JSON state persisted in a key/value slot and consistent across
//! every context (tab, window, frame, or simply engine instance) that shares
//! the slot's storage origin.
//!
//! # Architecture
//!
//! - **Observe**: cursors that report effective mutations of a shared state
//! - **Gateway**: deferred, ordered writes that broadcast every stored value
//! - **Listener**: follows broadcasts for one slot and folds them into state
//! - **Status**: the non-throwing channel asynchronous failures land in
//! - **Engine**: wires the above around one slot
//!
//! ## Consistency
//!
//! Writes from one engine are committed in the order they were issued.
//! Across contexts the last broadcast observed wins; there is no versioning
//! and no locking of the slot.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tabstate_storage::StorageOrigin;
//! use tabstate_sync::{EngineOptions, SyncEngine};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tabstate_sync::SyncResult<()> {
//! let origin = StorageOrigin::in_memory();
//! let engine = SyncEngine::new(
//!     &origin,
//!     EngineOptions::new()
//!         .initial(json!({ "count": 0 }))
//!         .updater("increment", |state, args| {
//!             let by = args.first().and_then(|v| v.as_i64()).unwrap_or(1);
//!             let count = state["count"].as_i64().unwrap_or(0);
//!             json!({ "count": count + by })
//!         }),
//! )?;
//! engine.ready().await;
//!
//! engine.state().set("count", 2)?;
//! engine.dispatch("increment", &[json!(3)])?;
//! engine.flush().await?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod gateway;
mod listener;
mod observe;
mod status;
mod updaters;
mod views;

pub use engine::{EngineOptions, EnginePhase, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use gateway::{PendingWrite, PersistenceGateway, SlotWriter, WriteCallback};
pub use listener::{ListenerHandle, ReconciliationListener};
pub use observe::{observe, ChangeHook, Observed, PathSegment, StateCell};
pub use status::{ErrorStatus, Failure, Operation};
pub use updaters::{Action, ActionSet, UpdaterEntry, UpdaterFn, Updaters};
pub use views::{ReadView, StateWatcher, WriteView};

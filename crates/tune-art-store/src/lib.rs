/// Reactive snapshot stores with patch-producing mutations.
///
/// Every piece of mutable editor state lives in a [`Store`]: one immutable
/// snapshot, edited through a copy-on-write builder that can report the
/// forward and inverse [`Patch`] lists of each edit, observed through plain
/// or selector-scoped subscriptions.
pub mod diff;
pub mod error;
pub mod patch;
pub mod selector;
pub mod store;

pub use diff::{diff, diff_pair};
pub use error::{PatchError, StoreError};
pub use patch::{apply_patches, Patch, PatchOp, PathSegment};
pub use selector::{SelectorOptions, Watch};
pub use store::{ListenerId, Store, Subscription};

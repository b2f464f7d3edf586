//! Houdini Archive - Saving and loading asset components
//!
//! A [`ComponentArchive`] captures what a component needs to come back
//! after a reload: its lifecycle tag, the asset it references, the raw
//! scratch buffer and one record per generated field. Field names are not
//! stored; they are derived again from the new schema name on load.
//!
//! Two encodings are provided:
//! - binary via bincode, for the editor's own save files
//! - RON, pretty printed, for inspection and diffing
//!
//! ```text
//! AssetComponent --save--> ComponentArchive --to_bytes/to_ron--> storage
//! storage --from_bytes/from_ron--> ComponentArchive --restore--> AssetComponent
//! ```
//!
//! A restored component keeps its asset uninstantiated until an edit is
//! pending; fields saved as changed are pushed once it is instantiated.

mod archive;
mod error;
mod restore;

pub use archive::{ComponentArchive, SerializedProperty, ARCHIVE_VERSION};
pub use error::{Error, Result};
pub use restore::{restore, restore_into_world};

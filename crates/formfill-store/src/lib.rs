#![allow(missing_docs)]

pub mod error;
pub mod forms;
pub mod ids;
pub mod images;

pub use error::StoreError;
pub use forms::{FsFormRepository, MemoryFormRepository, SavedFormRepository};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use images::{FsImageStore, ImageStore, MemoryImageStore};

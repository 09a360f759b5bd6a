//! catalog-media: where product images live.
//!
//! The [`MediaStore`] trait is what the product workflow talks to.
//! [`CloudinaryStore`] speaks the Cloudinary upload API, [`MemoryMediaStore`]
//! keeps assets in process for development and tests. [`public_id`] turns a
//! stored delivery URL back into the identifier the store deletes by.

pub mod cloudinary;
pub mod config;
pub mod error;
pub mod memory;
pub mod public_id;
pub mod store;

pub use cloudinary::CloudinaryStore;
pub use config::MediaConfig;
pub use error::{MediaError, MediaResult};
pub use memory::MemoryMediaStore;
pub use public_id::{parse_public_id, recover_public_id, PublicId, PublicIdSource};
pub use store::{DeleteOutcome, MediaStore, MediaUpload, StoredAsset};

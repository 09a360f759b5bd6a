pub mod uploads_routes;

pub use uploads_routes::{router, UploadReceipt};

pub mod drop_zone;

pub use drop_zone::{DropAction, DropEvent, DropZone};

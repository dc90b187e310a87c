pub mod adapter;
pub mod backend;
pub mod encode;
pub mod file;
pub mod synthetic;

pub use adapter::CameraAdapter;
pub use backend::{RawFrame, VideoBackend, VideoStream};
pub use file::ImageFileBackend;
pub use synthetic::{SyntheticBackend, SyntheticCounters};

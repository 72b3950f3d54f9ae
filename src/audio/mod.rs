pub mod file;
pub mod mic;
pub mod source;

pub use file::{AudioFile, FileSource};
pub use mic::MicSource;
pub use source::{resample, AudioChunk, AudioSource};

//! Video playback for the ambient animations.

pub mod pipeline;

pub use pipeline::VideoPipeline;

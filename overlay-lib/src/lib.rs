//! # Overlay Audio Library
//!
//! Overlays one mono 16-bit PCM track onto another starting at a fixed time
//! offset. The [`mix`] module holds the sample-domain mixer, which is a pure
//! function over in-memory buffers. Getting audio in and out of container
//! formats is delegated to a [`transcode::Transcoder`], and [`pipeline`]
//! wires decode, mix and encode together.

pub mod level;
pub mod mix;
pub mod pcm;
pub mod pipeline;
pub mod transcode;

mod capacity;
pub mod config;
mod crypto;
mod embed;
mod frame;
mod integrity;
pub mod pipeline;
mod raster;
mod transform;

pub use capacity::{CapacityError, CapacityPlan};
pub use config::{ChannelPolicy, CodecParams, DecodeOptions, EncodeOptions};
pub use frame::FrameError;
pub use pipeline::error::CodecError;
pub use pipeline::hook::{NoopHook, PipelineHook};
pub use pipeline::state::Stage;
pub use pipeline::{decode_message, encode_message, roundtrip, Codec, RoundtripResult};

use anyhow::Result;

use crate::pipeline::state::Stage;

/// Observer and transport seam around a codec call.
///
/// `on_stage` sees every stage transition of an `encode` or `decode`.
/// `after_encode` sits between encoding and decoding in a
/// [`roundtrip`](super::roundtrip), for example uploading the encoded PNG to
/// object storage and fetching it back before decoding.
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use kalupto::PipelineHook;
///
/// struct BlobStoreHook;
///
/// impl PipelineHook for BlobStoreHook {
///     fn after_encode(&self, encoded: Vec<u8>) -> Result<Vec<u8>> {
///         // upload `encoded` ...
///         // download it back ...
///         Ok(encoded) // placeholder
///     }
/// }
/// ```
pub trait PipelineHook {
    /// Called on entry to every stage, including `Done` and `Failed`.
    fn on_stage(&self, _stage: Stage) {}

    /// Return the bytes the decoder should read: the same image, or a copy
    /// that travelled through an external store.
    fn after_encode(&self, encoded: Vec<u8>) -> Result<Vec<u8>> {
        Ok(encoded)
    }
}

/// A no-op hook that passes the encoded image through unchanged.
///
/// Used as the default when no intermediate steps are needed.
pub struct NoopHook;

impl PipelineHook for NoopHook {}

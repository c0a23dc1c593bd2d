//! Pipeline stages for leaf-photo diagnosis.
//!
//! Each submodule implements exactly one transformation step and is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ decode ──▶ encode ──▶ llm ──▶ normalize
//! (allow-list)  (RGB8)    (base64)   (VLM)   (fences + fields)
//! ```
//!
//! 1. [`validate`]: filename/MIME allow-list and empty-payload check
//! 2. [`decode`]: sniff and decode the bytes, convert to RGB8, downscale;
//!    CPU-bound, so callers run it in `spawn_blocking`
//! 3. [`encode`]: PNG-encode and base64-wrap for the multimodal request
//! 4. [`llm`]: the VLM call; the only stage with network I/O
//! 5. [`normalize`]: strip markdown fences and validate the three fields

pub mod decode;
pub mod encode;
pub mod llm;
pub mod normalize;
pub mod validate;

//! Item atlas generator
//!
//! Builds a single grid image of item and block icons plus a JSON index of
//! where each icon sits:
//! - Extract the canonical identifier list from creative-tab registration source
//! - Resolve display names and icons through an ordered list of data providers
//! - Normalize icons to square tiles and pack them in raster-scan order
//! - Emit the atlas PNG and metadata in canonical order

pub mod atlas;
pub mod cli;
pub mod config;
pub mod extract;
pub mod item;
pub mod logging;
pub mod metadata;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod provider;
pub mod resolve;
pub mod source;

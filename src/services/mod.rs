//! Services for fetching feed payloads and reference data.

pub mod feed;
pub mod reference;

pub use feed::{FeedSource, HttpFeed};
pub use reference::{
    AssetSource, CachedReferenceData, HttpAssetSource, ReferenceAsset, ReferenceDataProvider,
    StaticAssetSource,
};

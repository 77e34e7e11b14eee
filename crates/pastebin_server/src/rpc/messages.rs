//! Protobuf messages for the `pastebin.PasteBin` service.

use pastebin_core::models::bin::Bin as StoredBin;

/// A bin as carried on the wire.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Bin {
    #[prost(int64, tag = "1")]
    pub timestamp: i64,
    #[prost(string, tag = "2")]
    pub title: String,
    #[prost(string, tag = "3")]
    pub content: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetBinsRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetBinsReply {
    #[prost(message, repeated, tag = "1")]
    pub data: Vec<Bin>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NewBinRequest {
    #[prost(string, tag = "1")]
    pub title: String,
    #[prost(string, tag = "2")]
    pub content: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NewBinResponse {
    /// HTTP-style status code; `200` on success.
    #[prost(int32, tag = "1")]
    pub status: i32,
}

impl From<StoredBin> for Bin {
    fn from(value: StoredBin) -> Self {
        Self {
            timestamp: value.timestamp,
            title: value.title,
            content: value.content,
        }
    }
}

impl From<Bin> for StoredBin {
    fn from(value: Bin) -> Self {
        Self {
            timestamp: value.timestamp,
            title: value.title,
            content: value.content,
        }
    }
}

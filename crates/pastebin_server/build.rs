//! Generates the gRPC service glue for the `pastebin.PasteBin` service.
//!
//! Messages are hand-written prost types in `src/rpc/messages.rs` that mirror
//! `proto/pastebin.proto`, so no `protoc` is needed at build time.

fn main() {
    let method = |name: &str, route: &str, input: &str, output: &str| {
        tonic_build::manual::Method::builder()
            .name(name)
            .route_name(route)
            .input_type(input)
            .output_type(output)
            .codec_path("tonic::codec::ProstCodec")
            .build()
    };

    let service = tonic_build::manual::Service::builder()
        .name("PasteBin")
        .package("pastebin")
        .method(method(
            "get_bins",
            "GetBins",
            "crate::rpc::messages::GetBinsRequest",
            "crate::rpc::messages::GetBinsReply",
        ))
        .method(method(
            "new_bin",
            "NewBin",
            "crate::rpc::messages::NewBinRequest",
            "crate::rpc::messages::NewBinResponse",
        ))
        .build();

    tonic_build::manual::Builder::new().compile(&[service]);
}

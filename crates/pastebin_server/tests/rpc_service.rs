//! gRPC service behavior, exercised through the generated service trait.

mod support;

use pastebin_server::rpc::messages::{GetBinsRequest, NewBinRequest};
use pastebin_server::rpc::{PasteBin, PasteBinService};
use support::memory_state;
use tonic::{Code, Request};

fn new_bin(title: &str, content: &str) -> Request<NewBinRequest> {
    Request::new(NewBinRequest {
        title: title.to_string(),
        content: content.to_string(),
    })
}

#[tokio::test]
async fn new_bin_reports_status_200_and_is_listed() {
    let service = PasteBinService::new(memory_state(10));

    let reply = service
        .new_bin(new_bin("hello", "<kept as-is>"))
        .await
        .expect("new bin")
        .into_inner();
    assert_eq!(reply.status, 200);

    let bins = service
        .get_bins(Request::new(GetBinsRequest {}))
        .await
        .expect("get bins")
        .into_inner()
        .data;
    assert_eq!(bins.len(), 1);
    assert_eq!(bins[0].title, "hello");
    assert_eq!(bins[0].content, "<kept as-is>");
}

#[tokio::test]
async fn full_store_evicts_oldest_over_rpc() {
    let state = memory_state(3);
    let service = PasteBinService::new(state.clone());

    for title in ["a", "b", "c", "d"] {
        service.new_bin(new_bin(title, "")).await.expect("insert");
    }

    let bins = service
        .get_bins(Request::new(GetBinsRequest {}))
        .await
        .expect("get bins")
        .into_inner()
        .data;
    let titles: Vec<&str> = bins.iter().map(|bin| bin.title.as_str()).collect();
    assert_eq!(titles, vec!["b", "c", "d"]);

    let archived = state.store.list_archive().expect("archive");
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].title, "a");
}

#[tokio::test]
async fn oversized_fields_are_invalid_arguments() {
    let service = PasteBinService::new(memory_state(10));

    let status = service
        .new_bin(new_bin("ok", &"x".repeat(257)))
        .await
        .expect_err("oversized content");
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("content"));

    let bins = service
        .get_bins(Request::new(GetBinsRequest {}))
        .await
        .expect("get bins")
        .into_inner()
        .data;
    assert!(bins.is_empty());
}

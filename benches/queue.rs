//! Benchmark tests for the upload queue
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::HeaderMap;
use upload_queue::model::file_descriptor::FileDescriptor;
use upload_queue::model::file_queue::FileQueue;
use upload_queue::model::upload_response::{classify, TerminalResponse};
use upload_queue::services::page::Page;
use upload_queue::services::transport::{EventSender, Transport, UploadRequest};
use upload_queue::services::upload_controller::UploadController;
use upload_queue::settings::callbacks::Callbacks;
use upload_queue::settings::session_config::{SessionConfig, SessionOptions};

/// Accepts requests; the benchmark completes them through the controller
struct LoopbackTransport;

impl Transport for LoopbackTransport {
    fn wire(&mut self, _events: EventSender) {}

    fn send(&mut self, _request: UploadRequest) {}

    fn abort(&mut self) {}
}

struct NullPage;

impl Page for NullPage {
    fn supports_file_list(&self) -> bool {
        true
    }

    fn set_progress_width(&mut self, _element_id: &str, _percent: f64) {}

    fn reset_form(&mut self, _form_id: &str) {}
}

fn create_queue(count: usize) -> FileQueue {
    (0..count)
        .map(|i| {
            let name = format!("file-{}.txt", i);
            FileDescriptor::from_bytes(name, "text/plain", format!("content {}", i))
        })
        .collect::<Vec<_>>()
        .into()
}

fn ok_response() -> TerminalResponse {
    TerminalResponse {
        status: 200,
        headers: HeaderMap::new(),
        body: r#"{"status":"OK"}"#.to_string(),
    }
}

fn bench_queue_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_run");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("all_ok", size), size, |b, &size| {
            let queue = create_queue(size);
            let config = SessionConfig::from(SessionOptions {
                url: "http://localhost/upload".to_string(),
                ..Default::default()
            });
            let mut controller =
                UploadController::new(config, Callbacks::new(), LoopbackTransport, NullPage);

            b.iter(|| {
                controller.select(queue.clone());
                while let Some(request) = controller.outstanding() {
                    controller.on_complete(request, ok_response());
                }
                black_box(controller.state().index())
            });
        });
    }

    group.finish();
}

fn bench_response_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");

    group.bench_function("ok_body", |b| b.iter(|| black_box(classify(ok_response()))));
    group.bench_function("rejected_body", |b| {
        b.iter(|| {
            black_box(classify(TerminalResponse {
                status: 200,
                headers: HeaderMap::new(),
                body: r#"{"status":"QUOTA_EXCEEDED","detail":"no space left"}"#.to_string(),
            }))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_queue_run, bench_response_classification);
criterion_main!(benches);

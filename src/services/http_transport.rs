use crate::model::file_descriptor::FileContent;
use crate::model::progress_event::ProgressEvent;
use crate::model::upload_response::TerminalResponse;
use crate::services::transport::{EventSender, RequestId, Transport, TransportEvent, UploadRequest};
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use http::header::CONTENT_LENGTH;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncReadExt;
use tokio::task::AbortHandle;

/// Size of the body chunks, and therefore the progress granularity (64 KB)
const CHUNK_SIZE: usize = 64 * 1024;

type ChunkStream = BoxStream<'static, io::Result<Bytes>>;

struct InFlight {
    request: RequestId,
    handle: AbortHandle,
}

/// Reusable HTTP request object backed by a reqwest client.
///
/// Each request runs in its own tokio task so the caller's loop never blocks
/// on the network; cancellation aborts that task.
pub struct HttpTransport {
    client: reqwest::Client,
    events: Option<EventSender>,
    in_flight: Option<InFlight>,
}

impl HttpTransport {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        HttpTransport {
            client,
            events: None,
            in_flight: None,
        }
    }
}

impl Transport for HttpTransport {
    fn wire(&mut self, events: EventSender) {
        self.events = Some(events);
    }

    fn send(&mut self, request: UploadRequest) {
        let Some(events) = self.events.clone() else {
            tracing::error!("{} dropped: transport is not wired", request.id);
            return;
        };
        if let Some(previous) = self.in_flight.take() {
            if !previous.handle.is_finished() {
                tracing::debug!("{} replaced by {}", previous.request, request.id);
                previous.handle.abort();
            }
        }

        let id = request.id;
        let client = self.client.clone();
        let handle = tokio::spawn(async move {
            let response = perform(client, request, events.clone()).await;
            tracing::debug!("{} finished with status {}", id, response.status);
            let _ = events.send(TransportEvent::Complete { request: id, response });
        });
        self.in_flight = Some(InFlight {
            request: id,
            handle: handle.abort_handle(),
        });
    }

    fn abort(&mut self) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        if in_flight.handle.is_finished() {
            return;
        }
        in_flight.handle.abort();
        tracing::info!("{} aborted", in_flight.request);
        if let Some(events) = &self.events {
            let _ = events.send(TransportEvent::Complete {
                request: in_flight.request,
                response: TerminalResponse::transport_failure(),
            });
        }
    }
}

async fn perform(
    client: reqwest::Client,
    request: UploadRequest,
    events: EventSender,
) -> TerminalResponse {
    let UploadRequest {
        id,
        url,
        headers,
        declared_size,
        body,
    } = request;

    let (chunks, length) = match open_body(body).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("{}: cannot read file: {}", id, e);
            return TerminalResponse::transport_failure();
        }
    };
    if length != declared_size {
        tracing::debug!("{}: sending {} bytes, {} declared", id, length, declared_size);
    }
    let body = ProgressStream::new(chunks, length, id, events);

    let result = client
        .post(&url)
        .headers(headers)
        .header(CONTENT_LENGTH, length)
        .body(reqwest::Body::wrap_stream(body))
        .send()
        .await;
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("{}: request to {} failed: {}", id, url, e);
            return TerminalResponse::transport_failure();
        }
    };

    let status = response.status().as_u16();
    let headers = response.headers().clone();
    match response.text().await {
        Ok(body) => TerminalResponse {
            status,
            headers,
            body,
        },
        Err(e) => {
            tracing::warn!("{}: failed reading response body: {}", id, e);
            TerminalResponse::transport_failure()
        }
    }
}

/// Chunks of the request body and the exact number of bytes they add up to
async fn open_body(content: Option<FileContent>) -> io::Result<(ChunkStream, u64)> {
    match content {
        Some(FileContent::Memory(bytes)) => {
            let length = bytes.len() as u64;
            Ok((memory_chunks(bytes), length))
        }
        Some(FileContent::Path(path)) => file_chunks(path).await,
        None => Ok((stream::empty().boxed(), 0)),
    }
}

fn memory_chunks(bytes: Bytes) -> ChunkStream {
    let mut chunks = Vec::with_capacity(bytes.len() / CHUNK_SIZE + 1);
    let mut rest = bytes;
    while rest.len() > CHUNK_SIZE {
        chunks.push(rest.split_to(CHUNK_SIZE));
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    stream::iter(chunks.into_iter().map(Ok)).boxed()
}

/// Stream a file from disk, sized when it is opened rather than when it was selected
async fn file_chunks(path: PathBuf) -> io::Result<(ChunkStream, u64)> {
    let file = tokio::fs::File::open(&path).await?;
    let length = file.metadata().await?.len();
    let chunks = stream::try_unfold(file, |mut file| async move {
        let mut buffer = BytesMut::with_capacity(CHUNK_SIZE);
        let read = file.read_buf(&mut buffer).await?;
        let next = (read > 0).then(|| (buffer.freeze(), file));
        Ok::<_, io::Error>(next)
    });
    Ok((chunks.boxed(), length))
}

struct ProgressTracker {
    loaded: u64,
    total: u64,
    request: RequestId,
    events: EventSender,
}

impl ProgressTracker {
    fn track(&mut self, len: u64) -> io::Result<()> {
        self.loaded += len;
        if self.loaded > self.total {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("body grew past the announced {} bytes", self.total),
            ));
        }
        let progress = ProgressEvent::new(self.loaded, self.total);
        let _ = self.events.send(TransportEvent::Progress {
            request: self.request,
            progress,
        });
        Ok(())
    }

    fn finish(&self) -> io::Result<()> {
        if self.loaded < self.total {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("body ended after {} of {} bytes", self.loaded, self.total),
            ));
        }
        Ok(())
    }
}

/// Request body that reports every chunk handed to the connection.
///
/// Fails the request when the content does not add up to the announced length.
#[pin_project::pin_project]
pub struct ProgressStream<S> {
    #[pin]
    inner: S,
    tracker: ProgressTracker,
    done: bool,
}

impl<S> ProgressStream<S>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    fn new(inner: S, total: u64, request: RequestId, events: EventSender) -> Self {
        ProgressStream {
            inner,
            tracker: ProgressTracker {
                loaded: 0,
                total,
                request,
                events,
            },
            done: false,
        }
    }
}

impl<S> Stream for ProgressStream<S>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }
        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => match this.tracker.track(chunk.len() as u64) {
                Ok(()) => Poll::Ready(Some(Ok(chunk))),
                Err(e) => {
                    *this.done = true;
                    Poll::Ready(Some(Err(e)))
                }
            },
            Poll::Ready(None) => {
                *this.done = true;
                match this.tracker.finish() {
                    Ok(()) => Poll::Ready(None),
                    Err(e) => Poll::Ready(Some(Err(e))),
                }
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::file_descriptor::FileDescriptor;
    use tokio::sync::mpsc;

    const UNREACHABLE: &str = "http://127.0.0.1:1/upload";

    #[tokio::test]
    async fn test_memory_chunks_split_content() {
        let data = Bytes::from(vec![7u8; CHUNK_SIZE * 2 + 10]);
        let chunks: Vec<Bytes> = memory_chunks(data).map(|c| c.unwrap()).collect().await;
        let sizes: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![CHUNK_SIZE, CHUNK_SIZE, 10]);
    }

    #[tokio::test]
    async fn test_file_chunks_read_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, vec![1u8; CHUNK_SIZE + 5]).unwrap();

        let (chunks, length) = file_chunks(path).await.unwrap();
        let chunks: Vec<Bytes> = chunks.map(|c| c.unwrap()).collect().await;
        assert_eq!(length, (CHUNK_SIZE + 5) as u64);
        assert_eq!(chunks.iter().map(Bytes::len).sum::<usize>(), CHUNK_SIZE + 5);
    }

    #[tokio::test]
    async fn test_body_length_comes_from_content_not_descriptor() {
        let file = FileDescriptor::legacy("old.txt", 3, "text/plain")
            .with_content(FileContent::Memory(Bytes::from_static(b"hello world")));
        let (_, length) = open_body(file.content).await.unwrap();
        assert_eq!(length, 11);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growing.txt");
        std::fs::write(&path, b"hello").unwrap();
        let file = FileDescriptor::from_path(&path).unwrap();
        std::fs::write(&path, b"hello world").unwrap();
        let (_, length) = open_body(file.content).await.unwrap();
        assert_eq!(length, 11);
    }

    #[tokio::test]
    async fn test_progress_stream_reports_each_chunk() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let inner = memory_chunks(Bytes::from(vec![0u8; CHUNK_SIZE + 1]));
        let stream = ProgressStream::new(inner, (CHUNK_SIZE + 1) as u64, RequestId::new(3), tx);
        let _: Vec<_> = stream.collect().await;

        let mut loaded = Vec::new();
        while let Ok(TransportEvent::Progress { request, progress }) = rx.try_recv() {
            assert_eq!(request, RequestId::new(3));
            assert!(progress.length_computable);
            loaded.push(progress.loaded);
        }
        assert_eq!(loaded, vec![CHUNK_SIZE as u64, CHUNK_SIZE as u64 + 1]);
    }

    #[tokio::test]
    async fn test_progress_stream_fails_when_body_falls_short() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let inner = memory_chunks(Bytes::from_static(b"hello"));
        let items: Vec<io::Result<Bytes>> =
            ProgressStream::new(inner, 20, RequestId::new(1), tx).collect().await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        let err = items[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_progress_stream_fails_when_body_overshoots() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let inner = memory_chunks(Bytes::from_static(b"hello world"));
        let items: Vec<io::Result<Bytes>> =
            ProgressStream::new(inner, 5, RequestId::new(1), tx).collect().await;

        assert_eq!(items.len(), 1);
        let err = items[0].as_ref().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_completes_with_status_zero() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = HttpTransport::new().unwrap();
        transport.wire(tx);

        let file = FileDescriptor::from_bytes("a.txt", "text/plain", "hello");
        let request = UploadRequest::for_file(RequestId::new(1), UNREACHABLE, &file, 0, "upload_0");
        transport.send(request);

        loop {
            match rx.recv().await.unwrap() {
                TransportEvent::Complete { request, response } => {
                    assert_eq!(request, RequestId::new(1));
                    assert_eq!(response.status, 0);
                    break;
                }
                TransportEvent::Progress { .. } => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_missing_file_completes_with_status_zero() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = HttpTransport::new().unwrap();
        transport.wire(tx);

        let file = FileDescriptor::legacy("gone.txt", 3, "text/plain")
            .with_content(FileContent::Path(PathBuf::from("/nonexistent/gone.txt")));
        let request = UploadRequest::for_file(RequestId::new(5), UNREACHABLE, &file, 0, "upload_0");
        transport.send(request);

        match rx.recv().await.unwrap() {
            TransportEvent::Complete { request, response } => {
                assert_eq!(request, RequestId::new(5));
                assert_eq!(response.status, 0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_abort_without_request_is_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = HttpTransport::new().unwrap();
        transport.wire(tx);
        transport.abort();
        assert!(rx.try_recv().is_err());
    }
}

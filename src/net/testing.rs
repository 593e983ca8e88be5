//! Test doubles for the network stack.
//!
//! `MockTransport` answers requests from a handler closure and records
//! every request it sees. Its futures yield once before resolving so
//! logically concurrent callers genuinely interleave under a local
//! executor, which is what the single-flight tests need.

use std::cell::RefCell;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::LocalBoxFuture;

use crate::net::ApiError;
use crate::net::transport::{ApiRequest, ApiResponse, Transport};

type Handler = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError>>;

pub struct MockTransport {
    handler: Handler,
    requests: RefCell<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Shorthand: every request gets the same response.
    pub fn always(status: u16, body: &str) -> Self {
        let body = body.to_owned();
        Self::new(move |_| Ok(ApiResponse::new(status, body.clone())))
    }

    /// All requests seen so far, in send order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    /// Number of requests sent to a given route template.
    pub fn calls_to(&self, route: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.route == route)
            .count()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: ApiRequest) -> LocalBoxFuture<'_, Result<ApiResponse, ApiError>> {
        self.requests.borrow_mut().push(request.clone());
        let result = (self.handler)(&request);
        Box::pin(async move {
            yield_now().await;
            result
        })
    }
}

/// Suspend once, waking immediately. Forces an await point so concurrent
/// futures interleave deterministically under `futures::executor`.
pub async fn yield_now() {
    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    YieldOnce(false).await;
}

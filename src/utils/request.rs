use axum::http::{HeaderValue, Request};

use tower_http::request_id::{MakeRequestId, RequestId};

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

// A `MakeRequestId` that increments an atomic counter
#[derive(Clone, Default)]
pub struct CounterRequestId {
    counter: Arc<AtomicU64>,
}

impl MakeRequestId for CounterRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let request_id = self.counter.fetch_add(1, Ordering::SeqCst);

        Some(RequestId::new(HeaderValue::from(request_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increment_and_are_shared_between_clones() {
        let mut first = CounterRequestId::default();
        let mut second = first.clone();

        let request = Request::new(());

        let ids: Vec<_> = [
            first.make_request_id(&request),
            second.make_request_id(&request),
            first.make_request_id(&request),
        ]
        .into_iter()
        .map(|id| id.unwrap().header_value().to_str().unwrap().to_owned())
        .collect();

        assert_eq!(ids, vec!["0", "1", "2"]);
    }
}

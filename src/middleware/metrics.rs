use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Number of requests served by the `/app` file server since start or last reset
#[derive(Debug, Default)]
pub struct FileServerHits(AtomicU64);

impl FileServerHits {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

/// Counts every request passing through the wrapped service.
pub struct CountHits {
    hits: Arc<FileServerHits>,
}

impl CountHits {
    pub fn new(hits: Arc<FileServerHits>) -> Self {
        Self { hits }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CountHits
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CountHitsService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(CountHitsService {
            service: Rc::new(service),
            hits: self.hits.clone(),
        }))
    }
}

pub struct CountHitsService<S> {
    service: Rc<S>,
    hits: Arc<FileServerHits>,
}

impl<S, B> Service<ServiceRequest> for CountHitsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let path = req.path().to_string();
        let hits = self.hits.increment();

        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await?;

            tracing::debug!(
                path = %path,
                status = res.status().as_u16(),
                hits,
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Static file served"
            );

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as atest;
    use actix_web::{web, App, HttpResponse};

    #[test]
    fn test_counter_reset() {
        let hits = FileServerHits::default();
        assert_eq!(hits.increment(), 1);
        assert_eq!(hits.increment(), 2);
        hits.reset();
        assert_eq!(hits.get(), 0);
    }

    #[actix_web::test]
    async fn test_wrapped_scope_is_counted() {
        let hits = Arc::new(FileServerHits::default());
        let app = atest::init_service(
            App::new()
                .service(
                    web::scope("/app")
                        .wrap(CountHits::new(hits.clone()))
                        .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
                )
                .route("/other", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        for _ in 0..3 {
            atest::call_service(&app, atest::TestRequest::get().uri("/app/").to_request()).await;
        }
        atest::call_service(&app, atest::TestRequest::get().uri("/other").to_request()).await;

        assert_eq!(hits.get(), 3);
    }
}

use colored::Colorize;
use env_logger::Builder;
use log::{info, Level};
use std::io::Write;
use std::future::{ready, Ready};
use actix_web::{
   dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
   Error,
};
use futures_util::future::LocalBoxFuture;

pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
   S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
   S::Future: 'static,
   B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type InitError = ();
   type Transform = LoggerMiddlewareService<S>;
   type Future = Ready<Result<Self::Transform, Self::InitError>>;

   fn new_transform(&self, service: S) -> Self::Future {
      ready(Ok(LoggerMiddlewareService { service }))
   }
}

pub struct LoggerMiddlewareService<S> {
   service: S
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

   forward_ready!(service);

   fn call(&self, req: ServiceRequest) -> Self::Future {
      let method = req.method().clone();
      let path = req.path().to_string();
      info!("server request: {} {}", method, path);
      let fut = self.service.call(req);

      Box::pin(async move {
         let res = fut.await?;
         info!("server response: {} {} -> {}", method, path, res.status());
         Ok(res)
      })
   }
}

fn paint(level: Level, text: String) -> colored::ColoredString {
   match level {
      Level::Error => text.red().bold(),
      Level::Warn => text.yellow().bold(),
      Level::Info => text.green().bold(),
      Level::Debug => text.blue().bold(),
      Level::Trace => text.magenta().bold(),
   }
}

/// Honours `RUST_LOG`; defaults to `info`.
pub fn init_logger() {
   Builder::new()
   .filter_level(log::LevelFilter::Info)
   .parse_default_env()
   .format(|buf, record| {
      let level = record.level();
      writeln!(buf, "{}", paint(level, format!("{} - {}", level, record.args())))
   })
   .init()
}

#[cfg(test)]
mod tests {
   use super::*;
   use actix_web::{test, web, App, HttpResponse};

   #[actix_rt::test]
   async fn passes_requests_through() {
      let app = test::init_service(
         App::new()
            .wrap(LoggerMiddleware)
            .route("/ping", web::get().to(|| async { HttpResponse::Ok().body("pong") })),
      )
      .await;

      let res = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
      assert!(res.status().is_success());
      assert_eq!(test::read_body(res).await, web::Bytes::from_static(b"pong"));
   }
}

use crate::area;
use crate::db;
use crate::error;
use crate::spatial::covering::CoveringConfig;
use crate::spatial::index::SpatialIndex;
use crate::Result;
use actix_web::dev::Service;
use actix_web::middleware::{Compress, NormalizePath};
use actix_web::web::{scope, Data, QueryConfig};
use actix_web::{App, HttpServer};
use futures_util::future::FutureExt;
use std::env;
use time::OffsetDateTime;
use tracing::info;

pub async fn run() -> Result<()> {
    // All the worker threads are sharing a single connection pool
    let pool = db::pool()?;
    let index = SpatialIndex::new(CoveringConfig::default());

    let address = env::var("ADDRESS").unwrap_or_else(|_| "127.0.0.1:8081".into());
    info!(%address, "Starting the server");

    HttpServer::new(move || {
        App::new()
            .wrap_fn(|req, srv| {
                let req_method = req.method().as_str().to_string();
                let req_path = req.path().to_string();
                let req_time = OffsetDateTime::now_utc();
                srv.call(req).map(move |res| {
                    if let Ok(res) = res.as_ref() {
                        let res_status = res.status().as_u16();
                        let res_time_sec = (OffsetDateTime::now_utc() - req_time).as_seconds_f64();
                        if res_time_sec > 5.0 {
                            info!(req_method, req_path, res_status, res_time_sec);
                        }
                    }
                    res
                })
            })
            .wrap(NormalizePath::trim())
            .wrap(Compress::default())
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(index.clone()))
            .app_data(QueryConfig::default().error_handler(error::query_error_handler))
            .service(
                scope("upload")
                    .service(area::controller::post_districts)
                    .service(area::controller::post_airports),
            )
            .service(
                scope("api")
                    .service(area::controller::get_districts)
                    .service(area::controller::get_airports)
                    .service(area::controller::delete_by_id),
            )
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}

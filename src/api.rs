use actix_web::dev::HttpResponseBuilder;
use actix_web::http::Method;
use actix_web::middleware::{Compress, Logger};
use actix_web::{web, App, HttpResponse, HttpServer};

use crate::auth::Submitter;
use crate::dto::{AddDocument, AddRequest, SearchParams, SearchResults};
use crate::AppState;

// Connection-accept threads; blocking engine calls run on the separate
// web::block pool so a slow backend call never stalls the accept path.
const WORKER_IO_THREADS: usize = 2;

const JSON_BODY_LIMIT: usize = 1024 * 1024;

const SEARCH_METHODS: &str = "GET, OPTIONS";

pub async fn run_server(state: AppState) -> crate::Result<()> {
    let state = web::Data::new(state);

    HttpServer::new({
        let state = state.clone();
        move || {
            let root_path = state.config.root_path.clone();
            App::new()
                .wrap(Logger::default())
                .wrap(Compress::default())
                .app_data(state.clone())
                .app_data(json_config())
                .app_data(query_config())
                .configure(|conf| config_routes(conf, &root_path))
        }
    })
    .workers(WORKER_IO_THREADS)
    .bind(state.config.bind_address)?
    .run()
    .await
    .map_err(From::from)
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| crate::error::value_parsing_err(err).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| crate::error::value_parsing_err(err).into())
}

fn config_routes(conf: &mut web::ServiceConfig, root_path: &str) {
    let root = root_path.trim_matches('/');
    let path = |suffix: &str| {
        if root.is_empty() {
            suffix.to_string()
        } else {
            format!("/{}{}", root, suffix)
        }
    };
    conf.service(web::resource(path("/status")).route(web::get().to(status)))
        .service(
            web::resource(path("/search"))
                .route(web::get().to(search))
                .route(web::method(Method::OPTIONS).to(search_preflight)),
        )
        .service(web::resource(path("/index/add")).route(web::post().to(add)))
        .service(web::resource(path("/index/addBatch")).route(web::post().to(add_batch)));
}

/// CORS headers go on every response of the search family, error responses
/// included. The configured origin is emitted verbatim.
fn with_cors<'a>(
    builder: &'a mut HttpResponseBuilder,
    state: &AppState,
) -> &'a mut HttpResponseBuilder {
    builder
        .header("Access-Control-Allow-Origin", state.cors_origin.clone())
        .header("Access-Control-Allow-Methods", SEARCH_METHODS)
}

async fn status() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

async fn search(state: web::Data<AppState>, query: web::Query<SearchParams>) -> HttpResponse {
    let SearchParams { q, offset, limit } = query.into_inner();
    if limit == 0 {
        log::debug!("Rejected search with a zero limit");
        return with_cors(&mut HttpResponse::BadRequest(), &state).finish();
    }

    log::info!("Searching for query {}", q);
    let engine = state.engine.clone();
    let found = web::block(move || engine.search(&q, offset, limit)).await;

    match found {
        Ok(hits) => with_cors(&mut HttpResponse::Ok(), &state)
            .json(SearchResults::from_hits(hits, offset, limit)),
        Err(err) => {
            log::error!("Search failure: {}", crate::error::from_blocking(err));
            with_cors(&mut HttpResponse::InternalServerError(), &state).finish()
        }
    }
}

async fn search_preflight(state: web::Data<AppState>) -> HttpResponse {
    with_cors(&mut HttpResponse::Ok(), &state).finish()
}

async fn add(
    state: web::Data<AppState>,
    _submitter: Submitter,
    web::Json(doc): web::Json<AddDocument>,
) -> crate::Result<HttpResponse> {
    log::info!("Adding document '{}' to the index", doc.id);
    let doc = doc.into_document()?;

    let engine = state.engine.clone();
    let indexed = web::block(move || engine.add_document(&doc))
        .await
        .map_err(crate::error::from_blocking)?;
    Ok(HttpResponse::Ok().json(indexed))
}

async fn add_batch(
    state: web::Data<AppState>,
    _submitter: Submitter,
    web::Json(req): web::Json<AddRequest>,
) -> crate::Result<HttpResponse> {
    log::info!("Adding a batch of {} documents to the index", req.docs.len());
    let docs = req
        .docs
        .into_iter()
        .map(AddDocument::into_document)
        .collect::<crate::Result<Vec<_>>>()?;

    let engine = state.engine.clone();
    let indexed = web::block(move || Ok::<_, crate::Error>(engine.add_batch(&docs)))
        .await
        .map_err(crate::error::from_blocking)?;
    Ok(HttpResponse::Ok().json(indexed))
}

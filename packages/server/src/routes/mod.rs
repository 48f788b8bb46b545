use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{images, system};
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(system::service_info))
        .routes(routes!(system::health))
        .merge(image_routes(config))
}

fn image_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(images::upload_image))
        .layer(images::upload_body_limit(config.storage.max_upload_size));

    OpenApiRouter::new()
        .routes(routes!(images::list_images))
        .routes(routes!(images::get_image, images::delete_image))
        .routes(routes!(images::download_image))
        .routes(routes!(images::download_thumbnail))
        .merge(upload)
}

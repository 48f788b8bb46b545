use axum::Json;
use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::ImageFilter;
use common::storage::BlobReader;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::{AppMultipart, AppQuery};
use crate::models::image::{DeleteResponse, ImageListQuery, ImageResponse};
use crate::service::{NewImage, UploadedFile};
use crate::state::AppState;

/// Multipart overhead allowed on top of the file size limit.
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD);
    DefaultBodyLimit::max(limit)
}

#[utoipa::path(
    post,
    path = "/images/upload",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Stores an image with its metadata. The `file` part must declare an `image/*` \
        content type and `uploader` is required. `tags` is an optional comma-separated list and \
        `description` an optional free text. Thumbnail generation starts in the background.",
    request_body(content_type = "multipart/form-data", description = "Image file with metadata fields"),
    responses(
        (status = 201, description = "Image stored", body = ImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage failure (UPLOAD_FAILED, METADATA_WRITE_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<(StatusCode, Json<ImageResponse>), AppError> {
    let image = read_upload_form(multipart, state.config.storage.max_upload_size).await?;
    let record = state.gallery.upload(image).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/images",
    tag = "Images",
    operation_id = "listImages",
    summary = "List images",
    description = "Returns images newest first. Filters combine with AND; `tags` matches images \
        carrying any of the given tags. Date bounds are inclusive.",
    params(ImageListQuery),
    responses(
        (status = 200, description = "Matching images", body = Vec<ImageResponse>),
        (status = 400, description = "Malformed query or date (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_images(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ImageListQuery>,
) -> Result<Json<Vec<ImageResponse>>, AppError> {
    let filter = ImageFilter::parse(
        query.date_from.as_deref(),
        query.date_to.as_deref(),
        query.uploader.as_deref(),
        query.tags.as_deref(),
    )
    .map_err(|e| AppError::Validation(e.to_string()))?;

    let records = state.gallery.list(&filter).await?;
    Ok(Json(records.into_iter().map(ImageResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/images/{id}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Get image metadata",
    params(("id" = String, Path, description = "Image ID (UUID)")),
    responses(
        (status = 200, description = "Image metadata", body = ImageResponse),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageResponse>, AppError> {
    let record = state.gallery.get(parse_image_id(&id)?).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    get,
    path = "/images/{id}/file",
    tag = "Images",
    operation_id = "downloadImage",
    summary = "Download image content",
    description = "Streams the original bytes inline with the declared content type. Supports \
        ETag-based caching via If-None-Match.",
    params(("id" = String, Path, description = "Image ID (UUID)")),
    responses(
        (status = 200, description = "Image content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Content unavailable (DOWNLOAD_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn download_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let record = state.gallery.get(parse_image_id(&id)?).await?;

    // Open first so a missing blob is reported even to conditional requests.
    let blob = state.gallery.open_file(&record).await?;
    let etag = format!("\"{}\"", record.id);
    if etag_matches(&headers, &etag) {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }
    blob_response(blob, &record.file_type, &record.filename, &etag)
}

#[utoipa::path(
    get,
    path = "/images/{id}/thumbnail",
    tag = "Images",
    operation_id = "downloadThumbnail",
    summary = "Download image thumbnail",
    description = "Streams the generated thumbnail. Images that have not been processed yet \
        have no thumbnail.",
    params(("id" = String, Path, description = "Image ID (UUID)")),
    responses(
        (status = 200, description = "Thumbnail content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "Image or thumbnail not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Thumbnail unavailable (DOWNLOAD_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn download_thumbnail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let record = state.gallery.get(parse_image_id(&id)?).await?;
    if record.thumbnail_key.is_none() {
        return Err(AppError::NotFound("Thumbnail not found".into()));
    }

    let blob = state.gallery.open_thumbnail(&record).await?;
    let etag = format!("\"{}-thumbnail\"", record.id);
    if etag_matches(&headers, &etag) {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let content_type = if blob.content_type.is_empty() {
        mime_guess::from_path(&record.filename)
            .first_or_octet_stream()
            .to_string()
    } else {
        blob.content_type.clone()
    };
    blob_response(blob, &content_type, &record.filename, &etag)
}

#[utoipa::path(
    delete,
    path = "/images/{id}",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Delete an image",
    description = "Removes the image content, its thumbnail and its metadata.",
    params(("id" = String, Path, description = "Image ID (UUID)")),
    responses(
        (status = 200, description = "Image deleted", body = DeleteResponse),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Metadata delete failed (DELETE_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_image_id(&id)?;
    state.gallery.delete(id).await?;
    Ok(Json(DeleteResponse {
        message: "Image deleted successfully".into(),
        id,
    }))
}

/// Ids that are not UUIDs cannot name an image.
fn parse_image_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Image not found".into()))
}

fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.split(',').any(|tag| {
                let tag = tag.trim();
                tag == "*" || tag == etag
            })
        })
}

fn blob_response(
    blob: BlobReader,
    content_type: &str,
    filename: &str,
    etag: &str,
) -> Result<Response, AppError> {
    let body = Body::from_stream(ReaderStream::new(blob.reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, blob.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(filename),
        )
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Build a safe inline `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "image".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

/// Collect the upload form. Unknown fields are skipped; validation is left to
/// the gallery service.
async fn read_upload_form(mut multipart: Multipart, max_size: u64) -> Result<NewImage, AppError> {
    let mut image = NewImage::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => image.file = Some(read_file_field(field, max_size).await?),
            Some("uploader") => image.uploader = Some(read_text_field(field).await?),
            Some("tags") => image.tags = Some(read_text_field(field).await?),
            Some("description") => image.description = Some(read_text_field(field).await?),
            _ => {}
        }
    }

    Ok(image)
}

/// Buffer a file part, refusing anything past `max_size` bytes.
async fn read_file_field(mut field: Field<'_>, max_size: u64) -> Result<UploadedFile, AppError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);

    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (data.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        filename,
        content_type,
        data,
    })
}

async fn read_text_field(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

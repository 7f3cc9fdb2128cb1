use super::response::ApiError;
use crate::models::{parse_price, parse_quantity, ImagePayload, ProductFields};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;

/// Fields and image payloads of a create/update request.
///
/// Accepts `multipart/form-data` (text fields plus one file part per image,
/// kept in submission order) or a JSON body carrying just the fields.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub fields: ProductFields,
    pub images: Vec<ImagePayload>,
}

impl<S> FromRequest<S> for ProductForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/json") {
            let Json(fields) = Json::<ProductFields>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(Self {
                fields,
                images: Vec::new(),
            })
        } else {
            Ok(Self::default())
        }
    }
}

impl ProductForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                // Browsers submit an empty part for an untouched file input.
                if data.is_empty() {
                    continue;
                }
                form.images.push(ImagePayload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            match name.as_str() {
                "name" => form.fields.name = Some(value),
                "description" => form.fields.description = Some(value),
                "price" => form.fields.price = parse_price(&value).map_err(ApiError::BadRequest)?,
                "quantity" => {
                    form.fields.quantity = parse_quantity(&value).map_err(ApiError::BadRequest)?
                }
                other => tracing::debug!("Ignoring unknown form field {}", other),
            }
        }

        Ok(form)
    }
}

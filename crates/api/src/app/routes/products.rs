use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::FormRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};

use stockroom_catalog::{ProductForm, SaleForm};
use stockroom_core::{DomainError, FieldErrors, ProductId};
use stockroom_infra::{CatalogService, sale_error_message};

use crate::app::errors;
use crate::app::views::{self, FormTarget};

pub fn router() -> Router {
    Router::new()
        .route("/new", get(new_product_form).post(create_product))
        .route("/:id", get(show_product).post(sell_product))
        .route("/:id/edit", get(edit_product_form).post(update_product))
        .route("/:id/delete", post(delete_product))
}

/// Unreadable form bodies get the HTML error page rather than axum's plain-text rejection.
fn read_form<T>(form: Result<Form<T>, FormRejection>) -> Result<T, Response> {
    match form {
        Ok(Form(value)) => Ok(value),
        Err(rejection) => {
            tracing::info!(error = %rejection, "form rejected");
            Err(errors::html_error(
                rejection.status(),
                "Invalid request",
                rejection.body_text(),
            ))
        }
    }
}

/// Only decimal ids route to a product; anything else is a plain 404.
fn parse_id(raw: &str) -> Result<ProductId, Response> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(errors::not_found());
    }
    raw.parse().map_err(|_| errors::not_found())
}

pub async fn list_products(Extension(service): Extension<Arc<CatalogService>>) -> Response {
    match service.list_products().await {
        Ok(products) => Html(views::products_list(&products)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn new_product_form() -> Response {
    Html(views::product_form(
        FormTarget::New,
        &ProductForm::default(),
        &FieldErrors::new(),
    ))
    .into_response()
}

pub async fn create_product(
    Extension(service): Extension<Arc<CatalogService>>,
    form: Result<Form<ProductForm>, FormRejection>,
) -> Response {
    let form = match read_form(form) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match service.create_product(&form).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(DomainError::Validation(field_errors)) => {
            render_form(FormTarget::New, &form, &field_errors)
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn show_product(
    Extension(service): Extension<Arc<CatalogService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match service.product_page(id).await {
        Ok(page) => Html(views::product_page(&page, "", None)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn sell_product(
    Extension(service): Extension<Arc<CatalogService>>,
    Path(id): Path<String>,
    form: Result<Form<SaleForm>, FormRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let form = match read_form(form) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let err = match service.sell(id, &form).await {
        Ok(_) => return Redirect::to("/").into_response(),
        Err(e) => e,
    };

    let Some(message) = sale_error_message(&err) else {
        return errors::domain_error_to_response(err);
    };

    tracing::info!(product_id = %id, %message, "sale rejected");

    // Re-render the product page with the message next to the sell field.
    match service.product_page(id).await {
        Ok(page) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(views::product_page(&page, &form.quantity, Some(&message))),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn edit_product_form(
    Extension(service): Extension<Arc<CatalogService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match service.get_product(id).await {
        Ok(product) => {
            let form = ProductForm::from_draft(&product.to_draft());
            Html(views::product_form(FormTarget::Edit(id), &form, &FieldErrors::new()))
                .into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(service): Extension<Arc<CatalogService>>,
    Path(id): Path<String>,
    form: Result<Form<ProductForm>, FormRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let form = match read_form(form) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match service.edit_product(id, &form).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(DomainError::Validation(field_errors)) => {
            render_form(FormTarget::Edit(id), &form, &field_errors)
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(service): Extension<Arc<CatalogService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match service.delete_product(id).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn render_form(target: FormTarget, form: &ProductForm, field_errors: &FieldErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Html(views::product_form(target, form, field_errors)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_decimal_ids_parse() {
        assert_eq!(parse_id("17").ok(), Some(ProductId::new(17)));
        assert!(parse_id("").is_err());
        assert!(parse_id("-1").is_err());
        assert!(parse_id("1e3").is_err());
        assert!(parse_id("99999999999999999999").is_err());
    }
}

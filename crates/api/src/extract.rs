//! Request extractors whose rejections render as [`AppError`].
//!
//! axum's own `Json` and `Query` reject with plain-text bodies. These
//! wrappers route the same failures through `AppError` so a malformed body
//! or query string gets the usual `{error, code}` JSON.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body. Use in place of `axum::Json` in handler arguments.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string. Use in place of `axum::extract::Query`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

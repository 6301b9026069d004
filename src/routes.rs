use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::handler::Handler;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use crate::err::{self, Error};
use crate::models::{Student, StudentPayload};
use crate::store::SharedDirectory;
use crate::{breaks, proceeds, Payload};

pub fn router(directory: SharedDirectory) -> Router {
    Router::new()
        .route("/students", post(add_student))
        .route(
            "/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .fallback(err::handler404.into_service())
        .layer(Extension(directory))
}

pub async fn add_student(
    Extension(directory): Extension<SharedDirectory>,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> Payload<Student> {
    let Json(payload) = payload?;
    match directory.add_student(payload).await? {
        Some(student) => proceeds(student),
        None => breaks(Error::CreationFailed {
            message: "No student ids left to allocate".to_string(),
        }),
    }
}

pub async fn get_student(
    id: Result<Path<u64>, PathRejection>,
    Extension(directory): Extension<SharedDirectory>,
) -> Payload<Student> {
    let Path(id) = id?;
    proceeds(directory.get_student(id).await?)
}

pub async fn update_student(
    id: Result<Path<u64>, PathRejection>,
    Extension(directory): Extension<SharedDirectory>,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> Payload<Student> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    proceeds(directory.update_student(id, payload).await?)
}

pub async fn delete_student(
    id: Result<Path<u64>, PathRejection>,
    Extension(directory): Extension<SharedDirectory>,
) -> Payload<Student> {
    let Path(id) = id?;
    proceeds(directory.delete_student(id).await?)
}

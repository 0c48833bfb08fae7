//! # hb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.
//! Every write validates first, so a rejected request never touches the store.

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use askama::Template;
use hb_core::error::AppError;
use hb_core::models::{NewReply, NewThread};
use hb_core::traits::{ForumRepo, IdentityProvider};
use hb_core::validate;
use hb_ui::{HouseTemplate, IndexTemplate, NewHouseTemplate, NewThreadTemplate, ThreadTemplate};
use serde::Deserialize;

use crate::error::ApiError;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Box<dyn ForumRepo>,
    pub identity: Box<dyn IdentityProvider>,
}

type HandlerResult = Result<HttpResponse, ApiError>;

/// Missing fields deserialize as empty strings so they fail validation
/// (400 with a message) instead of form extraction.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HouseForm {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ThreadForm {
    pub title: String,
    pub nickname: String,
    /// Optional; omitted means the empty secret.
    pub tripcode: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplyForm {
    pub nickname: String,
    pub tripcode: String,
    pub content: String,
}

fn render(page: impl Template) -> HandlerResult {
    let html = page.render()?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// GET / — every house, newest first.
pub async fn index(data: web::Data<AppState>) -> HandlerResult {
    let houses = data.repo.list_houses().await?;
    render(IndexTemplate { houses: &houses })
}

/// GET /house/new
pub async fn new_house_form() -> HandlerResult {
    render(NewHouseTemplate)
}

/// POST /house/new
pub async fn create_house(data: web::Data<AppState>, form: web::Form<HouseForm>) -> HandlerResult {
    let name = validate::house_name(&form.name)?;
    let house = data.repo.create_house(&name).await?;
    log::info!("house {} created: {:?}", house.id, house.name);
    Ok(see_other("/".to_string()))
}

/// GET /house/{house_id}
pub async fn view_house(data: web::Data<AppState>, path: web::Path<i64>) -> HandlerResult {
    let house_id = path.into_inner();
    let house = data
        .repo
        .get_house(house_id)
        .await?
        .ok_or(AppError::NotFound("House", house_id))?;
    let threads = data.repo.list_threads(house.id).await?;

    render(HouseTemplate { house: &house, threads: &threads })
}

/// GET /house/{house_id}/thread/new — renders the form, writes nothing.
pub async fn new_thread_form(data: web::Data<AppState>, path: web::Path<i64>) -> HandlerResult {
    let house_id = path.into_inner();
    let house = data
        .repo
        .get_house(house_id)
        .await?
        .ok_or(AppError::NotFound("House", house_id))?;

    render(NewThreadTemplate { house: &house })
}

/// POST /house/{house_id}/thread/new
///
/// Creates the thread and its opening post in one store transaction.
pub async fn create_thread(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<ThreadForm>,
) -> HandlerResult {
    let house_id = path.into_inner();
    if data.repo.get_house(house_id).await?.is_none() {
        return Err(AppError::NotFound("House", house_id).into());
    }

    let form = form.into_inner();
    let thread = NewThread {
        house_id,
        title: validate::title(&form.title)?,
        nickname: validate::nickname(&form.nickname)?,
        content: validate::content(&form.content)?,
        tripcode_hash: data.identity.hash_tripcode(&form.tripcode),
    };

    let thread_id = data.repo.create_thread(thread).await?;
    log::info!("thread {thread_id} created in house {house_id}");
    Ok(see_other(format!("/thread/{thread_id}")))
}

/// GET /thread/{thread_id} — the thread, its opening post and replies oldest first.
pub async fn view_thread(data: web::Data<AppState>, path: web::Path<i64>) -> HandlerResult {
    let thread_id = path.into_inner();
    let detail = data
        .repo
        .get_thread(thread_id)
        .await?
        .ok_or(AppError::NotFound("Thread", thread_id))?;

    render(ThreadTemplate { detail: &detail })
}

/// POST /post/{post_id}/reply — redirects to the thread owning the post.
pub async fn create_reply(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<ReplyForm>,
) -> HandlerResult {
    let post_id = path.into_inner();
    let form = form.into_inner();
    let reply = NewReply {
        post_id,
        nickname: validate::nickname(&form.nickname)?,
        content: validate::content(&form.content)?,
        tripcode_hash: data.identity.hash_tripcode(&form.tripcode),
    };

    let thread_id = data.repo.create_reply(reply).await?;
    log::info!("reply to post {post_id} added to thread {thread_id}");
    Ok(see_other(format!("/thread/{thread_id}")))
}

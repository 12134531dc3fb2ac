use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::{ContactData, ContactFilter};
use crate::AppState;
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

pub async fn create(
    user: CurrentUser,
    req: web::Json<ContactData>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let contact = state.contacts_service.create(user.id, &req).await?;
    info!("Contact {} created for user {}", contact.id, user.id);
    Ok(HttpResponse::Created().json(contact))
}

pub async fn list(
    user: CurrentUser,
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let filter = ContactFilter {
        first_name: query.first_name.clone(),
        last_name: query.last_name.clone(),
        email: query.email.clone(),
    };
    let page = state
        .contacts_service
        .list(user.id, &filter, query.skip, query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get(
    user: CurrentUser,
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let contact = state.contacts_service.get(user.id, *id).await?;
    Ok(HttpResponse::Ok().json(contact))
}

pub async fn update(
    user: CurrentUser,
    id: web::Path<Uuid>,
    req: web::Json<ContactData>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let contact = state.contacts_service.update(user.id, *id, &req).await?;
    Ok(HttpResponse::Ok().json(contact))
}

pub async fn delete(
    user: CurrentUser,
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.contacts_service.delete(user.id, *id).await?;
    info!("Contact {} deleted for user {}", id, user.id);
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

pub async fn search(
    user: CurrentUser,
    query: web::Query<SearchQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let contacts = state.contacts_service.search(user.id, &query.q).await?;
    Ok(HttpResponse::Ok().json(contacts))
}

#[derive(Debug, Deserialize)]
pub struct BirthdaysQuery {
    pub days: Option<i64>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn upcoming_birthdays(
    user: CurrentUser,
    query: web::Query<BirthdaysQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let page = state
        .contacts_service
        .upcoming_birthdays(user.id, query.days, query.skip, query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

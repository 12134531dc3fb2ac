use uuid::Uuid;

use crate::db::{
    BirthdayWindow, Contact, ContactData, ContactFilter, ContactPage, ContactRepository, Page,
};
use crate::error::AppError;
use crate::validate;
use crate::Result;

const DEFAULT_PAGE_LIMIT: i64 = 100;
const MAX_PAGE_LIMIT: i64 = 500;
const DEFAULT_BIRTHDAY_WINDOW_DAYS: i64 = 7;
const MAX_BIRTHDAY_WINDOW_DAYS: i64 = 31;

/// Business rules for contact CRUD, search and birthday queries. Every
/// operation is scoped to the authenticated owner; a contact belonging to
/// someone else is indistinguishable from one that does not exist.
pub struct ContactsService {
    repo: ContactRepository,
}

impl ContactsService {
    pub fn new(repo: ContactRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, owner: Uuid, data: &ContactData) -> Result<Contact> {
        validate_contact(data)?;
        self.repo.create(owner, data).await
    }

    pub async fn list(
        &self,
        owner: Uuid,
        filter: &ContactFilter,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<ContactPage> {
        let page = normalize_page(skip, limit)?;
        self.repo.list(owner, filter, page).await
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<Contact> {
        self.repo
            .get(owner, id)
            .await?
            .ok_or(AppError::NotFound("contact"))
    }

    pub async fn update(&self, owner: Uuid, id: Uuid, data: &ContactData) -> Result<Contact> {
        validate_contact(data)?;
        self.repo
            .update(owner, id, data)
            .await?
            .ok_or(AppError::NotFound("contact"))
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<()> {
        if !self.repo.delete(owner, id).await? {
            return Err(AppError::NotFound("contact"));
        }
        Ok(())
    }

    pub async fn search(&self, owner: Uuid, query: &str) -> Result<Vec<Contact>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation(
                "search query must not be empty".to_string(),
            ));
        }
        self.repo.search(owner, query).await
    }

    pub async fn upcoming_birthdays(
        &self,
        owner: Uuid,
        days: Option<i64>,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<ContactPage> {
        let days = days.unwrap_or(DEFAULT_BIRTHDAY_WINDOW_DAYS);
        if !(1..=MAX_BIRTHDAY_WINDOW_DAYS).contains(&days) {
            return Err(AppError::Validation(format!(
                "days must be between 1 and {}",
                MAX_BIRTHDAY_WINDOW_DAYS
            )));
        }
        let page = normalize_page(skip, limit)?;
        let window = BirthdayWindow::starting_today(days);
        self.repo.upcoming_birthdays(owner, window, page).await
    }
}

fn normalize_page(skip: Option<i64>, limit: Option<i64>) -> Result<Page> {
    let skip = skip.unwrap_or(0);
    if skip < 0 {
        return Err(AppError::Validation("skip must not be negative".to_string()));
    }
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(Page { skip, limit })
}

fn validate_contact(data: &ContactData) -> Result<()> {
    validate::required("first_name", &data.first_name, 100)?;
    validate::required("last_name", &data.last_name, 100)?;
    validate::email(&data.email)?;
    validate::required("phone", &data.phone, 30)?;
    if let Some(notes) = &data.notes {
        if notes.len() > 2000 {
            return Err(AppError::Validation(
                "notes must be at most 2000 characters".to_string(),
            ));
        }
    }
    Ok(())
}

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::db::models::{Contact, ContactData, ContactFilter, ContactPage, Page};
use crate::error::AppError;
use crate::Result;

const CONTACT_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, birthday, \
                               notes, created_at, updated_at";

/// A calendar window for birthday matching. Comparison is by month and day
/// only, so a window that crosses Dec 31 still matches January birthdays.
#[derive(Debug, Clone, Copy)]
pub struct BirthdayWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl BirthdayWindow {
    pub fn new(today: NaiveDate, days: i64) -> Self {
        Self {
            start: today,
            end: today + Duration::days(days),
        }
    }

    pub fn starting_today(days: i64) -> Self {
        Self::new(Utc::now().date_naive(), days)
    }

    fn same_month(&self) -> bool {
        self.start.year() == self.end.year() && self.start.month() == self.end.month()
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<Postgres>) {
        qb.push(" AND birthday IS NOT NULL");
        if self.same_month() {
            qb.push(" AND EXTRACT(MONTH FROM birthday) = ");
            qb.push_bind(self.start.month() as i32);
            qb.push(" AND EXTRACT(DAY FROM birthday) >= ");
            qb.push_bind(self.start.day() as i32);
            qb.push(" AND EXTRACT(DAY FROM birthday) <= ");
            qb.push_bind(self.end.day() as i32);
        } else {
            // Covers both a plain month boundary and the Dec -> Jan wrap: the
            // start tail, the end head, and any whole months in between.
            qb.push(" AND ((EXTRACT(MONTH FROM birthday) = ");
            qb.push_bind(self.start.month() as i32);
            qb.push(" AND EXTRACT(DAY FROM birthday) >= ");
            qb.push_bind(self.start.day() as i32);
            qb.push(") OR (EXTRACT(MONTH FROM birthday) = ");
            qb.push_bind(self.end.month() as i32);
            qb.push(" AND EXTRACT(DAY FROM birthday) <= ");
            qb.push_bind(self.end.day() as i32);
            qb.push(") OR (EXTRACT(MONTH FROM birthday) > ");
            qb.push_bind(self.start.month() as i32);
            qb.push(" AND EXTRACT(MONTH FROM birthday) < ");
            qb.push_bind(self.end.month() as i32);
            qb.push("))");
        }
    }

    /// Mirror of the SQL predicate, used to pin down the window semantics.
    #[cfg(test)]
    fn matches(&self, birthday: NaiveDate) -> bool {
        let (month, day) = (birthday.month(), birthday.day());
        if self.same_month() {
            month == self.start.month() && day >= self.start.day() && day <= self.end.day()
        } else {
            (month == self.start.month() && day >= self.start.day())
                || (month == self.end.month() && day <= self.end.day())
                || (month > self.start.month() && month < self.end.month())
        }
    }
}

/// Owner-scoped CRUD for [`Contact`] rows. Every query carries a
/// `user_id` filter in the SQL itself so one tenant can never see another's
/// rows, whatever the calling code does.
#[derive(Clone)]
pub struct ContactRepository {
    pool: Arc<PgPool>,
}

impl ContactRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>> {
        Ok(self.pool.as_ref().begin().await?)
    }

    pub async fn create(&self, owner: Uuid, data: &ContactData) -> Result<Contact> {
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM contacts WHERE user_id = $1 AND email = $2",
        )
        .bind(owner)
        .bind(&data.email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        if existing.is_some() {
            return Err(AppError::Conflict(
                "contact with this email already exists".to_string(),
            ));
        }

        let mut transaction = self.begin().await?;
        let now = Utc::now();

        let result = sqlx::query_as::<_, Contact>(
            "INSERT INTO contacts (id, user_id, first_name, last_name, email, phone, birthday, \
             notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id, user_id, first_name, last_name, email, phone, birthday, notes, \
             created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(data.birthday)
        .bind(&data.notes)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *transaction)
        .await;

        match result {
            Ok(contact) => {
                transaction.commit().await?;
                Ok(contact)
            }
            Err(e) => {
                transaction.rollback().await?;
                Err(e.into())
            }
        }
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(
            "SELECT id, user_id, first_name, last_name, email, phone, birthday, notes, \
             created_at, updated_at FROM contacts WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(contact)
    }

    pub async fn list(
        &self,
        owner: Uuid,
        filter: &ContactFilter,
        page: Page,
    ) -> Result<ContactPage> {
        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM contacts WHERE user_id = ");
        count_qb.push_bind(owner);
        push_filter_conditions(&mut count_qb, filter);

        let total_count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE user_id = "
        ));
        qb.push_bind(owner);
        push_filter_conditions(&mut qb, filter);
        qb.push(" ORDER BY last_name, first_name");
        qb.push(" OFFSET ");
        qb.push_bind(page.skip);
        qb.push(" LIMIT ");
        qb.push_bind(page.limit);

        let contacts = qb
            .build_query_as::<Contact>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(ContactPage {
            total_count,
            skip: page.skip,
            limit: page.limit,
            contacts,
        })
    }

    /// Replaces the full field set in a single UPDATE so concurrent writers
    /// can never interleave partial field sets.
    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        data: &ContactData,
    ) -> Result<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(
            "UPDATE contacts SET first_name = $1, last_name = $2, email = $3, phone = $4, \
             birthday = $5, notes = $6, updated_at = $7 \
             WHERE id = $8 AND user_id = $9 \
             RETURNING id, user_id, first_name, last_name, email, phone, birthday, notes, \
             created_at, updated_at",
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(data.birthday)
        .bind(&data.notes)
        .bind(Utc::now())
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(contact)
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn search(&self, owner: Uuid, query: &str) -> Result<Vec<Contact>> {
        let pattern = format!("%{}%", query);
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT id, user_id, first_name, last_name, email, phone, birthday, notes, \
             created_at, updated_at FROM contacts \
             WHERE user_id = $1 \
             AND (first_name ILIKE $2 OR last_name ILIKE $2 OR email ILIKE $2) \
             ORDER BY last_name, first_name",
        )
        .bind(owner)
        .bind(&pattern)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(contacts)
    }

    pub async fn upcoming_birthdays(
        &self,
        owner: Uuid,
        window: BirthdayWindow,
        page: Page,
    ) -> Result<ContactPage> {
        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM contacts WHERE user_id = ");
        count_qb.push_bind(owner);
        window.push_conditions(&mut count_qb);

        let total_count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE user_id = "
        ));
        qb.push_bind(owner);
        window.push_conditions(&mut qb);
        qb.push(" ORDER BY EXTRACT(MONTH FROM birthday), EXTRACT(DAY FROM birthday)");
        qb.push(" OFFSET ");
        qb.push_bind(page.skip);
        qb.push(" LIMIT ");
        qb.push_bind(page.limit);

        let contacts = qb
            .build_query_as::<Contact>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(ContactPage {
            total_count,
            skip: page.skip,
            limit: page.limit,
            contacts,
        })
    }
}

fn push_filter_conditions(qb: &mut QueryBuilder<Postgres>, filter: &ContactFilter) {
    if let Some(first_name) = &filter.first_name {
        qb.push(" AND first_name ILIKE ");
        qb.push_bind(format!("%{}%", first_name));
    }
    if let Some(last_name) = &filter.last_name {
        qb.push(" AND last_name ILIKE ");
        qb.push_bind(format!("%{}%", last_name));
    }
    if let Some(email) = &filter.email {
        qb.push(" AND email ILIKE ");
        qb.push_bind(format!("%{}%", email));
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error, info};

use crate::model::holiday::{DEFAULT_HOLIDAY_COLOR, HolidayEntry, NewHoliday};
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest};
use crate::model::member::{
    DEFAULT_ANNUAL_ENTITLEMENT, DEFAULT_SICK_ENTITLEMENT, Location, Member, NewMember,
    normalize_email,
};

use super::{LeaveStore, MemberFilter, RequestFilter, StoreError};

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPool::connect(database_url).await
}

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS team_members (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(100) NOT NULL UNIQUE,
        stream VARCHAR(50) NOT NULL,
        location VARCHAR(20) NOT NULL,
        role VARCHAR(20) NOT NULL DEFAULT 'member',
        annual_entitlement INT UNSIGNED NOT NULL DEFAULT 22,
        sick_entitlement INT UNSIGNED NOT NULL DEFAULT 10,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS holidays (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        date DATE NOT NULL,
        location VARCHAR(20) NOT NULL,
        color VARCHAR(7) NOT NULL DEFAULT '#4CAF50',
        UNIQUE KEY holidays_date_location (date, location)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leave_requests (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        member_id BIGINT UNSIGNED NOT NULL,
        leave_type VARCHAR(20) NOT NULL,
        day_type VARCHAR(20) NOT NULL DEFAULT 'Full Day',
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        working_days DOUBLE NOT NULL,
        status VARCHAR(20) NOT NULL DEFAULT 'Pending',
        reason TEXT NOT NULL,
        rejection_reason TEXT NULL,
        override_used BOOLEAN NOT NULL DEFAULT FALSE,
        override_reason TEXT NULL,
        approved_by BIGINT UNSIGNED NULL,
        submitted_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        approved_at TIMESTAMP NULL,
        KEY leave_requests_member_status (member_id, status),
        CONSTRAINT fk_leave_member FOREIGN KEY (member_id) REFERENCES team_members (id),
        CONSTRAINT fk_leave_approver FOREIGN KEY (approved_by) REFERENCES team_members (id)
    )
    "#,
];

const REQUEST_COLUMNS: &str = "r.id, r.member_id, r.leave_type, r.day_type, r.start_date, \
    r.end_date, r.working_days, r.status, r.reason, r.rejection_reason, r.override_used, \
    r.override_reason, r.approved_by, r.submitted_at, r.approved_at";

const MEMBER_COLUMNS: &str = "id, name, email, stream, location, role, annual_entitlement, \
    sick_entitlement, is_active";

#[derive(FromRow)]
struct MemberRow {
    id: u64,
    name: String,
    email: String,
    stream: String,
    location: String,
    role: String,
    annual_entitlement: u32,
    sick_entitlement: u32,
    is_active: bool,
}

impl TryFrom<MemberRow> for Member {
    type Error = StoreError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Member {
            id: row.id,
            name: row.name,
            email: row.email,
            stream: row.stream,
            location: row.location.parse()?,
            role: row.role.parse()?,
            annual_entitlement: row.annual_entitlement,
            sick_entitlement: row.sick_entitlement,
            is_active: row.is_active,
        })
    }
}

#[derive(FromRow)]
struct HolidayRow {
    id: u64,
    name: String,
    date: NaiveDate,
    location: String,
    color: String,
}

impl TryFrom<HolidayRow> for HolidayEntry {
    type Error = StoreError;

    fn try_from(row: HolidayRow) -> Result<Self, Self::Error> {
        Ok(HolidayEntry {
            id: row.id,
            name: row.name,
            date: row.date,
            location: row.location.parse()?,
            color: row.color,
        })
    }
}

#[derive(FromRow)]
struct LeaveRequestRow {
    id: u64,
    member_id: u64,
    leave_type: String,
    day_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    working_days: f64,
    status: String,
    reason: String,
    rejection_reason: Option<String>,
    override_used: bool,
    override_reason: Option<String>,
    approved_by: Option<u64>,
    submitted_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        Ok(LeaveRequest {
            id: row.id,
            member_id: row.member_id,
            leave_type: row.leave_type.parse()?,
            day_type: row.day_type.parse()?,
            start_date: row.start_date,
            end_date: row.end_date,
            working_days: row.working_days,
            status: row.status.parse()?,
            reason: row.reason,
            rejection_reason: row.rejection_reason,
            override_used: row.override_used,
            override_reason: row.override_reason,
            approved_by: row.approved_by,
            submitted_at: row.submitted_at,
            approved_at: row.approved_at,
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

fn request_where(filter: &RequestFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(member_id) = filter.member_id {
        where_sql.push_str(" AND r.member_id = ?");
        args.push(FilterValue::U64(member_id));
    }
    if let Some(stream) = &filter.stream {
        where_sql.push_str(" AND m.stream = ?");
        args.push(FilterValue::Str(stream.clone()));
    }
    if let Some(status) = filter.status {
        where_sql.push_str(" AND r.status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }
    if let Some(leave_type) = filter.leave_type {
        where_sql.push_str(" AND r.leave_type = ?");
        args.push(FilterValue::Str(leave_type.to_string()));
    }
    if let Some((start, end)) = filter.overlapping {
        where_sql.push_str(" AND r.start_date <= ? AND r.end_date >= ?");
        args.push(FilterValue::Date(end));
        args.push(FilterValue::Date(start));
    }

    (where_sql, args)
}

/// MySQL-backed store. Queries are built at runtime so the crate compiles
/// without a live database.
#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates missing tables. Safe to run on every start.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await.map_err(|e| {
                error!(error = %e, "Failed to apply schema statement");
                StoreError::from(e)
            })?;
        }
        info!("Database schema ready");
        Ok(())
    }
}

impl LeaveStore for MySqlLeaveStore {
    async fn member(&self, id: u64) -> Result<Option<Member>, StoreError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM team_members WHERE id = ?");
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Member::try_from)
            .transpose()
    }

    async fn member_by_email(&self, email: &str) -> Result<Option<Member>, StoreError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM team_members WHERE email = ?");
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Member::try_from)
            .transpose()
    }

    async fn members(&self, filter: &MemberFilter) -> Result<Vec<Member>, StoreError> {
        let mut sql = format!("SELECT {MEMBER_COLUMNS} FROM team_members WHERE 1=1");
        if filter.stream.is_some() {
            sql.push_str(" AND stream = ?");
        }
        if filter.active_only {
            sql.push_str(" AND is_active = TRUE");
        }
        sql.push_str(" ORDER BY stream, name");

        let mut query = sqlx::query_as::<_, MemberRow>(&sql);
        if let Some(stream) = &filter.stream {
            query = query.bind(stream);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Member::try_from)
            .collect()
    }

    async fn insert_member(&self, member: NewMember) -> Result<Member, StoreError> {
        let email = normalize_email(&member.email);
        let result = sqlx::query(
            r#"
            INSERT INTO team_members
                (name, email, stream, location, role, annual_entitlement, sick_entitlement)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&member.name)
        .bind(&email)
        .bind(&member.stream)
        .bind(member.location.to_string())
        .bind(member.role.to_string())
        .bind(member.annual_entitlement.unwrap_or(DEFAULT_ANNUAL_ENTITLEMENT))
        .bind(member.sick_entitlement.unwrap_or(DEFAULT_SICK_ENTITLEMENT))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        debug!(member_id = id, "Member inserted");
        self.member(id)
            .await?
            .ok_or_else(|| StoreError::Database(format!("member {id} missing after insert")))
    }

    async fn holidays_for(&self, location: Location) -> Result<Vec<HolidayEntry>, StoreError> {
        sqlx::query_as::<_, HolidayRow>(
            r#"
            SELECT id, name, date, location, color
            FROM holidays
            WHERE location = ? OR location = 'Both'
            ORDER BY date
            "#,
        )
        .bind(location.to_string())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(HolidayEntry::try_from)
        .collect()
    }

    async fn insert_holiday(&self, holiday: NewHoliday) -> Result<HolidayEntry, StoreError> {
        let color = holiday
            .color
            .unwrap_or_else(|| DEFAULT_HOLIDAY_COLOR.to_string());
        let result = sqlx::query(
            r#"
            INSERT INTO holidays (name, date, location, color)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&holiday.name)
        .bind(holiday.date)
        .bind(holiday.location.to_string())
        .bind(&color)
        .execute(&self.pool)
        .await?;

        Ok(HolidayEntry {
            id: result.last_insert_id(),
            name: holiday.name,
            date: holiday.date,
            location: holiday.location,
            color,
        })
    }

    async fn leave_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests r WHERE r.id = ?");
        sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn leave_requests(&self, filter: &RequestFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        let (where_sql, args) = request_where(filter);
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM leave_requests r
            JOIN team_members m ON m.id = r.member_id
            {where_sql}
            ORDER BY r.submitted_at DESC, r.id DESC
            "#
        );

        let mut query = sqlx::query_as::<_, LeaveRequestRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Str(s) => query.bind(s),
                FilterValue::Date(d) => query.bind(d),
            };
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch leave requests");
                StoreError::from(e)
            })?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }

    async fn insert_leave_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (member_id, leave_type, day_type, start_date, end_date, working_days,
                 status, reason, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, 'Pending', ?, ?)
            "#,
        )
        .bind(request.member_id)
        .bind(request.leave_type.to_string())
        .bind(request.day_type.to_string())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.working_days)
        .bind(&request.reason)
        .bind(request.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, member_id = request.member_id, "Failed to create leave request");
            StoreError::from(e)
        })?;

        Ok(request.into_request(result.last_insert_id()))
    }

    async fn update_leave_request(&self, request: &LeaveRequest) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?,
                rejection_reason = ?,
                override_used = ?,
                override_reason = ?,
                approved_by = ?,
                approved_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.status.to_string())
        .bind(&request.rejection_reason)
        .bind(request.override_used)
        .bind(&request.override_reason)
        .bind(request.approved_by)
        .bind(request.approved_at)
        .bind(request.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, request_id = request.id, "Failed to update leave request");
            StoreError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Database(format!(
                "leave request {} vanished during update",
                request.id
            )));
        }
        Ok(())
    }

    async fn delete_leave_request(&self, id: u64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Employee Repository

use super::{RepoError, RepoResult};
use async_trait::async_trait;
use shared::models::{Employee, EmployeeRecord, Role};
use sqlx::SqlitePool;

/// Narrow read/write contract the directory needs from the relational store.
///
/// Every write is acknowledged before it returns; the store is the system of
/// record.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn insert_employee(&self, employee: &Employee) -> RepoResult<()>;

    async fn update_password(&self, id: i64, password: &str) -> RepoResult<()>;

    /// Role and active flag move together on role transitions
    async fn update_role(&self, id: i64, role: Role, is_active: bool) -> RepoResult<()>;

    async fn update_salary(&self, id: i64, salary: f64) -> RepoResult<()>;

    async fn set_active(&self, id: i64, is_active: bool) -> RepoResult<()>;

    /// All employees, active or not, ordered by id
    async fn load_all_employees(&self) -> RepoResult<Vec<Employee>>;
}

#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: i64,
    national_id: i64,
    name: String,
    surname: String,
    salary: f64,
    username: String,
    password: String,
    role: String,
    is_active: bool,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = RepoError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| RepoError::Validation(format!("Employee {}: {e}", row.id)))?;
        let id = row.id;
        Employee::reconstruct(EmployeeRecord {
            id: row.id,
            national_id: row.national_id,
            name: row.name,
            surname: row.surname,
            salary: row.salary,
            username: row.username,
            password: row.password,
            role,
            is_active: row.is_active,
        })
        .map_err(|e| RepoError::Validation(format!("Employee {id}: {e}")))
    }
}

const EMPLOYEE_SELECT: &str = "SELECT id, national_id, name, surname, salary, username, password, role, is_active FROM employee";

/// SQLite-backed [`EmployeeStore`]
#[derive(Clone)]
pub struct SqliteEmployeeStore {
    pool: SqlitePool,
}

impl SqliteEmployeeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE id = ?");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Employee::try_from).transpose()
    }

    fn expect_one(rows: u64, id: i64) -> RepoResult<()> {
        if rows == 0 {
            return Err(RepoError::NotFound(format!("Employee {id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeStore for SqliteEmployeeStore {
    async fn insert_employee(&self, employee: &Employee) -> RepoResult<()> {
        let now = shared::util::now_millis();
        sqlx::query(
            "INSERT INTO employee (id, national_id, name, surname, salary, username, password, role, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        )
        .bind(employee.id())
        .bind(employee.national_id())
        .bind(employee.name())
        .bind(employee.surname())
        .bind(employee.salary())
        .bind(employee.username())
        .bind(employee.password())
        .bind(employee.role().as_str())
        .bind(employee.is_active())
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_password(&self, id: i64, password: &str) -> RepoResult<()> {
        let now = shared::util::now_millis();
        let rows = sqlx::query("UPDATE employee SET password = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(password)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Self::expect_one(rows.rows_affected(), id)
    }

    async fn update_role(&self, id: i64, role: Role, is_active: bool) -> RepoResult<()> {
        let now = shared::util::now_millis();
        let rows = sqlx::query(
            "UPDATE employee SET role = ?1, is_active = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(role.as_str())
        .bind(is_active)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Self::expect_one(rows.rows_affected(), id)
    }

    async fn update_salary(&self, id: i64, salary: f64) -> RepoResult<()> {
        let now = shared::util::now_millis();
        let rows = sqlx::query("UPDATE employee SET salary = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(salary)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Self::expect_one(rows.rows_affected(), id)
    }

    async fn set_active(&self, id: i64, is_active: bool) -> RepoResult<()> {
        let now = shared::util::now_millis();
        let rows = sqlx::query("UPDATE employee SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(is_active)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Self::expect_one(rows.rows_affected(), id)
    }

    async fn load_all_employees(&self) -> RepoResult<Vec<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} ORDER BY id");
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Employee::try_from).collect()
    }
}

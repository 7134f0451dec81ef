use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::{ensure_exists, ensure_unique, fetch, fetch_all, insert, remove};
use crate::error::NrcError;
use crate::store::{Record, Table, TableStore, filter};
use crate::types::user::{LoginRequest, SignupRequest, UserQuery};
use crate::types::{Role, User, clean, new_id, now, required};

pub async fn signup<S: TableStore>(db: &mut S, req: SignupRequest) -> Result<User, NrcError> {
    let name = required("name", &req.name)?;
    let username = required("username", &req.username)?;
    let employee_id = required("employee_id", &req.employee_id)?;
    if req.password.trim().is_empty() {
        return Err(NrcError::validation("password is required"));
    }

    ensure_unique(db, Table::Users, "username", &username, None).await?;
    ensure_unique(db, Table::Users, "employee_id", &employee_id, None).await?;

    let center_id = clean(req.center_id);
    if let Some(center) = &center_id {
        ensure_exists(db, Table::AnganwadiCenters, "anganwadi center", center).await?;
    }

    let user = User {
        id: new_id(),
        name,
        username,
        employee_id,
        password: req.password,
        role: req.role,
        phone: clean(req.phone),
        center_id,
        created_at: now(),
    };
    insert(db, &user).await?;
    info!(user_id = %user.id, username = %user.username, role = %user.role, "user signed up");
    Ok(user)
}

/// Plain-text password check, compared in constant time.
pub async fn login<S: TableStore>(db: &S, req: LoginRequest) -> Result<User, NrcError> {
    let username = req.username.trim();
    let row = db
        .find_one(Table::Users, &[filter("username", username)])
        .await?
        .ok_or(NrcError::InvalidCredentials)?;
    let user = User::from_row(&row)?;

    if !bool::from(user.password.as_bytes().ct_eq(req.password.as_bytes())) {
        return Err(NrcError::InvalidCredentials);
    }
    info!(user_id = %user.id, "login succeeded");
    Ok(user)
}

pub async fn list<S: TableStore>(db: &S, query: UserQuery) -> Result<Vec<User>, NrcError> {
    let filters = match query.role {
        Some(role) => vec![filter("role", role.as_str())],
        None => Vec::new(),
    };
    fetch_all(db, &filters).await
}

pub async fn get<S: TableStore>(db: &S, id: &str) -> Result<User, NrcError> {
    fetch(db, "user", id).await
}

pub async fn delete<S: TableStore>(db: &mut S, id: &str) -> Result<(), NrcError> {
    remove(db, Table::Users, "user", id).await?;
    info!(user_id = %id, "user deleted");
    Ok(())
}

const BOOTSTRAP_USERNAME: &str = "admin";
const BOOTSTRAP_EMPLOYEE_ID: &str = "ADMIN";

/// Create the `admin` account when no admin exists yet.
///
/// If another account already holds the `admin` username or `ADMIN`
/// employee id, nothing is created and a warning is logged.
pub async fn bootstrap_admin<S: TableStore>(
    db: &mut S,
    password: &str,
) -> Result<Option<User>, NrcError> {
    let admins = db
        .find(Table::Users, &[filter("role", Role::Admin.as_str())])
        .await?;
    if !admins.is_empty() {
        return Ok(None);
    }
    for (column, value) in [
        ("username", BOOTSTRAP_USERNAME),
        ("employee_id", BOOTSTRAP_EMPLOYEE_ID),
    ] {
        if let Some(holder) = db.find_by_field(Table::Users, column, value).await?.first() {
            warn!(
                user_id = %holder.id(),
                column,
                value,
                "bootstrap admin skipped; identifier already in use"
            );
            return Ok(None);
        }
    }
    let req = SignupRequest {
        name: "Administrator".to_string(),
        username: BOOTSTRAP_USERNAME.to_string(),
        employee_id: BOOTSTRAP_EMPLOYEE_ID.to_string(),
        password: password.to_string(),
        role: Role::Admin,
        phone: None,
        center_id: None,
    };
    signup(db, req).await.map(Some)
}

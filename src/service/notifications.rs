use tracing::debug;

use super::{fetch, fetch_all, insert, patch, remove};
use crate::error::NrcError;
use crate::store::{Row, Table, TableStore};
use crate::types::notification::{NewNotification, NotificationQuery};
use crate::types::{Notification, Role, clean, new_id, now, required};

/// Append a notification built by another rule.
pub(crate) async fn notify<S: TableStore>(db: &mut S, n: Notification) -> Result<(), NrcError> {
    insert(db, &n).await?;
    debug!(
        notification_id = %n.id,
        kind = %n.kind,
        user_id = n.user_id.as_deref().unwrap_or("-"),
        role = n.recipient_role.map(|r| r.as_str()).unwrap_or("-"),
        "notification queued"
    );
    Ok(())
}

pub async fn create<S: TableStore>(
    db: &mut S,
    input: NewNotification,
) -> Result<Notification, NrcError> {
    let message = required("message", &input.message)?;
    let user_id = clean(input.user_id);
    if user_id.is_none() && input.recipient_role.is_none() {
        return Err(NrcError::validation(
            "user_id or recipient_role is required",
        ));
    }
    let n = Notification {
        id: new_id(),
        user_id,
        recipient_role: input.recipient_role,
        kind: input.kind,
        message,
        patient_id: clean(input.patient_id),
        read: false,
        created_at: now(),
    };
    notify(db, n.clone()).await?;
    Ok(n)
}

/// Newest first. With a user or role given, only what that reader may see.
pub async fn list<S: TableStore>(
    db: &S,
    query: NotificationQuery,
) -> Result<Vec<Notification>, NrcError> {
    let scoped = query.user_id.is_some() || query.role.is_some();
    let mut items: Vec<Notification> = fetch_all::<Notification, _>(db, &[])
        .await?
        .into_iter()
        .filter(|n| !scoped || n.visible_to(query.user_id.as_deref(), query.role))
        .filter(|n| !query.unread_only || !n.read)
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(items)
}

pub async fn mark_read<S: TableStore>(db: &mut S, id: &str) -> Result<Notification, NrcError> {
    patch(db, "notification", id, Row::new().with("read", "true")).await
}

/// Mark everything visible to the reader as read. Returns how many changed.
pub async fn mark_all_read<S: TableStore>(
    db: &mut S,
    user_id: &str,
    role: Option<Role>,
) -> Result<usize, NrcError> {
    let query = NotificationQuery {
        user_id: Some(user_id.to_string()),
        role,
        unread_only: true,
    };
    let unread = list(db, query).await?;
    for n in &unread {
        db.update_by_id(Table::Notifications, &n.id, Row::new().with("read", "true"))
            .await?;
    }
    Ok(unread.len())
}

pub async fn get<S: TableStore>(db: &S, id: &str) -> Result<Notification, NrcError> {
    fetch(db, "notification", id).await
}

pub async fn delete<S: TableStore>(db: &mut S, id: &str) -> Result<(), NrcError> {
    remove(db, Table::Notifications, "notification", id).await
}

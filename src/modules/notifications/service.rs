use attendly_core::AppError;
use attendly_core::pagination::PaginationMeta;
use attendly_models::{NotificationId, UserId};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::modules::notifications::model::{
    MarkAllReadResponse, NewNotification, Notification, NotificationFilterParams,
    PaginatedNotificationsResponse,
};

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, sender_id, kind, title, message, is_read, \
     student_id, leave_request_id, created_at";

pub struct NotificationService;

impl NotificationService {
    /// Stores one notification. Accepts a pool or an open transaction so a
    /// caller can make delivery part of a larger unit of work.
    #[instrument(skip(executor, notification), fields(recipient = %notification.recipient_id, kind = notification.kind.as_str()))]
    pub async fn create<'e, E>(
        executor: E,
        notification: &NewNotification,
    ) -> Result<Notification, AppError>
    where
        E: PgExecutor<'e>,
    {
        let created = sqlx::query_as::<_, Notification>(&format!(
            r#"INSERT INTO notifications
                   (recipient_id, sender_id, kind, title, message, student_id, leave_request_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {NOTIFICATION_COLUMNS}"#
        ))
        .bind(notification.recipient_id)
        .bind(notification.sender_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.student_id)
        .bind(notification.leave_request_id)
        .fetch_one(executor)
        .await?;

        Ok(created)
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        recipient_id: UserId,
        filters: NotificationFilterParams,
    ) -> Result<PaginatedNotificationsResponse, AppError> {
        let unread_only = filters.unread_only.unwrap_or(false);
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM notifications WHERE recipient_id = ");
        count_qb.push_bind(recipient_id);
        if unread_only {
            count_qb.push(" AND NOT is_read");
        }
        let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

        let unread = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient_id)
        .fetch_one(db)
        .await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE recipient_id = "
        ));
        qb.push_bind(recipient_id);
        if unread_only {
            qb.push(" AND NOT is_read");
        }
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let data = qb.build_query_as::<Notification>().fetch_all(db).await?;

        Ok(PaginatedNotificationsResponse {
            data,
            unread,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }

    #[instrument(skip(db))]
    pub async fn mark_read(
        db: &PgPool,
        recipient_id: UserId,
        id: NotificationId,
    ) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(&format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2 \
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notification not found")))
    }

    #[instrument(skip(db))]
    pub async fn mark_all_read(
        db: &PgPool,
        recipient_id: UserId,
    ) -> Result<MarkAllReadResponse, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient_id)
        .execute(db)
        .await?;

        Ok(MarkAllReadResponse {
            updated: result.rows_affected() as i64,
        })
    }

    #[instrument(skip(db))]
    pub async fn delete(
        db: &PgPool,
        recipient_id: UserId,
        id: NotificationId,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Notification not found")));
        }

        Ok(())
    }
}

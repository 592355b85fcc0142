//! Student CRUD operations.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::StudentRow;

/// Find a student by JID. Returns None for an unseen JID; the engine
/// creates the profile lazily in that case.
pub async fn find_student(pool: &SqlitePool, jid: &str) -> Result<Option<StudentRow>> {
    let row = sqlx::query_as::<_, StudentRow>(
        r#"
        SELECT jid, display_name, level, xp, mode, history
        FROM students
        WHERE jid = ?
        "#,
    )
    .bind(jid)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Upsert a student row. Called once per processed turn.
pub async fn save_student(pool: &SqlitePool, student: &StudentRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO students (jid, display_name, level, xp, mode, history)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(jid) DO UPDATE SET
            display_name = excluded.display_name,
            level = excluded.level,
            xp = excluded.xp,
            mode = excluded.mode,
            history = excluded.history
        "#,
    )
    .bind(&student.jid)
    .bind(&student.display_name)
    .bind(&student.level)
    .bind(student.xp)
    .bind(&student.mode)
    .bind(&student.history)
    .execute(pool)
    .await?;

    Ok(())
}

/// Count total students.
pub async fn count_students(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM students
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

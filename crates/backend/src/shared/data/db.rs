use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement,
};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/app.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Database connection already initialized"))?;
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection not initialized. Call initialize_database first")
}

/// Минимальный bootstrap схемы: корневая таблица клиента и четыре
/// дочерние таблицы с префиксом агрегата.
pub async fn bootstrap_schema<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS a001_customer (
            id TEXT PRIMARY KEY NOT NULL,
            code TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL,
            comment TEXT,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            middle_name TEXT,
            date_of_birth TEXT,
            email TEXT,
            phone TEXT,
            segment_code TEXT,
            risk_level_code TEXT,
            kyc_status_code TEXT,
            occupation_code TEXT,
            industry_code TEXT,
            sector_code TEXT,
            created_at TEXT,
            updated_at TEXT,
            created_by TEXT,
            updated_by TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS a001_customer_address (
            id TEXT PRIMARY KEY NOT NULL,
            customer_id TEXT NOT NULL,
            address_type TEXT NOT NULL,
            line1 TEXT NOT NULL,
            line2 TEXT,
            city TEXT NOT NULL,
            province_code TEXT,
            postal_code TEXT,
            country_code TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_primary INTEGER NOT NULL DEFAULT 0,
            valid_from TEXT,
            valid_to TEXT
        );
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_a001_customer_address_customer
            ON a001_customer_address (customer_id);
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS a001_customer_identification (
            id TEXT PRIMARY KEY NOT NULL,
            customer_id TEXT NOT NULL,
            id_type TEXT NOT NULL,
            number TEXT NOT NULL,
            issuing_country_code TEXT,
            issue_date TEXT,
            expiry_date TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_primary INTEGER NOT NULL DEFAULT 0
        );
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_a001_customer_identification_customer
            ON a001_customer_identification (customer_id);
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_a001_customer_identification_number
            ON a001_customer_identification (number);
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS a001_customer_relationship (
            id TEXT PRIMARY KEY NOT NULL,
            customer_id TEXT NOT NULL,
            related_customer_id TEXT NOT NULL,
            relationship_type TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_primary INTEGER NOT NULL DEFAULT 0,
            valid_from TEXT,
            valid_to TEXT
        );
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_a001_customer_relationship_customer
            ON a001_customer_relationship (customer_id);
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS a001_customer_product (
            id TEXT PRIMARY KEY NOT NULL,
            customer_id TEXT NOT NULL,
            product_code TEXT NOT NULL,
            account_number TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_primary INTEGER NOT NULL DEFAULT 0,
            enrolled_at TEXT,
            closed_at TEXT
        );
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_a001_customer_product_customer
            ON a001_customer_product (customer_id);
        "#,
    ];

    for sql in statements {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            sql.to_string(),
        ))
        .await?;
    }

    Ok(())
}

/// Отдельное in-memory подключение для тестов.
///
/// Пул ограничен одним соединением: каждое соединение sqlite `::memory:`
/// видит свою собственную базу.
#[cfg(test)]
pub async fn connect_test() -> DatabaseConnection {
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let conn = Database::connect(options)
        .await
        .expect("in-memory sqlite should connect");
    bootstrap_schema(&conn)
        .await
        .expect("schema bootstrap should succeed");
    conn
}

//! DDL for the metadata table.

pub(crate) const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INT AUTO_INCREMENT PRIMARY KEY,
    document_id VARCHAR(255) NOT NULL,
    url LONGTEXT NOT NULL,
    title LONGTEXT,
    description LONGTEXT,
    keywords LONGTEXT,
    source LONGTEXT,
    crawl_timestamp DATETIME(6) NULL,
    UNIQUE KEY uq_document_id (document_id)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
"#;

pub(crate) const UPSERT_DOCUMENT: &str = r#"
INSERT INTO documents (document_id, url, title, description, keywords, source, crawl_timestamp)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON DUPLICATE KEY UPDATE
    url = VALUES(url),
    title = VALUES(title),
    description = VALUES(description),
    keywords = VALUES(keywords),
    source = VALUES(source),
    crawl_timestamp = VALUES(crawl_timestamp)
"#;

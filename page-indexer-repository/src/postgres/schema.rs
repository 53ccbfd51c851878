//! DDL and statements for the inverted index table.

/// Width of the `token` column, in characters.
pub const MAX_TOKEN_LENGTH: usize = 255;

pub(crate) const CREATE_INVERTED_INDEX_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inverted_index (
    id SERIAL PRIMARY KEY,
    token VARCHAR(255) NOT NULL,
    document_id VARCHAR(255) NOT NULL,
    frequency INT NOT NULL DEFAULT 1,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (token, document_id)
)
"#;

pub(crate) const CREATE_TOKEN_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_token ON inverted_index(token)";

pub(crate) const CREATE_DOCUMENT_ID_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_document_id ON inverted_index(document_id)";

pub(crate) const DELETE_DOCUMENT_ENTRIES: &str =
    "DELETE FROM inverted_index WHERE document_id = $1";

/// Inserts the whole token set in one round trip from two parallel arrays.
pub(crate) const INSERT_DOCUMENT_ENTRIES: &str = r#"
INSERT INTO inverted_index (token, document_id, frequency)
SELECT entry.token, $2, entry.frequency
FROM UNNEST($1::varchar[], $3::int[]) AS entry(token, frequency)
"#;

use crate::error::{Error, ErrorKind};
use crate::model::Record;
use exn::ResultExt;
use time::UtcDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct RecordRow {
    id: i64,
    category: String,
    title: String,
    author: String,
    url: String,
    image_url: Option<String>,
    description: Option<String>,
    submitted_at: i64,
}

impl TryFrom<RecordRow> for Record {
    type Error = Error;
    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            category: row.category,
            title: row.title,
            author: row.author,
            url: row.url,
            image_url: row.image_url,
            description: row.description,
            submitted_at: UtcDateTime::from_unix_timestamp(row.submitted_at)
                .or_raise(|| ErrorKind::InvalidData("submission date"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_model() {
        let submitted = UtcDateTime::now();
        let row = RecordRow {
            id: 7,
            category: "network-links".to_string(),
            title: "Generative sketches".to_string(),
            author: "F. Jenett".to_string(),
            url: "http://example.org/sketches/".to_string(),
            image_url: None,
            description: Some("A collection of generative work.".to_string()),
            submitted_at: submitted.unix_timestamp(),
        };
        let model = Record::try_from(row).unwrap();
        assert_eq!(model.id, 7);
        // Converting to a Unix timestamp (measured in seconds) inherently strips the nanoseconds component.
        assert_eq!(model.submitted_at, submitted.replace_nanosecond(0).unwrap());
    }
}

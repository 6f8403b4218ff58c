use axum::extract::Multipart;

use crate::error::{AppError, Result};
use crate::services::storage_service::UploadedFile;

/// State of an optional file input after parsing a form. HTML forms send
/// a real upload, the bare key with an empty value (clear the stored
/// file), or nothing at all.
#[derive(Debug, Clone)]
pub enum FilePart {
    Missing,
    Clear,
    Upload(UploadedFile),
}

/// Text fields and file uploads of a multipart form, in arrival order.
/// Keys keep the FormData bracket syntax (`images[]`, `images_alt[0]`)
/// so list accessors can reassemble them.
#[derive(Debug, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            if field.file_name().is_some() {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

                // A file input submitted without a selection arrives as an
                // empty file part; treat it like the bare key.
                if data.is_empty() {
                    form.fields.push((name, String::new()));
                } else {
                    form.files.push((name, UploadedFile { content_type, data }));
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid form field: {}", e)))?;
                form.fields.push((name, text));
            }
        }

        Ok(form)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(key, _)| key == name)
    }

    pub fn values(&self, name: &str) -> Vec<&str> {
        collect_list(&self.fields, name)
            .into_iter()
            .map(String::as_str)
            .collect()
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, file)| file)
    }

    pub fn files(&self, name: &str) -> Vec<&UploadedFile> {
        collect_list(&self.files, name)
    }

    pub fn file_part(&self, name: &str) -> FilePart {
        if let Some(file) = self.file(name) {
            return FilePart::Upload(file.clone());
        }
        if self.has_field(name) {
            return FilePart::Clear;
        }
        FilePart::Missing
    }
}

/// Gathers `name`, `name[]` and `name[i]` entries into one list. Bracket
/// repeats keep arrival order; indexed keys follow, sorted by index.
fn collect_list<'a, T>(entries: &'a [(String, T)], name: &str) -> Vec<&'a T> {
    let bracket = format!("{}[]", name);
    let mut plain: Vec<&'a T> = Vec::new();
    let mut indexed: Vec<(usize, &'a T)> = Vec::new();

    for (key, value) in entries {
        if key == name || *key == bracket {
            plain.push(value);
        } else if let Some(index) = key
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|index| index.parse::<usize>().ok())
        {
            indexed.push((index, value));
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    plain.extend(indexed.into_iter().map(|(_, value)| value));
    plain
}

/// Form checkboxes and query toggles arrive as strings. Unknown values
/// are neither true nor false so callers can flag them.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn upload(content_type: &str) -> UploadedFile {
        UploadedFile {
            content_type: content_type.to_string(),
            data: Bytes::from_static(b"data"),
        }
    }

    fn form(fields: Vec<(&str, &str)>, files: Vec<(&str, UploadedFile)>) -> FormData {
        FormData {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: files.into_iter().map(|(k, f)| (k.to_string(), f)).collect(),
        }
    }

    #[test]
    fn collects_bracket_and_indexed_lists() {
        let form = form(
            vec![
                ("remove_image_ids[]", "4"),
                ("remove_image_ids[]", "7"),
                ("images_alt[1]", "segunda"),
                ("images_alt[0]", "primera"),
            ],
            vec![],
        );

        assert_eq!(form.values("remove_image_ids"), vec!["4", "7"]);
        assert_eq!(form.values("images_alt"), vec!["primera", "segunda"]);
        assert!(form.values("images_order").is_empty());
    }

    #[test]
    fn file_part_distinguishes_upload_clear_and_missing() {
        let form = form(
            vec![("image", "")],
            vec![("main_image", upload("image/png"))],
        );

        assert!(matches!(form.file_part("main_image"), FilePart::Upload(_)));
        assert!(matches!(form.file_part("image"), FilePart::Clear));
        assert!(matches!(form.file_part("mobile_image"), FilePart::Missing));
    }

    #[test]
    fn value_takes_the_last_occurrence() {
        let form = form(vec![("name", "Primero"), ("name", "Segundo")], vec![]);
        assert_eq!(form.value("name"), Some("Segundo"));
    }

    #[test]
    fn parses_form_booleans() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool(""), Some(false));
        assert_eq!(parse_bool("quizás"), None);
    }
}

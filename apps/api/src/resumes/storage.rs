//! Object-store (S3/MinIO) and document-store (Redis) access for resumes.

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use redis::AsyncCommands;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeUpload;
use crate::state::AppState;

/// Prefix under which every uploaded resume PDF lives in the bucket.
pub const OBJECT_PREFIX: &str = "resumes/";
/// Prefix of every extracted-text key in the document store.
pub const DOCUMENT_PREFIX: &str = "resume_text:";

/// Longest presigned link S3 will sign (seven days).
pub const MAX_LINK_EXPIRATION_SECS: u64 = 7 * 24 * 60 * 60;

pub fn object_key(resume_id: Uuid, file_name: &str) -> String {
    format!("{OBJECT_PREFIX}{resume_id}/{}", sanitize_file_name(file_name))
}

pub fn document_key(resume_id: Uuid) -> String {
    format!("{DOCUMENT_PREFIX}{resume_id}")
}

/// Keeps the file name usable as a single object-key segment.
fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "resume.pdf".to_string()
    } else {
        cleaned
    }
}

pub async fn put_object(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: Bytes,
    content_type: &str,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("S3 upload failed: {e}")))?;
    info!("Uploaded s3://{bucket}/{key}");
    Ok(())
}

pub async fn delete_object(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Result<(), AppError> {
    s3.delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("S3 delete failed: {e}")))?;
    Ok(())
}

/// Returns a presigned GET link valid for `expires_in`.
pub async fn download_link(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    expires_in: Duration,
) -> Result<String, AppError> {
    let presigning = PresigningConfig::expires_in(expires_in)
        .map_err(|e| AppError::Validation(format!("invalid link expiration: {e}")))?;
    let request = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .presigned(presigning)
        .await
        .map_err(|e| AppError::S3(format!("S3 presign failed: {e}")))?;
    Ok(request.uri().to_string())
}

/// Deletes every object under `prefix`, page by page. Returns how many were removed.
pub async fn delete_prefix(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
) -> Result<usize, AppError> {
    let mut removed = 0;
    let mut continuation: Option<String> = None;

    loop {
        let page = s3
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation.take())
            .send()
            .await
            .map_err(|e| AppError::S3(format!("S3 list failed: {e}")))?;

        for object in page.contents() {
            if let Some(key) = object.key() {
                delete_object(s3, bucket, key).await?;
                removed += 1;
            }
        }

        match page.next_continuation_token() {
            Some(token) => continuation = Some(token.to_string()),
            None => break,
        }
    }

    Ok(removed)
}

pub async fn put_document(
    redis: &redis::Client,
    key: &str,
    text: &str,
) -> Result<(), AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    conn.set::<_, _, ()>(key, text).await?;
    Ok(())
}

pub async fn get_document(redis: &redis::Client, key: &str) -> Result<Option<String>, AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    Ok(conn.get(key).await?)
}

pub async fn delete_document(redis: &redis::Client, key: &str) -> Result<(), AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    conn.del::<_, ()>(key).await?;
    Ok(())
}

/// Keys deleted per `DEL` when clearing a prefix.
const DELETE_BATCH: usize = 500;

/// Deletes every document whose key starts with `prefix`. Keys are found with
/// incremental `SCAN`, so the server is never blocked on the whole keyspace.
pub async fn delete_documents(redis: &redis::Client, prefix: &str) -> Result<usize, AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;

    let mut keys: Vec<String> = Vec::new();
    {
        let mut iter = conn.scan_match::<_, String>(scan_pattern(prefix)).await?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
    }
    // SCAN may return a key more than once.
    keys.sort_unstable();
    keys.dedup();

    for batch in keys.chunks(DELETE_BATCH) {
        conn.del::<_, ()>(batch).await?;
    }
    Ok(keys.len())
}

/// Glob matching every key that starts with `prefix` literally.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

/// Removes the stored file and extracted text of an upload whose row is
/// already gone. Runs after the database commit, so failures are logged and
/// left behind rather than reported.
pub async fn purge_resume(state: &AppState, upload: &ResumeUpload) {
    if let Err(e) = delete_object(&state.s3, &state.config.s3_bucket, &upload.object_key).await {
        warn!("Could not remove resume object {}: {e}", upload.object_key);
    }
    if let Err(e) = delete_document(&state.redis, &upload.document_key).await {
        warn!("Could not remove resume text {}: {e}", upload.document_key);
    }
    info!("Purged resume upload {}", upload.id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_keeps_plain_names() {
        let id = Uuid::nil();
        assert_eq!(
            object_key(id, "jane-doe_cv.pdf"),
            "resumes/00000000-0000-0000-0000-000000000000/jane-doe_cv.pdf"
        );
    }

    #[test]
    fn test_object_key_strips_directories_and_odd_characters() {
        let key = object_key(Uuid::nil(), "../../etc/my resume (final).pdf");
        assert!(key.ends_with("/my_resume__final_.pdf"));
        assert!(!key.contains(".."));
    }

    #[test]
    fn test_object_key_falls_back_for_empty_names() {
        assert!(object_key(Uuid::nil(), "").ends_with("/resume.pdf"));
        assert!(object_key(Uuid::nil(), "..").ends_with("/resume.pdf"));
    }

    #[test]
    fn test_scan_pattern_escapes_glob_characters() {
        assert_eq!(scan_pattern(DOCUMENT_PREFIX), "resume_text:*");
        assert_eq!(scan_pattern("a*b?[c]"), "a\\*b\\?\\[c\\]*");
    }

    #[tokio::test]
    async fn test_delete_documents_clears_only_the_prefix() {
        let Ok(url) = std::env::var("REDIS_URL") else {
            eprintln!("REDIS_URL not set, skipping redis test");
            return;
        };
        let redis = redis::Client::open(url).unwrap();
        let prefix = format!("taskdeck_test_{}:", Uuid::new_v4());
        for i in 0..(DELETE_BATCH + 3) {
            put_document(&redis, &format!("{prefix}{i}"), "text").await.unwrap();
        }
        let survivor = format!("{}keep", prefix.trim_end_matches(':'));
        put_document(&redis, &survivor, "text").await.unwrap();

        let removed = delete_documents(&redis, &prefix).await.unwrap();

        assert_eq!(removed, DELETE_BATCH + 3);
        assert_eq!(get_document(&redis, &format!("{prefix}0")).await.unwrap(), None);
        assert!(get_document(&redis, &survivor).await.unwrap().is_some());
        delete_document(&redis, &survivor).await.unwrap();
    }

    #[test]
    fn test_document_key() {
        assert_eq!(
            document_key(Uuid::nil()),
            "resume_text:00000000-0000-0000-0000-000000000000"
        );
    }
}

//! Round trips through the local filesystem backend.

use futures::StreamExt;
use vidgate_storage::{LocalStorage, Storage, StorageError};

async fn read_all(storage: &LocalStorage, bucket: &str, key: &str) -> (Vec<u8>, u64) {
    let object = storage.get_object(bucket, key).await.unwrap();
    let mut body = object.body;
    let mut data = Vec::new();
    while let Some(chunk) = body.next().await {
        data.extend_from_slice(&chunk.unwrap());
    }
    (data, object.content_length)
}

#[tokio::test]
async fn test_put_get_delete() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path()).await.unwrap();

    storage
        .put_object(
            "uploads",
            "flattened-landscape-images/sunset.jpg",
            b"jpeg-bytes".to_vec(),
            "image/jpeg",
        )
        .await
        .unwrap();

    assert!(storage
        .exists("uploads", "flattened-landscape-images/sunset.jpg")
        .await
        .unwrap());
    assert!(dir
        .path()
        .join("uploads/flattened-landscape-images/sunset.jpg")
        .exists());

    let (data, declared) = read_all(&storage, "uploads", "flattened-landscape-images/sunset.jpg").await;
    assert_eq!(data, b"jpeg-bytes");
    assert_eq!(declared, data.len() as u64);

    storage
        .delete_object("uploads", "flattened-landscape-images/sunset.jpg")
        .await
        .unwrap();
    assert!(!storage
        .exists("uploads", "flattened-landscape-images/sunset.jpg")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_get_missing_object() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path()).await.unwrap();

    let result = storage.get_object("uploads", "missing.mp4").await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

#[tokio::test]
async fn test_buckets_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path()).await.unwrap();

    storage
        .put_object("a", "clip.mp4", vec![1, 2, 3], "video/mp4")
        .await
        .unwrap();

    assert!(storage.exists("a", "clip.mp4").await.unwrap());
    assert!(!storage.exists("b", "clip.mp4").await.unwrap());
}

#[tokio::test]
async fn test_traversal_key_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path()).await.unwrap();

    let result = storage
        .put_object("uploads", "../escape.jpg", vec![0], "image/jpeg")
        .await;
    assert!(matches!(result, Err(StorageError::InvalidKey(_))));
}

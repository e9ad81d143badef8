#![cfg(feature = "s3-tests")]

mod common;

use common::*;
use rustfs_client::{BucketPolicy, StorageError};

#[tokio::test]
async fn test_bucket_lifecycle() {
    let client = test_client();
    let name = unique_bucket_name("lifecycle");

    assert!(!client.bucket_exists(&name).await.unwrap());

    client.create_bucket(&name, None).await.unwrap();
    assert!(client.bucket_exists(&name).await.unwrap());

    let err = client.create_bucket(&name, None).await.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists { .. }), "{err:?}");

    client.delete_bucket(&name).await.unwrap();
    assert!(!client.bucket_exists(&name).await.unwrap());

    let err = client.delete_bucket(&name).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn test_public_read_then_private() {
    let bucket = TestBucket::new("policy").await;
    let client = &bucket.client;

    client
        .upload_object(&bucket.name, "public.txt", "visible".into(), None)
        .await
        .unwrap();
    let url = client.public_object_url(&bucket.name, "public.txt");
    let anonymous = reqwest::Client::new();

    client
        .set_bucket_policy(&bucket.name, BucketPolicy::PublicRead)
        .await
        .unwrap();
    assert!(client.bucket_policy(&bucket.name).await.unwrap().is_some());

    let response = anonymous.get(&url).send().await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "visible");

    client
        .set_bucket_policy(&bucket.name, BucketPolicy::Private)
        .await
        .unwrap();
    assert!(client.bucket_policy(&bucket.name).await.unwrap().is_none());

    let response = anonymous.get(&url).send().await.unwrap();
    assert!(response.status().is_client_error());

    // Making a private bucket private again is a no-op
    client
        .set_bucket_policy(&bucket.name, BucketPolicy::Private)
        .await
        .unwrap();

    bucket.cleanup().await;
}

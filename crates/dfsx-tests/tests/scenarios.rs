//! Scenario tests mirroring production-cluster scenarios and laws, driven
//! through the real HTTP surface of a [`dfsx_tests::harness::Cluster`].

use dfsx_client::{ClientError, Mode, Session};
use dfsx_tests::harness::Cluster;
use std::io::{Read, Write};
use std::time::Duration;

#[tokio::test]
async fn scenario_1_happy_write() {
    let cluster = Cluster::start("/d").await;
    let session = Session::new(cluster.client_config());

    let mut handle = session.open("/d/f", Mode::Write, false).await.unwrap();
    handle.write(b"hello").unwrap();
    session.close(handle).await.unwrap();

    let mut reader = session.open("/d/f", Mode::Read, false).await.unwrap();
    let mut body = String::new();
    reader.read_to_string(&mut body).unwrap();
    assert_eq!(body, "hello");
    assert!(reader.last_modified().is_some());
}

#[tokio::test]
async fn scenario_2_append_to_absent_file() {
    let cluster = Cluster::start("/d").await;
    let session = Session::new(cluster.client_config());

    let mut handle = session.open("/d/new", Mode::Append, false).await.unwrap();
    handle.write(b"x").unwrap();
    session.close(handle).await.unwrap();

    let mut reader = session.open("/d/new", Mode::Read, false).await.unwrap();
    let mut body = String::new();
    reader.read_to_string(&mut body).unwrap();
    assert_eq!(body, "x");
}

#[tokio::test]
async fn scenario_3_locked_read_rejected() {
    let cluster = Cluster::start("/d").await;
    let session = Session::new(cluster.client_config());

    // client A holds a write lease (never closed in this test)
    let _writer = session.open("/d/locked", Mode::Write, false).await.unwrap();

    let result = session.open("/d/locked", Mode::Read, false).await;
    assert!(matches!(result, Err(ClientError::Locked)));
}

#[tokio::test]
async fn scenario_4_expired_lease_takeover() {
    let cluster = Cluster::start("/d").await;
    let session = Session::new(cluster.client_config());

    let mut writer_a = session.open("/d/takeover", Mode::Write, false).await.unwrap();
    writer_a.write(b"from-a").unwrap();

    tokio::time::sleep(Cluster::lease_lifetime() + Duration::from_millis(500)).await;

    let mut writer_b = session.open("/d/takeover", Mode::Write, false).await.unwrap();
    writer_b.write(b"from-b").unwrap();
    session.commit(&mut writer_b).await.unwrap();

    let result = session.commit(&mut writer_a).await;
    assert!(matches!(result, Err(ClientError::Unauthorized(_))));
}

#[tokio::test]
async fn scenario_5_cache_validated() {
    let cluster = Cluster::start("/d").await;
    let session = Session::new(cluster.client_config());

    let mut handle = session.open("/d/cached", Mode::Write, true).await.unwrap();
    handle.write(b"v1").unwrap();
    session.close(handle).await.unwrap();

    let mut hit = session.from_cache("/d/cached").await.expect("cache hit");
    let mut body = String::new();
    hit.read_to_string(&mut body).unwrap();
    assert_eq!(body, "v1");
    session.close(hit).await.unwrap();

    // out-of-band write by another client session
    let other = Session::new(cluster.client_config());
    let mut writer = other.open("/d/cached", Mode::Write, false).await.unwrap();
    writer.write(b"v2").unwrap();
    other.close(writer).await.unwrap();

    let miss = session.from_cache("/d/cached").await;
    assert!(miss.is_none());
}

#[tokio::test]
async fn scenario_6_non_servable_path_rejected_without_touching_disk() {
    let cluster = Cluster::start("/d").await;
    let http = reqwest::Client::new();
    let resp = http
        .get(format!("http://{}/e/f", cluster.storage_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_ACCEPTABLE);
    assert!(!cluster.storage_dir.path().join("e/f").exists());
}

#[tokio::test]
async fn law_lease_revoke_is_idempotent() {
    let cluster = Cluster::start("/d").await;
    let http = reqwest::Client::new();
    let lease_url = format!("http://{}/d/idempotent", cluster.lease_addr);

    let resp = http.post(&lease_url).send().await.unwrap();
    let lease_id: u64 = resp.text().await.unwrap().trim().parse().unwrap();

    let delete_url = format!("{lease_url}?lock_id={lease_id}");
    let first = http.delete(&delete_url).send().await.unwrap();
    let second = http.delete(&delete_url).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    assert_eq!(second.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn law_grant_after_expiry_invalidates_old_id() {
    let cluster = Cluster::start("/d").await;
    let http = reqwest::Client::new();
    let lease_url = format!("http://{}/d/reaped", cluster.lease_addr);

    let first_grant = http.post(&lease_url).send().await.unwrap();
    let id1: u64 = first_grant.text().await.unwrap().trim().parse().unwrap();

    tokio::time::sleep(Cluster::lease_lifetime() + Duration::from_millis(500)).await;

    let second_grant = http.post(&lease_url).send().await.unwrap();
    assert_eq!(second_grant.status(), reqwest::StatusCode::OK);
    let id2: u64 = second_grant.text().await.unwrap().trim().parse().unwrap();

    let check_old = http
        .get(format!("{lease_url}?lock_id={id1}"))
        .send()
        .await
        .unwrap();
    assert_eq!(check_old.status(), reqwest::StatusCode::CONFLICT);

    let check_new = http
        .get(format!("{lease_url}?lock_id={id2}"))
        .send()
        .await
        .unwrap();
    assert_eq!(check_new.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn law_batch_grant_atomicity() {
    let cluster = Cluster::start("/d").await;
    let http = reqwest::Client::new();

    // pre-existing valid lease on one of the batched paths blocks the whole batch
    let pre = format!("http://{}/d/pre-held", cluster.lease_addr);
    http.post(&pre).send().await.unwrap();

    let root = format!("http://{}/", cluster.lease_addr);
    let body = "/d/pre-held\n/d/fresh-a\n/d/fresh-b";
    let batch = http.post(&root).body(body).send().await.unwrap();
    assert_eq!(batch.status(), reqwest::StatusCode::UNAUTHORIZED);

    // neither fresh path should have been left with a dangling lease
    for path in ["/d/fresh-a", "/d/fresh-b"] {
        let url = format!("http://{}{}", cluster.lease_addr, path);
        let grant = http.post(&url).send().await.unwrap();
        assert_eq!(grant.status(), reqwest::StatusCode::OK);
    }
}

#[tokio::test]
async fn law_flushing_twice_does_not_double_revoke() {
    let cluster = Cluster::start("/d").await;
    let session = Session::new(cluster.client_config());

    let mut handle = session.open("/d/flush-twice", Mode::Write, false).await.unwrap();
    handle.write(b"once").unwrap();

    session.commit(&mut handle).await.unwrap();
    // the lease is gone after the first commit; a second commit must be a
    // safe no-op rather than re-PUT with the now-dead lease id.
    session.commit(&mut handle).await.unwrap();

    let mut reader = session.open("/d/flush-twice", Mode::Read, false).await.unwrap();
    let mut body = String::new();
    reader.read_to_string(&mut body).unwrap();
    assert_eq!(body, "once");
}

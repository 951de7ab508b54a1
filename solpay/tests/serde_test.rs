use chrono::{TimeZone, Utc};
use serde_json::json;
use solpay::types::{
    AuthResponse, HistoryResponse, PaymentNotification, PaymentResponse, TransactionRecord, User,
    UserMirror,
};

#[test]
fn test_deserialize_user_camel_case() {
    let data = json!({
        "id": "66f1a2b3c4d5e6f7a8b9c0d1",
        "email": "alice@example.com",
        "username": "alice",
        "credits": 56000,
        "postsCreated": 12,
        "status": "active"
    });

    let user: User = serde_json::from_value(data).unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.credits, 56000);
    assert_eq!(user.posts_created, 12);
    assert_eq!(user.status.as_deref(), Some("active"));
}

#[test]
fn test_deserialize_user_missing_optional_fields() {
    let data = json!({
        "id": "66f1a2b3c4d5e6f7a8b9c0d1",
        "email": "alice@example.com",
        "username": "alice"
    });

    let user: User = serde_json::from_value(data).unwrap();
    assert_eq!(user.credits, 0);
    assert_eq!(user.posts_created, 0);
    assert!(user.status.is_none());
}

#[test]
fn test_user_mirror_keeps_identity_only() {
    let user: User = serde_json::from_value(json!({
        "id": "abc",
        "email": "alice@example.com",
        "username": "alice",
        "credits": 999
    }))
    .unwrap();

    let mirror = UserMirror::from(&user);
    let value = serde_json::to_value(&mirror).unwrap();
    assert_eq!(
        value,
        json!({"id": "abc", "email": "alice@example.com", "username": "alice"})
    );
}

#[test]
fn test_deserialize_transaction_record() {
    let data = json!({
        "date": "2025-03-14T09:26:53Z",
        "packageName": "Pro",
        "amountUsd": 20.0,
        "amountSol": 0.2,
        "credits": 56000,
        "signature": "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW"
    });

    let record: TransactionRecord = serde_json::from_value(data).unwrap();
    assert_eq!(record.package_name, "Pro");
    assert_eq!(record.amount_sol, 0.2);
    assert_eq!(
        record.date,
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    );
}

#[test]
fn test_serialize_payment_notification_camel_case() {
    let body = PaymentNotification {
        signature: "sig".to_string(),
        amount_in_sol: 0.2,
        package_id: 2,
    };

    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(
        value,
        json!({"signature": "sig", "amountInSol": 0.2, "packageId": 2})
    );
}

#[test]
fn test_auth_envelope_defaults() {
    let resp: AuthResponse = serde_json::from_value(json!({})).unwrap();
    assert!(!resp.success);
    assert!(resp.error.is_none());
    assert!(resp.user.is_none());

    let resp: AuthResponse =
        serde_json::from_value(json!({"success": false, "error": "Invalid credentials"})).unwrap();
    assert_eq!(resp.error.as_deref(), Some("Invalid credentials"));
}

#[test]
fn test_history_envelope_without_transactions() {
    let resp: HistoryResponse = serde_json::from_value(json!({"success": true})).unwrap();
    assert!(resp.success);
    assert!(resp.transactions.is_none());
}

#[test]
fn test_payment_envelope() {
    let resp: PaymentResponse =
        serde_json::from_value(json!({"success": true, "credits": 10000})).unwrap();
    assert!(resp.success);
    assert_eq!(resp.credits, Some(10000));
}

/*!
 * Unit tests for credential store loading and round-robin rotation
 */

use std::collections::HashMap;
use std::sync::Arc;

use crate::common;

use yantwai::app_config::Provider;
use yantwai::credentials::{self, Credential, CredentialPool, CredentialStore};

fn store_with_keys(provider: &str, keys: &[&str]) -> CredentialStore {
    let mut store = HashMap::new();
    store.insert(
        provider.to_string(),
        keys.iter()
            .map(|k| Credential { api_key: k.to_string(), ..Credential::default() })
            .collect::<Vec<_>>(),
    );
    store
}

#[test]
fn test_load_store_should_parse_json_key_lists() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        &dir.path().to_path_buf(),
        "keys.json",
        r#"{
            "openai": [{"api_key": "sk-a"}, {"api_key": "sk-b", "endpoint": "https://api.deepseek.com"}],
            "vertex": [{"api_key": "ya29.x", "project_id": "my-project", "location": "asia-southeast1"}]
        }"#,
    )
    .unwrap();

    let store = credentials::load_store(&path).unwrap();
    assert_eq!(store["openai"].len(), 2);
    assert_eq!(store["openai"][1].endpoint.as_deref(), Some("https://api.deepseek.com"));
    assert_eq!(store["vertex"][0].project_id.as_deref(), Some("my-project"));
}

#[test]
fn test_load_store_with_missing_file_should_fail() {
    let dir = common::create_temp_dir().unwrap();
    assert!(credentials::load_store(dir.path().join("absent.json")).is_err());
}

#[test]
fn test_rotation_fairness_under_concurrent_acquisition() {
    // k full cycles over 3 keys: every key must be issued exactly k times,
    // no matter how many threads draw at once
    let store = store_with_keys("gemini", &["key-a", "key-b", "key-c"]);
    let pool = Arc::new(CredentialPool::from_store(&store, &[Provider::Gemini]).unwrap());

    let cycles = 40;
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || -> Vec<String> {
                (0..cycles * 3 / 8)
                    .map(|_| pool.acquire(Provider::Gemini).unwrap().api_key.clone())
                    .collect()
            })
        })
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            *counts.entry(key).or_default() += 1;
        }
    }

    assert_eq!(counts["key-a"], cycles / 8 * 8);
    assert_eq!(counts["key-a"], counts["key-b"]);
    assert_eq!(counts["key-b"], counts["key-c"]);
}

#[test]
fn test_pool_should_reject_provider_without_credentials() {
    let store = store_with_keys("openai", &["sk-a"]);
    assert!(CredentialPool::from_store(&store, &[Provider::OpenAi, Provider::Gemini]).is_err());
}

#[test]
fn test_acquire_for_unrequested_provider_should_fail() {
    let store = store_with_keys("openai", &["sk-a"]);
    let pool = CredentialPool::from_store(&store, &[Provider::OpenAi]).unwrap();
    assert!(pool.acquire(Provider::Vertex).is_err());
}

#[test]
fn test_credential_count_should_report_pool_size() {
    let store = store_with_keys("openai", &["sk-a", "sk-b"]);
    let pool = CredentialPool::from_store(&store, &[Provider::OpenAi]).unwrap();
    assert_eq!(pool.credential_count(Provider::OpenAi), 2);
    assert_eq!(pool.credential_count(Provider::Gemini), 0);
}

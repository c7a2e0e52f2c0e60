//! Integration tests for namespaced secret lookup

use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use servicekit::context::{Context, ContextError};
use servicekit::secrets::{
    CachedSecretsManager, EnvVarSecretStore, InMemorySecretStore, NamespacedSecretsManager, SecretNaming,
    SecretsError, SecretsManager,
};
use servicekit::ErrorKind;

// Serializes tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn memory_manager(store: &Arc<InMemorySecretStore>, key_fmt: &str) -> NamespacedSecretsManager<Arc<InMemorySecretStore>> {
    let naming = SecretNaming::new("svc", "dev1", "%s/%s", key_fmt).unwrap();
    NamespacedSecretsManager::new(Arc::clone(store), naming)
}

#[tokio::test]
async fn test_default_formats_qualify_name() {
    let store = Arc::new(InMemorySecretStore::new().with_secret("svc/dev1/db-pwd", "hunter2"));
    let manager = memory_manager(&store, "%s");

    let value = manager.get_secret(&Context::background(), "db-pwd").await.unwrap();
    assert_eq!(value, "hunter2");
    assert_eq!(store.requested_ids(), vec!["svc/dev1/db-pwd".to_string()]);
}

#[tokio::test]
async fn test_custom_key_format() {
    let store = Arc::new(InMemorySecretStore::new().with_secret("svc/dev1/k_x", "v"));
    let manager = memory_manager(&store, "k_%s");

    assert_eq!(manager.get_secret(&Context::background(), "x").await.unwrap(), "v");
}

#[tokio::test]
async fn test_verbatim_skips_prefix() {
    let store = Arc::new(InMemorySecretStore::new().with_secret("shared/api-token", "t0k3n"));
    let manager = memory_manager(&store, "%s");

    let value = manager.get_secret_verbatim(&Context::background(), "shared/api-token").await.unwrap();
    assert_eq!(value, "t0k3n");
}

#[tokio::test]
async fn test_binary_id_is_prefix_plus_id() {
    let store = Arc::new(InMemorySecretStore::new().with_binary("svc/dev1cert", vec![1u8, 2, 3]));
    let manager = memory_manager(&store, "%s");
    let ctx = Context::background();

    assert_eq!(manager.get_binary_secret(&ctx, "cert").await.unwrap(), vec![1, 2, 3]);

    store.insert_binary("svc/dev1/cert", vec![9u8]);
    assert_eq!(manager.get_binary_secret_by_name(&ctx, "cert").await.unwrap(), vec![9]);
}

#[tokio::test]
async fn test_cancelled_context_surfaces_cancellation() {
    let store = Arc::new(InMemorySecretStore::new().with_secret("svc/dev1/db-pwd", "hunter2"));
    let manager = memory_manager(&store, "%s");

    let (ctx, cancel) = Context::background().with_cancel();
    cancel.cancel();

    let err = manager.get_secret(&ctx, "db-pwd").await.unwrap_err();
    assert!(matches!(err, SecretsError::Cancelled(ContextError::Canceled)), "{:?}", err);

    let err: servicekit::Error = err.into();
    assert_eq!(err.kind(), ErrorKind::Unknown);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_bounds_slow_store() {
    let store = Arc::new(
        InMemorySecretStore::new()
            .with_secret("svc/dev1/db-pwd", "hunter2")
            .with_latency(Duration::from_secs(10)),
    );
    let manager = memory_manager(&store, "%s");

    let (ctx, _cancel) = Context::background().with_timeout(Duration::from_secs(1));
    let err = manager.get_secret(&ctx, "db-pwd").await.unwrap_err();
    assert!(matches!(err, SecretsError::Cancelled(ContextError::DeadlineExceeded)), "{:?}", err);
}

#[tokio::test]
async fn test_env_store_end_to_end() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let var = "SERVICEKIT_SECRET_ITEST_DEV1_DB_PWD";
    env::set_var(var, "from-env");

    let naming = SecretNaming::with_defaults("itest", "dev1").unwrap();
    let manager = NamespacedSecretsManager::new(EnvVarSecretStore::new(), naming);
    let ctx = Context::background();

    assert_eq!(manager.get_secret(&ctx, "db-pwd").await.unwrap(), "from-env");
    env::remove_var(var);

    let err = manager.get_secret(&ctx, "db-pwd").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_cached_manager_shares_entries_across_lookup_styles() {
    let store = Arc::new(InMemorySecretStore::new().with_secret("svc/dev1/db-pwd", "hunter2"));
    let naming = SecretNaming::with_defaults("svc", "dev1").unwrap();
    let inner = NamespacedSecretsManager::new(Arc::clone(&store), naming.clone());
    let manager: Arc<dyn SecretsManager> =
        Arc::new(CachedSecretsManager::new(inner, naming, Duration::from_secs(60)).unwrap());
    let ctx = Context::background();

    assert_eq!(manager.get_secret(&ctx, "db-pwd").await.unwrap(), "hunter2");
    assert_eq!(manager.get_secret_verbatim(&ctx, "svc/dev1/db-pwd").await.unwrap(), "hunter2");
    assert_eq!(store.requested_ids().len(), 1);
}

#[tokio::test]
async fn test_manager_is_shareable_across_tasks() {
    let store = Arc::new(InMemorySecretStore::new().with_secret("svc/dev1/db-pwd", "hunter2"));
    let manager: Arc<dyn SecretsManager> = Arc::new(memory_manager(&store, "%s"));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_secret(&Context::background(), "db-pwd").await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), "hunter2");
    }
    assert_eq!(store.requested_ids().len(), 16);
}

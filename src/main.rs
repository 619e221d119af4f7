use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use vendorconnect_api::auth::hash_password;
use vendorconnect_api::config::{self, Environment};
use vendorconnect_api::membership::HttpMembershipClient;
use vendorconnect_api::middleware::MembershipGate;
use vendorconnect_api::models::{AdminRecord, Credential, Scope, Task, User};
use vendorconnect_api::routes::app;
use vendorconnect_api::state::AppState;
use vendorconnect_api::store::memory::MemoryStore;
use vendorconnect_api::store::postgres::PgStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL and friends.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting VendorConnect API in {:?} mode", config.environment);

    let membership_client = Arc::new(HttpMembershipClient::new(
        config.membership.base_url.clone(),
        config.membership.api_key.clone().unwrap_or_default(),
    ));
    let gate = Arc::new(MembershipGate::new(
        config.membership.clone(),
        membership_client,
    ));

    let state = if config.environment == Environment::Demo {
        let store = Arc::new(MemoryStore::new());
        seed_demo_data(&store);
        AppState::from_memory(store, gate, config.server.login_path.clone())
    } else {
        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set outside demo mode");
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database.connection_timeout,
            ))
            .connect(&database_url)
            .await
            .expect("failed to connect to database");
        AppState::from_postgres(PgStore::new(pool), gate, config.server.login_path.clone())
    };

    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("VendorConnect API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

/// Demo deployments run entirely in memory with one seeded owner, a
/// wildcard API key and an open task.
fn seed_demo_data(store: &MemoryStore) {
    let owner = User {
        id: Uuid::new_v4(),
        name: "Demo Owner".to_string(),
        email: "demo@vendorconnect.test".to_string(),
        password_hash: hash_password("demo-password"),
    };
    store.add_admin(AdminRecord {
        id: Uuid::new_v4(),
        user_id: owner.id,
        company_name: "Demo Company".to_string(),
    });
    store.add_credential(Credential {
        id: Uuid::new_v4(),
        key: "demo-api-key".to_string(),
        user_id: owner.id,
        scopes: vec![Scope::Wildcard],
        is_active: true,
        expires_at: None,
        last_used_at: None,
    });
    store.add_task(Task {
        id: Uuid::new_v4(),
        title: "Explore the demo".to_string(),
        status: "open".to_string(),
        completed: false,
        archived: false,
        assignee_ids: vec![owner.id],
    });
    store.add_user(owner);

    tracing::info!("demo data seeded: login demo@vendorconnect.test / demo-password, key demo-api-key");
}

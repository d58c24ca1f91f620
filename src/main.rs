use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use user_registry::{Config, CreateAddress, CreateUser, UserOps, UserStore};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        loglevel = %cfg.loglevel,
        max_connections = cfg.max_connections
    );

    let store = UserStore::connect(&cfg).await?;
    store.init_schema().await?;
    let ops = UserOps::new(store.clone());

    println!("Hello world! {}", chrono::Local::now().to_rfc2822());
    println!("Just running test");

    ops.reset().await?;

    let rizal = CreateUser::new(
        "j.rizal@lasolidaridad.org",
        "calamba1861",
        "Jose",
        "Rizal",
        CreateAddress::new("Rizal Avenue", "Calamba", "Laguna"),
    );

    let first = ops.create_user_outcome(&rizal).await;
    println!("First Create: {}", serde_json::to_string(&first)?);

    // same email again: the unique index rejects it
    let second = ops.create_user_outcome(&rizal).await;
    println!("Second Create: {}", serde_json::to_string(&second)?);

    ops.reset().await?;
    store.close().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    agave_watering::init_tracing();
    if let Err(error) = agave_watering::run().await {
        tracing::error!(%error, "watering planner stopped");
        std::process::exit(1);
    }
}

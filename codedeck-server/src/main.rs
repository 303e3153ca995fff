use codedeck_server::{logging, run_server};

#[tokio::main]
async fn main() {
    logging::init_logger();
    run_server().await
}

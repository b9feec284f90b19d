//! Cairn storage node binary.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    cairn_node_commands::run().await
}

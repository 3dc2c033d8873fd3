#[tokio::main]
async fn main() -> anyhow::Result<()> {
    terminal_command_server_lib::run().await
}

use xssprobe::commands::command_argument_builder;
use xssprobe::handlers::handle_scan;

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();

    match chosen_command.subcommand() {
        Some(("scan", primary_command)) => handle_scan(primary_command).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

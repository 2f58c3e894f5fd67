use clap::Parser;
use colored::Colorize;

use linktrail::cli::{Cli, Commands, ConfigCommands};
use linktrail::config::{get_config, init_config_from};
use linktrail::errors::LinktrailError;
use linktrail::runtime::modes;
use linktrail::system::init_logging;

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<LinktrailError>() {
        Some(e) => eprintln!("{}", e.format_colored()),
        None => eprintln!("{} {:#}", "[ERROR]".red().bold(), err),
    }
}

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(&cli.config);
    let config = get_config();

    // 打印到 stdout 的命令不初始化日志
    let result = match cli.command() {
        Commands::Token { user_id, ttl_hours } => modes::run_token(&config, *user_id, *ttl_hours),
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => modes::run_config_generate(output_path.clone(), *force),
        command => {
            // guard 必须存活到进程结束
            let _guard = match init_logging(&config.logging) {
                Ok(guard) => guard,
                Err(e) => {
                    report(&e);
                    std::process::exit(1);
                }
            };

            match command {
                Commands::Sweep { dry_run } => modes::run_sweep(&config, *dry_run).await,
                _ => modes::run_server(&config).await,
            }
        }
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // No arguments are expected, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Only these are printed. None of them hold secrets.
    const DISPLAY_ENVS: [&str; 16] = [
        "RUST_LOG",
        "TIXPAY_HOST",
        "TIXPAY_PORT",
        "TIXPAY_DATABASE_URL",
        "TIXPAY_RUN_MIGRATIONS",
        "TIXPAY_PLATFORM_FEE_PERCENT",
        "TIXPAY_RPC_URL",
        "TIXPAY_TOKEN_CONTRACT",
        "TIXPAY_TOKEN_DECIMALS",
        "TIXPAY_LOOKBACK_BLOCKS",
        "TIXPAY_MONITOR_INTERVAL_SECS",
        "TIXPAY_MONITOR_DEADLINE_MINS",
        "TIXPAY_RATE_URL",
        "TIXPAY_FIAT_CURRENCY",
        "TIXPAY_FALLBACK_RATE",
        "TIXPAY_RATE_FRESHNESS_SECS",
    ];

    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}

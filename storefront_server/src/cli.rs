use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    // Be explicit about which envars to print. SF_GATEWAY_SECRET_KEY, SF_WEBHOOK_SECRET and SF_OPERATOR_API_KEY
    // are never shown
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "SF_HOST",
        "SF_PORT",
        "SF_DATABASE_URL",
        "SF_CATALOG_FILE",
        "SF_GATEWAY_API_URL",
        "SF_GATEWAY_TIMEOUT_MS",
        "SF_WEBHOOK_SIGNATURE_HEADER",
        "SF_WEBHOOK_TOLERANCE_SECS",
        "SF_CHECKOUT_SUCCESS_URL",
        "SF_CHECKOUT_CANCEL_URL",
        "SF_MAIL_RELAY_URL",
        "SF_OPERATOR_ROUTES",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}

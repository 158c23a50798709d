pub fn config_loaded(path: &str) -> String {
    format!("Loaded configuration from {path}")
}

pub const CONFIG_MISSING: &str = "No configuration file found, using defaults";

pub fn starting(address: &str) -> String {
    format!("Starting stagebot on {address}...")
}

pub const SHUTDOWN: &str = "Shutting down...";

pub fn shutdown_fail(err: &str) -> String {
    format!("Unable to listen for shutdown signal: {err}")
}

pub fn message_sent(address: &str) -> String {
    format!("Message handled by {address}")
}

pub fn keyboard_dropped(page: &str, err: &str) -> String {
    format!("Page '{page}' sends no keyboard: {err}")
}

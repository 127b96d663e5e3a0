use std::env;
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use category_logger::template::replace_tokens;
use category_logger::{
    add_target, category_for, get_logger, init_log_bridge, log_debug, log_error, log_fatal,
    log_info, log_warn, ConsoleTarget, DebugConsoleTarget, LineFormat, LogLevel, SosTarget,
};
use tracing_subscriber::EnvFilter;

struct Demo;

fn main() -> Result<(), Box<dyn Error>> {
    // Internal diagnostics of the façade (connect failures etc.), not its output.
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .init();

    let level = match env::var("CATEGORY_LOG_LEVEL") {
        Ok(value) => value.parse::<LogLevel>()?,
        Err(_) => LogLevel::All,
    };

    add_target(Arc::new(ConsoleTarget::console().with_level(level)));
    add_target(Arc::new(
        DebugConsoleTarget::debug_console().with_format(LineFormat::default().time(true)),
    ));

    if let Ok(addr) = env::var("CATEGORY_LOG_SOS") {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or("CATEGORY_LOG_SOS must be host:port")?;
        add_target(Arc::new(SosTarget::with_endpoint(host, port.parse::<u16>()?)));
    }

    init_log_bridge()?;

    let log = get_logger(&category_for::<Demo>());
    let a = 25;
    let b = "Test, 1, 2, 3";
    let c = true;

    log_info!(log, "This is a Logging Test");
    log_debug!(log, "You can log like this: {}", b);
    log_warn!(log, "Arguments are formatted lazily: {}", b);
    log_error!(
        log,
        "Multiple parameters of any Display type: {} - {},\nand multiline is supported: {}",
        c,
        b,
        a
    );

    let person = std::collections::HashMap::from([
        ("Name".to_string(), "Matt Bolt".to_string()),
        ("Age".to_string(), "27".to_string()),
    ]);
    log_info!(
        log,
        "{}",
        replace_tokens("Hello, my name is ${Name} and I am ${Age} years old.", &person)?
    );

    log::info!("records from the log crate land in the category of their module");
    log_fatal!(log, "The End...");

    // Give a background SOS connect a moment to flush.
    if env::var_os("CATEGORY_LOG_SOS").is_some() {
        thread::sleep(Duration::from_millis(500));
    }

    Ok(())
}

use colored::{ColoredString, Colorize};
use log::Level;

/// External crates only need to log warnings and errors
const EXTERNAL_LEVELS: [Level; 2] = [Level::Warn, Level::Error];
const LOCAL_LEVELS: [Level; 3] = [Level::Info, Level::Warn, Level::Error];

pub fn init_logger() {
    fern::Dispatch::new()
        .format(|out, message, record| {
            let now = chrono::Local::now();

            out.finish(format_args!(
                "{} {} {:^8} {}",
                level_badge(record.level()),
                now.format("%H:%M:%S").to_string().bright_black(),
                target_badge(record.target()),
                message
            ))
        })
        .filter(|meta| {
            if is_local(meta.target()) {
                LOCAL_LEVELS.contains(&meta.level())
            } else {
                EXTERNAL_LEVELS.contains(&meta.level())
            }
        })
        .chain(std::io::stdout())
        .apply()
        .expect("logging is initialized")
}

fn crate_of(target: &str) -> &str {
    target.split("::").next().unwrap_or(target)
}

fn is_local(target: &str) -> bool {
    matches!(crate_of(target), "codedeck_server" | "codedeck_collab")
}

fn target_badge(target: &str) -> ColoredString {
    match crate_of(target) {
        "codedeck_server" => "SERVER".bright_green(),
        "codedeck_collab" => "COLLAB".bright_purple(),
        other => other.clear(),
    }
}

fn level_badge(level: Level) -> String {
    match level {
        Level::Error => " ERR ".black().on_red().bold().to_string(),
        Level::Warn => " WRN ".black().on_yellow().bold().to_string(),
        Level::Info => " INF ".black().on_blue().bold().to_string(),
        Level::Debug => " DBG ".white().on_black().to_string(),
        Level::Trace => " TRC ".to_string(),
    }
}

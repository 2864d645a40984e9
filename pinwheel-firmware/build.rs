//! Build script for pinwheel-firmware
//!
//! - Sets up linker search paths for memory.x and device.x
//! - Validates board.toml at compile time
//! - Emits the validated board settings as constants in `$OUT_DIR/board.rs`

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    let config = validate_config();
    generate_board(&config);
}

/// Set up linker search paths for memory.x and device.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy the linker fragments to the output directory
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(include_bytes!("memory.x")).unwrap();
    let mut f = File::create(out_dir.join("device.x")).unwrap();
    f.write_all(include_bytes!("device.x")).unwrap();

    // Tell rustc where to find them
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=device.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate board.toml configuration at compile time
fn validate_config() -> toml::Value {
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml configuration file.          ║\n\
            ║  Please create one in the pinwheel-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_led(&config, &mut errors);
    validate_button(&config, &mut errors);
    validate_blink(&config, &mut errors);
    validate_fatal(&config, &mut errors);
    report("Invalid board configuration", &errors);

    println!("cargo:warning=board.toml validated successfully");
    config
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Abort the build listing every problem found
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Same grammar as `parse_pin_string`: optional '!', 'P', port A/B/C/H,
/// pin 0-15 in plain decimal; letters in either case
fn is_valid_pin(s: &str) -> bool {
    let s = s.trim();
    let s = s.strip_prefix('!').unwrap_or(s);
    let Some(rest) = s.strip_prefix(['P', 'p']) else {
        return false;
    };
    let mut chars = rest.chars();
    let port_ok = matches!(
        chars.next().map(|c| c.to_ascii_uppercase()),
        Some('A' | 'B' | 'C' | 'H')
    );
    let digits = chars.as_str();
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !(digits.len() > 1 && digits.starts_with('0'));
    let index_ok = canonical
        && digits
            .parse::<u8>()
            .map(|index| index < 16)
            .unwrap_or(false);
    port_ok && index_ok
}

fn section<'a>(
    config: &'a toml::Value,
    name: &str,
    errors: &mut Vec<String>,
) -> Option<&'a toml::value::Table> {
    match config.get(name) {
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
        None => {
            errors.push(format!("Missing [{}] section", name));
            None
        }
    }
}

fn check_pin(table: &toml::value::Table, section: &str, errors: &mut Vec<String>) {
    match table.get("pin") {
        Some(toml::Value::String(pin)) if is_valid_pin(pin) => {}
        Some(toml::Value::String(pin)) => {
            errors.push(format!("[{}] pin '{}' is not P<A|B|C|H><0-15>", section, pin));
        }
        Some(_) => errors.push(format!("[{}] pin must be a string", section)),
        None => errors.push(format!("[{}] missing 'pin'", section)),
    }
}

fn validate_led(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(led) = section(config, "led", errors) {
        check_pin(led, "led", errors);
    }
}

fn validate_button(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(button) = section(config, "button", errors) else {
        return;
    };
    check_pin(button, "button", errors);

    match button.get("edge") {
        Some(toml::Value::String(edge)) => {
            if !["rising", "falling"].contains(&edge.as_str()) {
                errors.push("[button] edge must be 'rising' or 'falling'".to_string());
            }
        }
        _ => errors.push("[button] missing 'edge'".to_string()),
    }

    match button.get("priority") {
        Some(toml::Value::Integer(priority)) => {
            if !(0..=15).contains(priority) {
                errors.push("[button] priority must be 0-15".to_string());
            }
        }
        _ => errors.push("[button] missing 'priority'".to_string()),
    }

    if let Some(pull) = button.get("pull") {
        match pull.as_str() {
            Some("none" | "up" | "down") => {}
            _ => errors.push("[button] pull must be 'none', 'up' or 'down'".to_string()),
        }
    }
}

fn validate_blink(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(blink) = section(config, "blink", errors) else {
        return;
    };

    match blink.get("delays_ms") {
        Some(toml::Value::Array(delays)) => {
            if delays.is_empty() || delays.len() > 8 {
                errors.push("[blink] delays_ms must hold 1-8 entries".to_string());
            }
            for (i, delay) in delays.iter().enumerate() {
                match delay.as_integer() {
                    Some(ms) if (1..=60_000).contains(&ms) => {}
                    _ => errors.push(format!("[blink] delays_ms[{}] must be 1-60000", i)),
                }
            }
        }
        _ => errors.push("[blink] missing 'delays_ms'".to_string()),
    }
}

fn validate_fatal(config: &toml::Value, errors: &mut Vec<String>) {
    // [fatal] is optional; missing fields keep the defaults
    let Some(toml::Value::Table(fatal)) = config.get("fatal") else {
        return;
    };

    for key in ["on_ms", "off_ms", "gap_ms", "pause_ms"] {
        if let Some(value) = fatal.get(key) {
            match value.as_integer() {
                Some(ms) if (1..=60_000).contains(&ms) => {}
                _ => errors.push(format!("[fatal] {} must be 1-60000", key)),
            }
        }
    }
}

/// Write the validated settings as Rust constants
fn generate_board(config: &toml::Value) {
    let led = &config["led"];
    let button = &config["button"];

    let edge = match button["edge"].as_str() {
        Some("rising") => 1,
        _ => 0,
    };
    let pull = match button.get("pull").and_then(|p| p.as_str()) {
        Some("up") => "Pull::Up",
        Some("down") => "Pull::Down",
        _ => "Pull::None",
    };
    let delays: Vec<String> = config["blink"]["delays_ms"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_integer().unwrap().to_string())
        .collect();

    let fatal_ms = |key: &str, default: i64| {
        config
            .get("fatal")
            .and_then(|f| f.get(key))
            .and_then(|v| v.as_integer())
            .unwrap_or(default)
    };

    let source = format!(
        "// Generated from board.toml by build.rs\n\
         pub const LED_PIN: &str = {led:?};\n\
         pub const BUTTON_PIN: &str = {button:?};\n\
         /// 1 = rising, 0 = falling\n\
         pub const BUTTON_EDGE: u8 = {edge};\n\
         pub const BUTTON_PRIORITY: u8 = {priority};\n\
         pub const BUTTON_PULL: Pull = {pull};\n\
         pub const BLINK_DELAYS_MS: [u32; {count}] = [{delays}];\n\
         pub const FATAL_TIMING: BlinkTiming = BlinkTiming {{ on_ms: {on}, off_ms: {off}, gap_ms: {gap}, pause_ms: {pause} }};\n",
        led = led["pin"].as_str().unwrap(),
        button = button["pin"].as_str().unwrap(),
        priority = button["priority"].as_integer().unwrap(),
        count = delays.len(),
        delays = delays.join(", "),
        on = fatal_ms("on_ms", 200),
        off = fatal_ms("off_ms", 200),
        gap = fatal_ms("gap_ms", 1000),
        pause = fatal_ms("pause_ms", 3000),
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("board.rs"), source).unwrap();
}

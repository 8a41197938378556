use std::path::{Path, PathBuf};

/// Configuration loaded from the rc file (`~/.funil/rc`).
///
/// Every recognized key has a named, typed field here; the rc format is one
/// `key=value` pair per line, `#` comments allowed. Unknown keys and
/// unparseable values are warned about and ignored rather than failing the
/// command.
///
/// Recognized keys:
/// - `data.location` - database file path (relative paths resolve against
///   the rc file's directory)
/// - `color` - `on` or `off`, overriding terminal detection
/// - `board.width` - fixed board width in columns instead of the detected
///   terminal width
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub data_location: Option<PathBuf>,
    pub color: Option<bool>,
    pub board_width: Option<usize>,
}

impl Config {
    /// Load configuration from `path`. A missing file yields the default
    /// config.
    pub fn load(path: &Path) -> Config {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut config = Self::parse(&content);
                // Resolve a relative data.location against the rc directory
                if let Some(location) = config.data_location.take() {
                    config.data_location = Some(if location.is_relative() {
                        path.parent()
                            .map(|dir| dir.join(&location))
                            .unwrap_or(location)
                    } else {
                        location
                    });
                }
                config
            }
            Err(_) => Config::default(),
        }
    }

    fn parse(content: &str) -> Config {
        let mut config = Config::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("ignoring malformed config line: {}", line);
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "data.location" => {
                    config.data_location = Some(PathBuf::from(value));
                }
                "color" => match value {
                    "on" | "true" => config.color = Some(true),
                    "off" | "false" => config.color = Some(false),
                    _ => log::warn!("ignoring invalid color value: {}", value),
                },
                "board.width" => match value.parse::<usize>() {
                    Ok(width) if width >= 40 => config.board_width = Some(width),
                    _ => log::warn!("ignoring invalid board.width value: {}", value),
                },
                _ => log::warn!("ignoring unrecognized config key: {}", key),
            }
        }
        config
    }
}

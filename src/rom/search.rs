//! ROM directory search order.
//!
//! Builds the ordered list of directories to look for ROMs in. Nothing here
//! touches the filesystem; the environment is captured up front in a
//! [`SearchEnv`] so the planner is a pure function of its inputs.

use std::path::PathBuf;

/// Directory used when no ROM directory is configured.
pub const DEFAULT_ROM_DIR: &str = "mt32-roms";

/// Name of this application's folder inside the platform config directory.
const APP_CONFIG_DIR: &str = "mt32bridge";

/// Platform families with distinct standard ROM locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    /// Linux and other XDG-style systems.
    Xdg,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Xdg
        }
    }

    fn separator(self) -> char {
        match self {
            Self::Windows => '\\',
            _ => '/',
        }
    }
}

/// The parts of the process environment that affect the search order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchEnv {
    /// The user's home directory, used to expand `~`.
    pub home: Option<String>,
    /// This application's configuration directory.
    pub config_dir: Option<String>,
    pub xdg_data_home: Option<String>,
    pub xdg_data_dirs: Option<String>,
}

impl SearchEnv {
    /// Captures the environment of the running process.
    pub fn from_process() -> Self {
        let path_string = |p: PathBuf| p.to_string_lossy().into_owned();
        Self {
            home: dirs::home_dir().map(path_string),
            config_dir: dirs::config_dir().map(|p| path_string(p.join(APP_CONFIG_DIR))),
            xdg_data_home: std::env::var("XDG_DATA_HOME").ok(),
            xdg_data_dirs: std::env::var("XDG_DATA_DIRS").ok(),
        }
    }

    /// Replaces a leading `~` with the home directory.
    pub fn resolve_home(&self, path: &str) -> String {
        match (path.strip_prefix('~'), &self.home) {
            (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
                format!("{}{}", home.trim_end_matches(['/', '\\']), rest)
            }
            _ => path.to_string(),
        }
    }
}

/// Appends the platform separator unless `dir` already ends in one.
fn with_trailing_separator(platform: Platform, dir: &str) -> String {
    if dir.ends_with(['/', '\\']) {
        dir.to_string()
    } else {
        format!("{}{}", dir, platform.separator())
    }
}

/// Standard ROM locations for `platform`, most preferred first.
pub fn platform_rom_dirs(platform: Platform, env: &SearchEnv) -> Vec<String> {
    let sep = platform.separator();
    let config = env
        .config_dir
        .as_deref()
        .map(|dir| format!("{}mt32-roms{}", with_trailing_separator(platform, dir), sep));

    let mut dirs = Vec::new();
    match platform {
        Platform::Windows => {
            dirs.push("..\\mt32-roms\\".to_string());
            dirs.extend(config);
            dirs.push("C:\\mt32-rom-data\\".to_string());
        }
        Platform::MacOs => {
            dirs.push("../mt32-roms/".to_string());
            dirs.extend(config);
            dirs.push(env.resolve_home("~/Library/Audio/Sounds/MT32-Roms/"));
            dirs.push("/usr/local/share/mt32-rom-data/".to_string());
            dirs.push("/usr/share/mt32-rom-data/".to_string());
        }
        Platform::Xdg => {
            let data_home = env.resolve_home(
                env.xdg_data_home
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or("~/.local/share"),
            );
            let data_home = data_home.trim_end_matches('/');
            dirs.push("../mt32-roms/".to_string());
            dirs.push(format!("{}/dosbox/mt32-roms/", data_home));
            dirs.push(format!("{}/mt32-rom-data/", data_home));

            let data_dirs = env
                .xdg_data_dirs
                .as_deref()
                .unwrap_or("/usr/local/share:/usr/share");
            for data_dir in data_dirs.split(':').map(str::trim) {
                if data_dir.is_empty() {
                    continue;
                }
                let resolved = env.resolve_home(data_dir);
                dirs.push(format!("{}/mt32-rom-data/", resolved.trim_end_matches('/')));
            }

            dirs.extend(config);
        }
    }
    dirs
}

/// The full search order: the user's directory, then the standard ones.
///
/// # Arguments
///
/// * `romdir` - The configured ROM directory; empty selects [`DEFAULT_ROM_DIR`]
pub fn search_order(platform: Platform, env: &SearchEnv, romdir: &str) -> Vec<String> {
    let romdir = match romdir.trim() {
        "" => DEFAULT_ROM_DIR,
        dir => dir,
    };
    let user_dir = env.resolve_home(&with_trailing_separator(platform, romdir));

    let mut dirs = vec![user_dir];
    dirs.extend(platform_rom_dirs(platform, env));
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> SearchEnv {
        SearchEnv {
            home: Some("/home/ada".to_string()),
            config_dir: Some("/home/ada/.config/mt32bridge".to_string()),
            xdg_data_home: None,
            xdg_data_dirs: None,
        }
    }

    #[test]
    fn test_xdg_defaults() {
        let dirs = search_order(Platform::Xdg, &env(), "");
        assert_eq!(
            dirs,
            vec![
                "mt32-roms/",
                "../mt32-roms/",
                "/home/ada/.local/share/dosbox/mt32-roms/",
                "/home/ada/.local/share/mt32-rom-data/",
                "/usr/local/share/mt32-rom-data/",
                "/usr/share/mt32-rom-data/",
                "/home/ada/.config/mt32bridge/mt32-roms/",
            ]
        );
    }

    #[test]
    fn test_xdg_environment_overrides() {
        let env = SearchEnv {
            xdg_data_home: Some("/data/home/".to_string()),
            xdg_data_dirs: Some(" /opt/share : :~/extra".to_string()),
            ..env()
        };
        let dirs = platform_rom_dirs(Platform::Xdg, &env);
        assert_eq!(
            dirs,
            vec![
                "../mt32-roms/",
                "/data/home/dosbox/mt32-roms/",
                "/data/home/mt32-rom-data/",
                "/opt/share/mt32-rom-data/",
                "/home/ada/extra/mt32-rom-data/",
                "/home/ada/.config/mt32bridge/mt32-roms/",
            ]
        );
    }

    #[test]
    fn test_user_dir_is_always_first() {
        for platform in [Platform::Windows, Platform::MacOs, Platform::Xdg] {
            let dirs = search_order(platform, &env(), "~/roms/");
            assert_eq!(dirs[0], "/home/ada/roms/");
            assert!(dirs.iter().all(|d| d.ends_with(['/', '\\'])));
        }
    }

    #[test]
    fn test_windows_order() {
        let env = SearchEnv {
            config_dir: Some("C:\\Users\\ada\\AppData\\Roaming\\mt32bridge".to_string()),
            ..SearchEnv::default()
        };
        let dirs = search_order(Platform::Windows, &env, "D:\\roms");
        assert_eq!(
            dirs,
            vec![
                "D:\\roms\\",
                "..\\mt32-roms\\",
                "C:\\Users\\ada\\AppData\\Roaming\\mt32bridge\\mt32-roms\\",
                "C:\\mt32-rom-data\\",
            ]
        );
    }

    #[test]
    fn test_macos_order() {
        let dirs = platform_rom_dirs(Platform::MacOs, &env());
        assert_eq!(dirs[0], "../mt32-roms/");
        assert_eq!(dirs[2], "/home/ada/Library/Audio/Sounds/MT32-Roms/");
        assert_eq!(dirs.last().unwrap(), "/usr/share/mt32-rom-data/");
    }

    #[test]
    fn test_home_resolution_only_expands_leading_tilde() {
        let env = env();
        assert_eq!(env.resolve_home("~"), "/home/ada");
        assert_eq!(env.resolve_home("~/x/"), "/home/ada/x/");
        assert_eq!(env.resolve_home("~other/x"), "~other/x");
        assert_eq!(env.resolve_home("/abs/~"), "/abs/~");
        assert_eq!(SearchEnv::default().resolve_home("~/x"), "~/x");
    }
}
